use std::io::{Read, Write};

use anyhow::Context;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::color::TileColor;

/// One cell's current value. Tiles are immutable once constructed; an edit
/// always replaces the cell's whole tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub row: u32,
    pub col: u32,
    pub owner: String,
    pub color: TileColor,
    /// Unix milliseconds, set by the originating client.
    pub timestamp: i64,
}

impl Tile {
    /// Fixed-size part of the encoding, before the owner bytes.
    const HEAD_SIZE: u32 = 24;

    pub fn encoded_len(&self) -> u32 {
        Self::HEAD_SIZE + self.owner.len() as u32
    }

    pub fn read_from(rdr: &mut impl Read) -> anyhow::Result<Tile> {
        let row = rdr.read_u32::<LittleEndian>()?;
        let col = rdr.read_u32::<LittleEndian>()?;
        let color_index = rdr.read_u32::<LittleEndian>()?;
        let color = TileColor::from_index(color_index)
            .with_context(|| format!("unsupported color index: {color_index}"))?;
        let timestamp = rdr.read_i64::<LittleEndian>()?;
        let owner_len = rdr.read_u32::<LittleEndian>()? as usize;
        let mut buf = vec![0u8; owner_len];
        rdr.read_exact(&mut buf)?;
        let owner = String::from_utf8(buf).context("owner is not valid utf-8")?;
        Ok(Tile {
            row,
            col,
            owner,
            color,
            timestamp,
        })
    }

    pub fn write_to(&self, wtr: &mut impl Write) {
        wtr.write_u32::<LittleEndian>(self.row).unwrap();
        wtr.write_u32::<LittleEndian>(self.col).unwrap();
        wtr.write_u32::<LittleEndian>(self.color.index()).unwrap();
        wtr.write_i64::<LittleEndian>(self.timestamp).unwrap();
        wtr.write_u32::<LittleEndian>(self.owner.len() as u32).unwrap();
        wtr.write_all(self.owner.as_bytes()).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_survives_the_wire() {
        let tile = Tile {
            row: 1,
            col: 2,
            owner: "alice".to_owned(),
            color: TileColor::Red,
            timestamp: 1_700_000_000_000,
        };

        let mut buf = Vec::new();
        tile.write_to(&mut buf);
        assert_eq!(buf.len() as u32, tile.encoded_len());

        let mut rdr = &buf[..];
        assert_eq!(Tile::read_from(&mut rdr).unwrap(), tile);
        assert!(rdr.is_empty());
    }

    #[test]
    fn truncated_tile_is_an_error() {
        let tile = Tile {
            row: 0,
            col: 0,
            owner: "bob".to_owned(),
            color: TileColor::Black,
            timestamp: 0,
        };
        let mut buf = Vec::new();
        tile.write_to(&mut buf);

        let mut rdr = &buf[..buf.len() - 1];
        assert!(Tile::read_from(&mut rdr).is_err());
    }

    #[test]
    fn unknown_color_index_is_an_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&0i64.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());

        let mut rdr = &buf[..];
        assert!(Tile::read_from(&mut rdr).is_err());
    }
}
