use std::fmt;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::color::TileColor;
use crate::tile::Tile;

/// The shared canvas: a square grid of tiles, row-major. Every coordinate
/// holds exactly one tile at all times; `set_tile` replaces, never removes.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    dim: u32,
    cells: Vec<Tile>,
}

impl Board {
    /// A fresh board has every cell set to the default tile: color index 0,
    /// no owner, epoch timestamp.
    pub fn new(dim: u32) -> Board {
        let cells = (0..dim as u64 * dim as u64)
            .map(|i| Tile {
                row: (i / dim as u64) as u32,
                col: (i % dim as u64) as u32,
                owner: String::new(),
                color: TileColor::Black,
                timestamp: 0,
            })
            .collect();
        Board { dim, cells }
    }

    pub fn dim(&self) -> u32 {
        self.dim
    }

    pub fn in_bounds(&self, row: u32, col: u32) -> bool {
        row < self.dim && col < self.dim
    }

    /// Panics when out of range; callers validate with `in_bounds` first.
    pub fn tile(&self, row: u32, col: u32) -> &Tile {
        assert!(self.in_bounds(row, col));
        &self.cells[(row as u64 * self.dim as u64 + col as u64) as usize]
    }

    /// Replaces the occupant of the tile's cell. Last write wins, no merge.
    /// Panics when out of range; callers validate with `in_bounds` first.
    pub fn set_tile(&mut self, tile: Tile) {
        assert!(self.in_bounds(tile.row, tile.col));
        let index = (tile.row as u64 * self.dim as u64 + tile.col as u64) as usize;
        self.cells[index] = tile;
    }

    pub fn encoded_len(&self) -> u32 {
        4 + self.cells.iter().map(Tile::encoded_len).sum::<u32>()
    }

    pub fn read_from(rdr: &mut impl Read) -> anyhow::Result<Board> {
        let dim = rdr.read_u32::<LittleEndian>()?;
        let count = dim as u64 * dim as u64;
        let mut cells = Vec::with_capacity(count as usize);
        for _ in 0..count {
            cells.push(Tile::read_from(rdr)?);
        }
        Ok(Board { dim, cells })
    }

    pub fn write_to(&self, wtr: &mut impl Write) {
        wtr.write_u32::<LittleEndian>(self.dim).unwrap();
        for tile in &self.cells {
            tile.write_to(wtr);
        }
    }
}

/// Renders the grid as hex color codes, one row per line.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.dim {
            for col in 0..self.dim {
                write!(f, "{}", self.tile(row, col).color.code())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
