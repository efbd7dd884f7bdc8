use std::io::{Cursor, Write};

use anyhow::{bail, Context};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::board::Board;
use crate::dequeue::dequeue_msg;
use crate::tile::Tile;

/// Responses and notifications the server sends. A successful login is
/// answered with `LoginSuccess` followed by `Board`; every accepted edit is
/// fanned out to all sessions as `TileChanged`.
#[derive(Debug, Clone)]
pub enum ServerMsg {
    LoginSuccess(String),
    Error(String),
    Board(Board),
    TileChanged(Tile),
}

impl ServerMsg {
    pub fn dequeue_and_decode(input_buffer: &[u8]) -> Option<(usize, anyhow::Result<ServerMsg>)> {
        let (begin, end) = dequeue_msg(input_buffer)?;
        let msg = Self::decode(&input_buffer[begin..end]);
        Some((end, msg))
    }

    pub fn decode(input_buffer: &[u8]) -> anyhow::Result<ServerMsg> {
        let mut rdr = Cursor::new(input_buffer);
        let msg_type_index = rdr.read_u32::<LittleEndian>()?;

        let begin = 4;

        let msg = match msg_type_index {
            0 => {
                let text = String::from_utf8(input_buffer[begin..].to_vec())
                    .context("text is not valid utf-8")?;
                ServerMsg::LoginSuccess(text)
            }
            1 => {
                let text = String::from_utf8(input_buffer[begin..].to_vec())
                    .context("text is not valid utf-8")?;
                ServerMsg::Error(text)
            }
            2 => {
                let mut rest = &input_buffer[begin..];
                let board = Board::read_from(&mut rest)?;
                ServerMsg::Board(board)
            }
            3 => {
                let mut rest = &input_buffer[begin..];
                let tile = Tile::read_from(&mut rest)?;
                ServerMsg::TileChanged(tile)
            }
            type_index => {
                bail!("unsupported msg type: {type_index}");
            }
        };

        Ok(msg)
    }

    pub fn pack(&self, wtr: &mut impl Write) {
        match self {
            ServerMsg::LoginSuccess(text) => {
                wtr.write_u32::<LittleEndian>(4 + text.len() as u32).unwrap();
                wtr.write_u32::<LittleEndian>(0).unwrap();
                wtr.write_all(text.as_bytes()).unwrap();
            }
            ServerMsg::Error(text) => {
                wtr.write_u32::<LittleEndian>(4 + text.len() as u32).unwrap();
                wtr.write_u32::<LittleEndian>(1).unwrap();
                wtr.write_all(text.as_bytes()).unwrap();
            }
            ServerMsg::Board(board) => {
                wtr.write_u32::<LittleEndian>(4 + board.encoded_len()).unwrap();
                wtr.write_u32::<LittleEndian>(2).unwrap();
                board.write_to(wtr);
            }
            ServerMsg::TileChanged(tile) => {
                wtr.write_u32::<LittleEndian>(4 + tile.encoded_len()).unwrap();
                wtr.write_u32::<LittleEndian>(3).unwrap();
                tile.write_to(wtr);
            }
        }
    }
}
