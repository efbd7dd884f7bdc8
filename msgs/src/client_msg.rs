use std::io::{Cursor, Write};

use anyhow::{bail, Context};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::dequeue::dequeue_msg;
use crate::tile::Tile;

/// Requests a client may send. The first message on a connection must be
/// `Login`; after that only `ChangeTile` is valid.
#[derive(Debug, Clone)]
pub enum ClientMsg {
    Login(String),
    ChangeTile(Tile),
}

impl ClientMsg {
    pub fn dequeue_and_decode(input_buffer: &[u8]) -> Option<(usize, anyhow::Result<ClientMsg>)> {
        let (begin, end) = dequeue_msg(input_buffer)?;
        let msg = Self::decode(&input_buffer[begin..end]);
        Some((end, msg))
    }

    pub fn decode(input_buffer: &[u8]) -> anyhow::Result<ClientMsg> {
        let mut rdr = Cursor::new(input_buffer);
        let msg_type_index = rdr.read_u32::<LittleEndian>()?;

        let begin = 4;

        let msg = match msg_type_index {
            0 => {
                let username = String::from_utf8(input_buffer[begin..].to_vec())
                    .context("username is not valid utf-8")?;
                ClientMsg::Login(username)
            }
            1 => {
                let mut rest = &input_buffer[begin..];
                let tile = Tile::read_from(&mut rest)?;
                ClientMsg::ChangeTile(tile)
            }
            type_index => {
                bail!("unsupported msg type: {type_index}");
            }
        };

        Ok(msg)
    }

    pub fn pack(&self, wtr: &mut impl Write) {
        match self {
            ClientMsg::Login(username) => {
                wtr.write_u32::<LittleEndian>(4 + username.len() as u32).unwrap();
                wtr.write_u32::<LittleEndian>(0).unwrap();
                wtr.write_all(username.as_bytes()).unwrap();
            }
            ClientMsg::ChangeTile(tile) => {
                wtr.write_u32::<LittleEndian>(4 + tile.encoded_len()).unwrap();
                wtr.write_u32::<LittleEndian>(1).unwrap();
                tile.write_to(wtr);
            }
        }
    }
}
