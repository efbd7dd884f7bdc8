use std::sync::{Arc, Mutex};

use chrono::Utc;
use msgs::board::Board;
use msgs::client_msg::ClientMsg;
use msgs::color::TileColor;
use msgs::tile::Tile;
use tokio::sync::{broadcast, mpsc};

/// Capacity of the change-notification channel. A front-end that stops
/// polling its receiver misses updates (`RecvError::Lagged`) instead of
/// stalling the connection.
const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// The client-side view of the canvas. The connection process mutates the
/// shared board in place and publishes every changed tile after applying
/// it, so subscribers observe changes in server order, snapshot first.
#[derive(Clone)]
pub struct CanvasHandle {
    username: String,
    board: Arc<Mutex<Board>>,
    changes: broadcast::Sender<Tile>,
    to_server: mpsc::Sender<Vec<u8>>,
}

impl CanvasHandle {
    pub(crate) fn new(
        username: String,
        board: Board,
        to_server: mpsc::Sender<Vec<u8>>,
    ) -> CanvasHandle {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        CanvasHandle {
            username,
            board: Arc::new(Mutex::new(board)),
            changes,
            to_server,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn dim(&self) -> u32 {
        self.board.lock().unwrap().dim()
    }

    /// The current value of one cell.
    pub fn tile(&self, row: u32, col: u32) -> Tile {
        self.board.lock().unwrap().tile(row, col).clone()
    }

    /// A copy of the whole board, e.g. for a full redraw.
    pub fn board(&self) -> Board {
        self.board.lock().unwrap().clone()
    }

    /// True iff `row`, `col` and `code` would make a valid edit.
    pub fn is_valid(&self, row: u32, col: u32, code: char) -> bool {
        self.board.lock().unwrap().in_bounds(row, col) && TileColor::from_code(code).is_some()
    }

    /// Sends one edit, fire and forget. Edits that fail client-side
    /// validation are dropped without contacting the server.
    pub fn change_tile(&self, row: u32, col: u32, code: char) {
        let Some(color) = TileColor::from_code(code) else {
            tracing::warn!(%code, "unrecognized color code, edit dropped");
            return;
        };
        if !self.board.lock().unwrap().in_bounds(row, col) {
            tracing::warn!(row, col, "edit outside the board dropped");
            return;
        }

        let tile = Tile {
            row,
            col,
            owner: self.username.clone(),
            color,
            timestamp: Utc::now().timestamp_millis(),
        };
        let mut frame = Vec::new();
        ClientMsg::ChangeTile(tile).pack(&mut frame);
        // Fire and forget: a closed or full connection surfaces as the
        // notifications drying up, not as an error here.
        let _ = self.to_server.try_send(frame);
    }

    /// Change notifications in server order. The receiver gets every tile
    /// applied after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Tile> {
        self.changes.subscribe()
    }

    /// Called by the connection process for each incoming change.
    pub(crate) fn apply(&self, tile: Tile) {
        self.board.lock().unwrap().set_tile(tile.clone());
        let _ = self.changes.send(tile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(dim: u32) -> (CanvasHandle, mpsc::Receiver<Vec<u8>>) {
        let (to_server, from_model) = mpsc::channel(8);
        let handle = CanvasHandle::new("alice".to_owned(), Board::new(dim), to_server);
        (handle, from_model)
    }

    #[test]
    fn validation_matches_board_and_palette() {
        let (handle, _from_model) = handle(3);
        assert!(handle.is_valid(2, 2, '5'));
        assert!(handle.is_valid(0, 0, 'f'));
        assert!(!handle.is_valid(3, 0, '5'));
        assert!(!handle.is_valid(0, 0, 'z'));
    }

    #[test]
    fn invalid_edits_never_reach_the_wire() {
        let (handle, mut from_model) = handle(3);
        handle.change_tile(5, 0, '5');
        handle.change_tile(0, 0, 'x');
        assert!(from_model.try_recv().is_err());

        handle.change_tile(0, 1, '5');
        let frame = from_model.try_recv().unwrap();
        let (_, msg) = ClientMsg::dequeue_and_decode(&frame).unwrap();
        match msg.unwrap() {
            ClientMsg::ChangeTile(tile) => {
                assert_eq!((tile.row, tile.col), (0, 1));
                assert_eq!(tile.color, TileColor::Red);
                assert_eq!(tile.owner, "alice");
            }
            other => panic!("unexpected msg: {other:?}"),
        }
    }

    #[test]
    fn applied_tiles_mutate_the_board_and_notify() {
        let (handle, _from_model) = handle(3);
        let mut changes = handle.subscribe();

        let tile = Tile {
            row: 1,
            col: 1,
            owner: "bob".to_owned(),
            color: TileColor::Teal,
            timestamp: 3,
        };
        handle.apply(tile.clone());

        assert_eq!(handle.tile(1, 1), tile);
        assert_eq!(changes.try_recv().unwrap(), tile);
    }
}
