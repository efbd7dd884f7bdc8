use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use msgs::board::Board;
use msgs::color::TileColor;
use msgs::server_msg::ServerMsg;
use msgs::tile::Tile;
use tokio::sync::mpsc;
use tracing::Level;

use crate::stats::Statistics;

/// How many undelivered frames a session may accumulate before the engine
/// gives up on it and evicts it instead of blocking other mutations.
pub const DELIVERY_QUEUE_CAPACITY: usize = 256;

/// Sender half of one session's delivery queue. Broadcast frames are packed
/// once and fanned out as bytes; the session task only writes them out.
pub type DeliveryTx = mpsc::Sender<Vec<u8>>;

/// The engine shared by all sessions. The mutex is the single exclusion
/// domain of the server: the canvas write, the counter updates and the
/// fan-out all happen under one acquisition, which is what gives every
/// session the same delivery order.
pub type SharedEngine = Arc<Mutex<Engine>>;

#[derive(Debug)]
pub struct LoginRefused;

/// Owns the canonical board, the registry of live sessions and the usage
/// counters. Everything mutates through `&mut self`, so the surrounding
/// mutex is the only synchronization in play.
pub struct Engine {
    board: Board,
    sessions: HashMap<String, DeliveryTx>,
    color_counts: HashMap<TileColor, u64>,
    edit_counts: HashMap<String, u64>,
    total_edits: u64,
}

impl Engine {
    pub fn new(dim: u32) -> Engine {
        let mut color_counts = HashMap::new();
        for color in TileColor::ALL {
            color_counts.insert(color, 0);
        }
        Engine {
            board: Board::new(dim),
            sessions: HashMap::new(),
            color_counts,
            edit_counts: HashMap::new(),
            total_edits: 0,
        }
    }

    pub fn shared(dim: u32) -> SharedEngine {
        Arc::new(Mutex::new(Engine::new(dim)))
    }

    /// Registers a session under `username`, rejecting the name iff a live
    /// session already holds it (exact match). The returned snapshot is
    /// taken under the same lock that registers the queue, so the snapshot
    /// plus the frames subsequently queued on `tx` reconstruct the server
    /// sequence exactly.
    pub fn login(&mut self, username: &str, tx: DeliveryTx) -> Result<Board, LoginRefused> {
        if self.sessions.contains_key(username) {
            return Err(LoginRefused);
        }
        self.sessions.insert(username.to_owned(), tx);
        self.edit_counts.insert(username.to_owned(), 0);
        tracing::info!(username, "logged in");
        Ok(self.board.clone())
    }

    /// Applies one edit and queues `TileChanged` to every live session,
    /// the originator included. Out-of-range coordinates are a protocol
    /// violation reported to the caller; nothing is written for them.
    pub fn change_tile(&mut self, tile: Tile) -> anyhow::Result<()> {
        if !self.board.in_bounds(tile.row, tile.col) {
            bail!(
                "tile ({}, {}) is outside the {dim}x{dim} board",
                tile.row,
                tile.col,
                dim = self.board.dim()
            );
        }

        *self.color_counts.entry(tile.color).or_insert(0) += 1;
        *self.edit_counts.entry(tile.owner.clone()).or_insert(0) += 1;
        self.total_edits += 1;

        let mut frame = Vec::new();
        ServerMsg::TileChanged(tile.clone()).pack(&mut frame);
        self.board.set_tile(tile);

        let mut gone = Vec::new();
        for (username, tx) in &self.sessions {
            match tx.try_send(frame.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(%username, "delivery queue full, evicting session");
                    gone.push(username.clone());
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    gone.push(username.clone());
                }
            }
        }
        for username in gone {
            self.sessions.remove(&username);
        }

        if tracing::enabled!(Level::DEBUG) {
            tracing::debug!("{}", self.statistics());
        }
        Ok(())
    }

    /// Removes the session's registry entry, freeing the username. Safe to
    /// call twice. The edit counters stay in place so the statistics
    /// outlive the session; a later login under the same name resets them.
    pub fn logout(&mut self, username: &str) {
        if self.sessions.remove(username).is_some() {
            tracing::info!(username, "logged out");
        }
    }

    /// A consistent point-in-time copy of the canvas.
    pub fn snapshot(&self) -> Board {
        self.board.clone()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::derive(&self.color_counts, &self.edit_counts, self.total_edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(row: u32, col: u32, owner: &str, color: TileColor) -> Tile {
        Tile {
            row,
            col,
            owner: owner.to_owned(),
            color,
            timestamp: 0,
        }
    }

    fn recv_tile_changed(rx: &mut mpsc::Receiver<Vec<u8>>) -> Tile {
        let frame = rx.try_recv().expect("a frame should be queued");
        let (_, msg) = ServerMsg::dequeue_and_decode(&frame).expect("complete frame");
        match msg.expect("frame decodes") {
            ServerMsg::TileChanged(tile) => tile,
            other => panic!("unexpected msg: {other:?}"),
        }
    }

    #[test]
    fn duplicate_username_is_refused_until_logout() {
        let mut engine = Engine::new(3);
        let (tx1, _rx1) = mpsc::channel(8);
        let (tx2, _rx2) = mpsc::channel(8);
        let (tx3, _rx3) = mpsc::channel(8);

        assert!(engine.login("alice", tx1).is_ok());
        assert!(engine.login("alice", tx2).is_err());

        engine.logout("alice");
        engine.logout("alice");
        assert!(engine.login("alice", tx3).is_ok());
    }

    #[test]
    fn every_session_sees_edits_in_applied_order() {
        let mut engine = Engine::new(4);
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        engine.login("alice", tx_a).unwrap();
        engine.login("bob", tx_b).unwrap();

        let edits = [
            tile(0, 0, "alice", TileColor::Red),
            tile(1, 1, "bob", TileColor::Blue),
            tile(0, 0, "bob", TileColor::Lime),
        ];
        for edit in &edits {
            engine.change_tile(edit.clone()).unwrap();
        }

        for rx in [&mut rx_a, &mut rx_b] {
            for edit in &edits {
                assert_eq!(&recv_tile_changed(rx), edit);
            }
        }

        // Last write wins at (0, 0).
        assert_eq!(engine.snapshot().tile(0, 0), &edits[2]);
    }

    #[test]
    fn out_of_range_edit_is_rejected_and_writes_nothing() {
        let mut engine = Engine::new(3);
        let (tx, mut rx) = mpsc::channel(8);
        engine.login("alice", tx).unwrap();

        assert!(engine.change_tile(tile(3, 0, "alice", TileColor::Red)).is_err());
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.statistics().total_edits, 0);
    }

    #[test]
    fn stalled_session_is_evicted_not_waited_on() {
        let mut engine = Engine::new(3);
        let (tx_a, mut rx_a) = mpsc::channel(1);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        engine.login("alice", tx_a).unwrap();
        engine.login("bob", tx_b).unwrap();

        // alice's queue holds one frame; the second overflows it.
        engine.change_tile(tile(0, 0, "bob", TileColor::Red)).unwrap();
        engine.change_tile(tile(0, 1, "bob", TileColor::Blue)).unwrap();
        engine.change_tile(tile(0, 2, "bob", TileColor::Lime)).unwrap();

        recv_tile_changed(&mut rx_a);
        assert!(rx_a.try_recv().is_err());
        for _ in 0..3 {
            recv_tile_changed(&mut rx_b);
        }

        // The eviction freed the username.
        let (tx, _rx) = mpsc::channel(8);
        assert!(engine.login("alice", tx).is_ok());
    }

    #[test]
    fn color_counts_always_sum_to_the_accepted_edit_total() {
        let mut engine = Engine::new(4);
        let (tx, _rx) = mpsc::channel(64);
        engine.login("alice", tx).unwrap();

        engine.change_tile(tile(0, 0, "alice", TileColor::Red)).unwrap();
        engine.change_tile(tile(0, 1, "alice", TileColor::Red)).unwrap();
        engine.change_tile(tile(1, 0, "bob", TileColor::Navy)).unwrap();
        assert!(engine.change_tile(tile(9, 9, "bob", TileColor::Navy)).is_err());

        let stats = engine.statistics();
        assert_eq!(stats.total_edits, 3);
        assert_eq!(stats.color_counts.values().sum::<u64>(), 3);
        assert_eq!(stats.edit_counts["alice"], 2);
        assert_eq!(stats.edit_counts["bob"], 1);
        assert_eq!(stats.top_contributor(), Some(("alice", 2)));
        assert_eq!(stats.concentration(TileColor::Red), 2.0 / 3.0);
        assert_eq!(stats.concentration(TileColor::White), 0.0);
    }

    #[test]
    fn snapshot_has_no_holes() {
        let mut engine = Engine::new(3);
        let (tx, _rx) = mpsc::channel(8);
        engine.login("alice", tx).unwrap();
        engine.change_tile(tile(1, 2, "alice", TileColor::Red)).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.dim(), 3);
        for row in 0..3 {
            for col in 0..3 {
                let cell = snapshot.tile(row, col);
                assert_eq!((cell.row, cell.col), (row, col));
            }
        }
    }
}
