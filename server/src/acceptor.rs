use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::engine::SharedEngine;
use crate::session::spawn_session;

/// Listens for connections and spawns one session per accepted socket.
/// Binding is the only fatal step; everything after is per-connection.
pub struct Acceptor {
    listener: TcpListener,
    engine: SharedEngine,
}

impl Acceptor {
    pub async fn bind(addr: SocketAddr, engine: SharedEngine) -> anyhow::Result<Acceptor> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("could not listen on {addr}"))?;
        Ok(Acceptor { listener, engine })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts until the listener fails. No admission control: every
    /// connection gets a session immediately.
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            let (socket, addr) = self.listener.accept().await.context("accept failed")?;
            tracing::info!(%addr, "accepted connection");
            spawn_session(socket, addr, self.engine.clone());
        }
    }
}
