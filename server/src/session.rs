use std::net::SocketAddr;

use anyhow::bail;
use msgs::board::Board;
use msgs::client_msg::ClientMsg;
use msgs::server_msg::ServerMsg;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::engine::{SharedEngine, DELIVERY_QUEUE_CAPACITY};

/// Runs one connection's whole lifecycle on its own task: login handshake,
/// then the active loop joining the delivery queue with the socket read
/// path. Whatever ends the session, the engine entry is removed exactly
/// once and only this connection is affected.
pub fn spawn_session(socket: TcpStream, addr: SocketAddr, engine: SharedEngine) {
    tokio::spawn(async move {
        match run_session(socket, addr, engine).await {
            Ok(()) => tracing::info!(%addr, "session closed"),
            Err(e) => tracing::warn!(%addr, "session closed: {e:#}"),
        }
    });
}

async fn run_session(
    mut socket: TcpStream,
    addr: SocketAddr,
    engine: SharedEngine,
) -> anyhow::Result<()> {
    let mut static_buffer = [0; 1024];
    let mut input_buffer = Vec::new();

    let username = read_login(&mut socket, &mut static_buffer, &mut input_buffer).await?;

    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(DELIVERY_QUEUE_CAPACITY);
    // Bind before matching so the lock is released ahead of any await.
    let login_result = engine.lock().unwrap().login(&username, tx);
    let board = match login_result {
        Ok(board) => board,
        Err(_refused) => {
            let mut output_buffer = Vec::new();
            ServerMsg::Error("Unable to login; username already exists".to_owned())
                .pack(&mut output_buffer);
            socket.write_all(&output_buffer).await?;
            tracing::info!(%addr, %username, "login refused, closing connection");
            return Ok(());
        }
    };
    tracing::info!(%addr, %username, "session active");

    let result = serve(
        &mut socket,
        board,
        &mut rx,
        &engine,
        &mut static_buffer,
        &mut input_buffer,
    )
    .await;

    // Idempotent; also covers sessions the engine already evicted.
    engine.lock().unwrap().logout(&username);
    result
}

/// Waits for the first complete frame, which must be a login request.
/// Anything else, including end of stream, is a protocol violation.
async fn read_login(
    socket: &mut TcpStream,
    static_buffer: &mut [u8],
    input_buffer: &mut Vec<u8>,
) -> anyhow::Result<String> {
    loop {
        if let Some((end, msg)) = ClientMsg::dequeue_and_decode(input_buffer) {
            let msg = msg?;
            input_buffer.drain(..end);
            return match msg {
                ClientMsg::Login(username) => Ok(username),
                other => bail!("expected login, got: {other:?}"),
            };
        }

        let len = socket.read(static_buffer).await?;
        if len == 0 {
            bail!("connection closed before login");
        }
        input_buffer.extend(&static_buffer[..len]);
    }
}

async fn serve(
    socket: &mut TcpStream,
    board: Board,
    rx: &mut mpsc::Receiver<Vec<u8>>,
    engine: &SharedEngine,
    static_buffer: &mut [u8],
    input_buffer: &mut Vec<u8>,
) -> anyhow::Result<()> {
    {
        let mut output_buffer = Vec::new();
        ServerMsg::LoginSuccess("Connection Successful.".to_owned()).pack(&mut output_buffer);
        ServerMsg::Board(board).pack(&mut output_buffer);
        socket.write_all(&output_buffer).await?;
    }

    loop {
        tokio::select! {
            biased;
            delivery = rx.recv() => {
                match delivery {
                    Some(frame) => socket.write_all(&frame).await?,
                    // The engine dropped our queue: evicted as stalled.
                    None => bail!("evicted by the engine"),
                }
            }
            result = socket.read(static_buffer) => {
                let len = result?;
                if len == 0 {
                    // Orderly end of stream.
                    return Ok(());
                }
                input_buffer.extend(&static_buffer[..len]);

                while let Some((end, msg)) = ClientMsg::dequeue_and_decode(input_buffer) {
                    match msg? {
                        ClientMsg::ChangeTile(tile) => {
                            engine.lock().unwrap().change_tile(tile)?;
                        }
                        ClientMsg::Login(_) => bail!("login repeated on an active session"),
                    }
                    input_buffer.drain(..end);
                }
            }
        }
    }
}
