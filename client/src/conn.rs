use msgs::client_msg::ClientMsg;
use msgs::server_msg::ServerMsg;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::error::ConnectError;
use crate::model::CanvasHandle;

const OUTBOUND_QUEUE_CAPACITY: usize = 100;

/// Dials the server and runs the login handshake. On success the returned
/// handle is live: a background task keeps its board in sync with the
/// server until the stream ends.
pub async fn connect(host: &str, port: u16, username: &str) -> Result<CanvasHandle, ConnectError> {
    let mut socket = TcpStream::connect((host, port)).await?;

    let mut output_buffer = Vec::new();
    ClientMsg::Login(username.to_owned()).pack(&mut output_buffer);
    socket.write_all(&output_buffer).await?;

    let mut static_buffer = [0; 1024];
    let mut input_buffer = Vec::new();

    // The server answers with LoginSuccess + Board, or one Error.
    match read_msg(&mut socket, &mut static_buffer, &mut input_buffer).await? {
        ServerMsg::LoginSuccess(text) => tracing::info!("{text}"),
        ServerMsg::Error(reason) => return Err(ConnectError::LoginRefused(reason)),
        other => {
            return Err(ConnectError::Protocol(format!(
                "expected a login response, got: {other:?}"
            )))
        }
    }

    let board = match read_msg(&mut socket, &mut static_buffer, &mut input_buffer).await? {
        ServerMsg::Board(board) => board,
        other => {
            return Err(ConnectError::Protocol(format!(
                "expected the board, got: {other:?}"
            )))
        }
    };

    let (to_server, from_model) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let handle = CanvasHandle::new(username.to_owned(), board, to_server);
    spawn_connection_process(socket, input_buffer, handle.clone(), from_model);
    Ok(handle)
}

async fn read_msg(
    socket: &mut TcpStream,
    static_buffer: &mut [u8],
    input_buffer: &mut Vec<u8>,
) -> Result<ServerMsg, ConnectError> {
    loop {
        if let Some((end, msg)) = ServerMsg::dequeue_and_decode(input_buffer) {
            let msg = msg.map_err(|e| ConnectError::Protocol(format!("{e:#}")))?;
            input_buffer.drain(..end);
            return Ok(msg);
        }

        let len = socket.read(static_buffer).await?;
        if len == 0 {
            return Err(ConnectError::Protocol(
                "connection closed during the handshake".to_owned(),
            ));
        }
        input_buffer.extend(&static_buffer[..len]);
    }
}

/// The connection's read/write loop, spawned once per handle. Incoming
/// changes are applied to the model; outbound frames from the model are
/// written to the socket. Any transport or protocol failure ends the task;
/// the model simply stops changing.
fn spawn_connection_process(
    mut socket: TcpStream,
    mut input_buffer: Vec<u8>,
    handle: CanvasHandle,
    mut from_model: mpsc::Receiver<Vec<u8>>,
) {
    tokio::spawn(async move {
        let mut static_buffer = [0; 1024];

        'connected: loop {
            tokio::select! {
                result = socket.read(&mut static_buffer) => {
                    let len = match result {
                        Ok(len) => len,
                        Err(e) => {
                            tracing::warn!("error while reading from server: {e}");
                            break;
                        }
                    };
                    if len == 0 {
                        tracing::info!("server closed the connection");
                        break;
                    }
                    input_buffer.extend(&static_buffer[..len]);

                    while let Some((end, msg)) = ServerMsg::dequeue_and_decode(&input_buffer) {
                        match msg {
                            Ok(ServerMsg::TileChanged(tile)) => handle.apply(tile),
                            // The server reports errors without closing.
                            Ok(ServerMsg::Error(reason)) => {
                                tracing::warn!("server error: {reason}");
                            }
                            Ok(other) => {
                                tracing::warn!("unexpected message from server: {other:?}");
                                break 'connected;
                            }
                            Err(e) => {
                                tracing::warn!("could not decode server message: {e:#}");
                                break 'connected;
                            }
                        }
                        input_buffer.drain(..end);
                    }
                }
                outbound = from_model.recv() => {
                    let Some(frame) = outbound else {
                        break;
                    };
                    if let Err(e) = socket.write_all(&frame).await {
                        tracing::warn!("error while writing to server: {e}");
                        break;
                    }
                }
            }
        }
    });
}
