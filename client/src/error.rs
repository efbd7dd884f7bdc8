use std::fmt;
use std::io;

/// Why `connect` failed.
#[derive(Debug)]
pub enum ConnectError {
    Io(io::Error),
    /// The server refused the login, e.g. the username is already taken.
    LoginRefused(String),
    /// The server broke the handshake sequence.
    Protocol(String),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Io(e) => write!(f, "connection failed: {e}"),
            ConnectError::LoginRefused(reason) => f.write_str(reason),
            ConnectError::Protocol(reason) => write!(f, "protocol error: {reason}"),
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConnectError {
    fn from(e: io::Error) -> Self {
        ConnectError::Io(e)
    }
}
