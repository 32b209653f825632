use shared::BoardError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Server errors.
///
/// Transport and capacity problems on a single connection never surface as
/// a `ServerError` to the caller; they are logged and turned into disconnects.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("write deadline of {0:?} exceeded")]
    WriteTimeout(std::time::Duration),

    #[error("WebSocket handshake not completed within {0:?}")]
    HandshakeTimeout(std::time::Duration),

    #[error("board construction failed: {0}")]
    Board(#[from] BoardError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
