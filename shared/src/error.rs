use thiserror::Error;

/// Errors raised while building a board or loading a level.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("invalid board dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("position ({x}, {y}) is outside the board")]
    OutOfBounds { x: i32, y: i32 },

    #[error("position ({x}, {y}) is already occupied")]
    Occupied { x: i32, y: i32 },

    #[error("unable to parse level: {0}")]
    Parse(#[from] serde_json::Error),
}
