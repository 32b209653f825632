//! Types shared by the Sokoban server and client: the board engine, player
//! actions, level loading and the JSON wire protocol.

pub mod action;
pub mod board;
pub mod error;
pub mod level;
pub mod protocol;

pub use action::{Action, ActionKind, Direction};
pub use board::{Board, Point, Tile};
pub use error::BoardError;
pub use level::{BoardMaker, DemoLevel, JsonLevel};
pub use protocol::{BoardView, ClientMessage, ServerMessage};

/// Players required before a session starts.
pub const DEFAULT_ROOM_SIZE: usize = 2;

/// Path the server accepts WebSocket upgrades on.
pub const WS_PATH: &str = "/ws";
