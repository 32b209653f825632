//! # Sokoban Terminal Client Library
//!
//! This library provides a small terminal client for the networked Sokoban
//! server. It reads keystrokes from stdin, sends them as actions over a
//! WebSocket and draws the player's board as ASCII art.
//!
//! ## Architecture Overview
//!
//! ### Board Replica
//! The server sends the full board once, when the session starts. After that
//! it only reports whether each action succeeded. The client keeps its own
//! copy of the board and applies an action to it only after the server has
//! confirmed it, so the replica never runs ahead of the authoritative board.
//!
//! ### Opponents
//! Other players' successful actions and wins arrive as broadcasts. They are
//! reported as text; the client does not track other players' boards.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The board replica and the queue of actions awaiting confirmation.
//!
//! ### Input Module (`input`)
//! Maps typed keys to actions:
//! - `w`/`a`/`s`/`d` to walk or push
//! - `u` to undo, `r` to reset
//! - `q` to quit
//!
//! ### Network Module (`network`)
//! WebSocket connection and the main select loop over socket and stdin.
//!
//! ### Rendering Module (`rendering`)
//! ASCII board drawing and event descriptions.
//!
//! ## Usage Example
//!
//! ```rust
//! use client::game::ClientGameState;
//! use client::rendering::render_board;
//! use shared::{BoardMaker, DemoLevel, ServerMessage};
//!
//! let mut state = ClientGameState::new();
//! let board = DemoLevel.gen_board().unwrap().to_view();
//! state.handle(ServerMessage::start(2, 0, board)).unwrap();
//!
//! print!("{}", render_board(state.board.as_ref().unwrap()));
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
