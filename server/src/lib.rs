//! # Sokoban Session Server Library
//!
//! This library provides the server side of the networked Sokoban game. Players
//! connect over WebSocket, wait in a matchmaking pool until a room fills, and
//! then race each other on identical copies of the same puzzle.
//!
//! ## Core Responsibilities
//!
//! ### Matchmaking
//! A single hub task owns the pool of waiting connections. When enough
//! players have joined it starts a session for them, in the order they
//! arrived, and hands each connection its player index.
//!
//! ### Turn Processing
//! Every session runs a synchronous loop on the blocking thread pool. The loop
//! is the only code that touches the session's boards, so moves are applied
//! strictly in the order they are received.
//!
//! ### Fan-out
//! The acting player receives the result of every action. Successful actions
//! are also broadcast to the other players, as is the moment someone solves
//! the puzzle.
//!
//! ## Architecture Design
//!
//! ### Queues Instead of Shared State
//! Tasks talk to each other only through `tokio::sync::mpsc` queues. The one
//! exception is a small mutex-guarded slot per connection through which the
//! hub publishes the connection's session assignment.
//!
//! ### Backpressure
//! Each player's outbound queue is bounded. A player whose queue is full when
//! the session wants to send is treated as disconnected rather than allowed to
//! stall everyone else.
//!
//! ### Liveness
//! Writers ping idle connections and readers enforce a read deadline. A peer
//! that stops answering is disconnected and its session carries on without it.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Timeouts, queue sizes and room size, with defaults.
//!
//! ### Connection Module (`connection`)
//! The reader/writer task pair attached to each socket.
//!
//! ### Controller Module (`controller`)
//! Bridges a session's connections to its turn loop: routing requests in,
//! results and broadcasts out, and tracking who is still playing.
//!
//! ### Hub Module (`hub`)
//! The matchmaking actor.
//!
//! ### Network Module (`network`)
//! TCP listener and WebSocket handshake.
//!
//! ### Session Module (`session`)
//! The turn loop and the [`session::Controller`] contract it runs against.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use shared::DemoLevel;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         bind_addr: "127.0.0.1:8080".to_string(),
//!         ..ServerConfig::default()
//!     };
//!
//!     // Bind first so configuration and address errors surface immediately
//!     let server = Server::bind(config, Arc::new(DemoLevel)).await?;
//!
//!     // Runs until the task is cancelled:
//!     // - accepts WebSocket connections on /ws
//!     // - matches them into rooms of two
//!     // - runs one session loop per room
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod controller;
pub mod error;
pub mod hub;
pub mod network;
pub mod session;
