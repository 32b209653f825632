//! Runtime settings for the server

use crate::error::ServerError;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Settings shared by the listener, the hub and every connection.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to, e.g. `127.0.0.1:8080`.
    pub bind_addr: String,
    /// Players required before a session starts.
    pub room_size: usize,
    /// Capacity of each player's outbound queue. A full queue disconnects the player.
    pub outbound_capacity: usize,
    /// How long a connection may stay silent before it is considered dead.
    pub pong_wait: Duration,
    /// Upper bound on a single socket write.
    pub write_wait: Duration,
    /// Largest client frame accepted, in bytes.
    pub max_message_size: usize,
    /// Sessions that can run at once.
    ///
    /// Every session loop occupies one thread of the blocking pool for its
    /// whole life, so this sizes that pool in [`ServerConfig::runtime`]. Rooms
    /// filled beyond the limit are assigned but wait for a free thread before
    /// their start message goes out.
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_size: shared::DEFAULT_ROOM_SIZE,
            outbound_capacity: 5,
            pong_wait: Duration::from_secs(60),
            write_wait: Duration::from_secs(10),
            max_message_size: 512,
            max_sessions: 512,
        }
    }
}

impl ServerConfig {
    /// Interval between keepalive pings; shorter than `pong_wait` so a healthy
    /// peer always answers before its read deadline expires.
    pub fn ping_period(&self) -> Duration {
        self.pong_wait * 9 / 10
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.room_size == 0 {
            return Err(ServerError::Config("room size must be at least 1".into()));
        }
        if self.outbound_capacity == 0 {
            return Err(ServerError::Config(
                "outbound queue capacity must be at least 1".into(),
            ));
        }
        if self.pong_wait.is_zero() || self.write_wait.is_zero() {
            return Err(ServerError::Config("timeouts must be non-zero".into()));
        }
        if self.max_message_size == 0 {
            return Err(ServerError::Config("max message size must be non-zero".into()));
        }
        if self.max_sessions == 0 {
            return Err(ServerError::Config("max sessions must be at least 1".into()));
        }
        Ok(())
    }

    /// Multi-threaded runtime whose blocking pool fits `max_sessions` session loops.
    pub fn runtime(&self) -> Result<Runtime, ServerError> {
        self.validate()?;
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .max_blocking_threads(self.max_sessions)
            .build()?;
        Ok(runtime)
    }
}
