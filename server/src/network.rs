//! TCP listener and WebSocket handshake
//!
//! Accepted sockets are upgraded only on [`shared::WS_PATH`]; any other path
//! is refused with `404 Not Found`. Upgraded connections are handed to the
//! hub through [`connection::spawn`].

use crate::config::ServerConfig;
use crate::connection;
use crate::error::ServerError;
use crate::hub::{ConnectionId, Hub};
use log::{debug, error, info, warn};
use shared::BoardMaker;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::WebSocketStream;

/// Listening server. Owns the socket until [`Server::run`] is called.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    maker: Arc<dyn BoardMaker>,
}

impl Server {
    pub async fn bind(
        config: ServerConfig,
        maker: Arc<dyn BoardMaker>,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            config,
            maker,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Starts the hub and accepts connections until the task is cancelled.
    pub async fn run(self) -> Result<(), ServerError> {
        let (hub, handle) = Hub::new(self.config.room_size, self.maker);
        tokio::spawn(hub.run());

        let mut next_id: ConnectionId = 1;
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let id = next_id;
            next_id += 1;
            debug!("Connection {} accepted from {}", id, addr);

            let hub = handle.clone();
            let config = self.config.clone();
            tokio::spawn(async move {
                match upgrade(stream, &config).await {
                    Ok(socket) => {
                        info!("Connection {} from {} upgraded", id, addr);
                        if connection::spawn(id, socket, &hub, &config).is_none() {
                            warn!("Connection {} dropped, hub is not running", id);
                        }
                    }
                    Err(e) => warn!("Connection {} from {} rejected: {}", id, addr, e),
                }
            });
        }
    }
}

/// Performs the WebSocket handshake, bounded by the write deadline.
async fn upgrade(
    stream: TcpStream,
    config: &ServerConfig,
) -> Result<WebSocketStream<TcpStream>, ServerError> {
    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(config.max_message_size);
    ws_config.max_frame_size = Some(config.max_message_size);

    let handshake =
        tokio_tungstenite::accept_hdr_async_with_config(stream, check_path, Some(ws_config));
    match timeout(config.write_wait, handshake).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ServerError::HandshakeTimeout(config.write_wait)),
    }
}

fn check_path(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == shared::WS_PATH {
        return Ok(response);
    }
    let mut refusal = ErrorResponse::new(Some("not found".to_string()));
    *refusal.status_mut() = StatusCode::NOT_FOUND;
    Err(refusal)
}
