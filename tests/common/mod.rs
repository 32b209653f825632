//! Helpers for driving a real server over loopback

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use server::config::ServerConfig;
use server::network::Server;
use shared::{BoardMaker, ClientMessage, DemoLevel, ServerMessage};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub const WINNING_ROUTE: [&str; 6] = ["up", "left", "left", "down", "down", "right"];

/// Starts a server on an ephemeral port and returns its address.
pub async fn start_server(room_size: usize) -> SocketAddr {
    start_server_with(
        ServerConfig {
            room_size,
            ..ServerConfig::default()
        },
        Arc::new(DemoLevel),
    )
    .await
}

pub async fn start_server_with(config: ServerConfig, maker: Arc<dyn BoardMaker>) -> SocketAddr {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        ..config
    };
    let server = Server::bind(config, maker).await.expect("bind failed");
    let addr = server.local_addr().expect("no local address");
    tokio::spawn(server.run());
    addr
}

/// A WebSocket client that splits merged frames into individual messages.
pub struct TestPlayer {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pending: VecDeque<ServerMessage>,
}

impl TestPlayer {
    pub async fn connect(addr: SocketAddr) -> Self {
        let url = format!("ws://{}{}", addr, shared::WS_PATH);
        let (socket, _) = connect_async(url).await.expect("connect failed");
        Self {
            socket,
            pending: VecDeque::new(),
        }
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.socket
            .send(Message::Text(text.to_string()))
            .await
            .expect("send failed");
    }

    pub async fn send(&mut self, action: &str, direction: Option<&str>) {
        let message = ClientMessage::new(action, direction);
        let text = serde_json::to_string(&message).unwrap();
        self.send_raw(&text).await;
    }

    /// Next server message, or `None` once the server has closed the connection.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Some(message);
            }
            let frame = timeout(RECV_TIMEOUT, self.socket.next())
                .await
                .expect("timed out waiting for server");
            match frame {
                Some(Ok(Message::Text(text))) => {
                    for message in ServerMessage::parse_frame(&text) {
                        self.pending.push_back(message.expect("undecodable server message"));
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
                Some(Ok(_)) => {}
            }
        }
    }

    pub async fn expect_start(&mut self) -> (usize, usize) {
        match self.recv().await {
            Some(ServerMessage::Start(start)) => (start.me, start.num_players),
            other => panic!("expected start message, got {:?}", other),
        }
    }

    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}

/// Connects `n` players and returns them ordered by their player index.
pub async fn start_room(addr: SocketAddr, n: usize) -> Vec<TestPlayer> {
    let mut players = Vec::with_capacity(n);
    for _ in 0..n {
        players.push(TestPlayer::connect(addr).await);
    }

    let mut indexed = Vec::with_capacity(n);
    for mut player in players {
        let (me, num_players) = player.expect_start().await;
        assert_eq!(num_players, n);
        indexed.push((me, player));
    }
    indexed.sort_by_key(|(me, _)| *me);

    let indices: Vec<usize> = indexed.iter().map(|(me, _)| *me).collect();
    assert_eq!(indices, (0..n).collect::<Vec<_>>(), "player indices must be distinct");
    indexed.into_iter().map(|(_, player)| player).collect()
}
