use crate::game::{ClientGameState, Update};
use crate::input::{Command, InputManager, CONTROLS};
use crate::rendering::Renderer;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::io::Stdout;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// WebSocket URL for a `host:port` server address.
pub fn server_url(server_addr: &str) -> String {
    format!("ws://{}{}", server_addr, shared::WS_PATH)
}

pub struct Client {
    url: String,
    game_state: ClientGameState,
    input_manager: InputManager,
    renderer: Renderer<Stdout>,
}

impl Client {
    pub fn new(server_addr: &str) -> Self {
        Client {
            url: server_url(server_addr),
            game_state: ClientGameState::new(),
            input_manager: InputManager::new(),
            renderer: Renderer::stdout(),
        }
    }

    /// Handles every message in one text frame. Returns false once the game is over for us.
    fn handle_frame(&mut self, text: &str) -> Result<bool, Box<dyn std::error::Error>> {
        for message in ServerMessage::parse_frame(text) {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    warn!("Ignoring undecodable message: {}", e);
                    continue;
                }
            };
            debug!("Received {:?}", message);

            let update = self.game_state.handle(message)?;
            self.renderer.render(&self.game_state, &update)?;
            if matches!(update, Update::Won { .. }) && self.game_state.has_won() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {}", self.url);
        let (socket, _) = connect_async(self.url.as_str()).await?;
        let (mut sink, mut stream) = socket.split();

        self.renderer.message("Waiting for other players...")?;
        self.renderer.message(CONTROLS)?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if !self.handle_frame(&text)? {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            self.renderer.message("Server closed the connection")?;
                            break;
                        }
                        // Pings are answered by tungstenite on the next read or write
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("Connection error: {}", e);
                            break;
                        }
                    }
                }

                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Input closed");
                        break;
                    };
                    let mut quit = false;
                    for command in self.input_manager.parse_line(&line) {
                        if command == Command::Quit {
                            quit = true;
                            break;
                        }
                        if !self.game_state.is_started() {
                            self.renderer.message("The game has not started yet")?;
                            break;
                        }
                        let Command::Play(action) = command else {
                            continue;
                        };
                        let message = ClientMessage::from_action(&action);
                        sink.send(Message::Text(serde_json::to_string(&message)?)).await?;
                        self.game_state.record_sent(action);
                    }
                    if quit {
                        break;
                    }
                }
            }
        }

        if let Err(e) = sink.close().await {
            debug!("Close failed: {}", e);
        }
        info!("Sent {} actions", self.input_manager.sent());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_url() {
        assert_eq!(server_url("127.0.0.1:8080"), "ws://127.0.0.1:8080/ws");
    }
}
