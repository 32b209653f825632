//! Per-connection reader and writer tasks
//!
//! Each WebSocket gets two tasks. The reader enforces a read deadline that
//! only incoming traffic (including pong replies) refreshes, and forwards
//! decoded requests to the session once the hub has published an assignment.
//! The writer drains the bounded outbound queue, merging whatever is already
//! queued into one newline-separated frame, and sends keepalive pings.
//!
//! The two tasks always end together: when the writer exits it drops a
//! oneshot sender the reader is watching, and when the reader exits it either
//! evicts the connection from the hub or tells the session it disconnected,
//! both of which close the outbound queue and stop the writer.

use crate::config::ServerConfig;
use crate::controller::{Inbound, Request};
use crate::error::ServerError;
use crate::hub::{Assignment, AssignmentSlot, ConnectionId, HubHandle, SlotState, Waiting};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info, warn};
use shared::ClientMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};

/// Join handles of a connection's task pair.
pub struct ConnectionTasks {
    pub reader: JoinHandle<()>,
    pub writer: JoinHandle<()>,
}

/// Registers a new connection with the hub and starts its tasks.
///
/// Returns `None`, dropping the socket, if the hub is no longer running.
pub fn spawn<S>(
    id: ConnectionId,
    socket: S,
    hub: &HubHandle,
    config: &ServerConfig,
) -> Option<ConnectionTasks>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Send
        + Unpin
        + 'static,
{
    let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity);
    let slot: AssignmentSlot = Arc::new(Mutex::new(SlotState::Waiting));

    if !hub.accept(Waiting {
        id,
        outbound: outbound_tx,
        slot: Arc::clone(&slot),
    }) {
        warn!("Hub unavailable, dropping connection {}", id);
        return None;
    }

    let (sink, stream) = socket.split();
    let (writer_alive, writer_gone) = oneshot::channel();

    let writer = tokio::spawn(write_pump(
        id,
        sink,
        outbound_rx,
        writer_alive,
        config.ping_period(),
        config.write_wait,
    ));

    let reader = Reader {
        id,
        slot,
        hub: hub.clone(),
        pong_wait: config.pong_wait,
    };
    let reader = tokio::spawn(reader.run(stream, writer_gone));

    Some(ConnectionTasks { reader, writer })
}

struct Reader {
    id: ConnectionId,
    slot: AssignmentSlot,
    hub: HubHandle,
    pong_wait: Duration,
}

impl Reader {
    async fn run<R>(self, mut stream: R, mut writer_gone: oneshot::Receiver<()>)
    where
        R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        let mut assignment: Option<Assignment> = None;

        loop {
            let frame = tokio::select! {
                _ = &mut writer_gone => {
                    debug!("Connection {}: writer closed", self.id);
                    break;
                }
                frame = timeout(self.pong_wait, stream.next()) => frame,
            };

            let message = match frame {
                Err(_) => {
                    warn!(
                        "Connection {}: no traffic for {:?}, closing",
                        self.id, self.pong_wait
                    );
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    debug!("Connection {}: read error: {}", self.id, e);
                    break;
                }
                Ok(Some(Ok(message))) => message,
            };

            if assignment.is_none() {
                if let SlotState::Assigned(assigned) = &*self.slot.lock().await {
                    info!(
                        "Connection {}: playing session {} as player {}",
                        self.id, assigned.session, assigned.player
                    );
                    assignment = Some(assigned.clone());
                }
            }

            let request = match message {
                Message::Text(text) => match ClientMessage::parse(&text) {
                    Ok(message) => Request::Action(message),
                    Err(e) => Request::Malformed(format!("invalid message: {}", e)),
                },
                Message::Binary(_) => Request::Malformed("binary frames are not supported".into()),
                Message::Close(_) => break,
                // Pings are answered by the protocol layer; any frame refreshes the deadline.
                _ => continue,
            };

            let Some(assigned) = &assignment else {
                debug!("Connection {}: dropping frame received before matching", self.id);
                continue;
            };

            let inbound = Inbound {
                player: assigned.player,
                request,
            };
            if assigned.inbound.send(inbound).await.is_err() {
                debug!("Connection {}: session already finished", self.id);
                break;
            }
        }

        self.leave().await;
    }

    /// Routes the disconnect to whoever currently owns the connection.
    async fn leave(self) {
        let mut state = self.slot.lock().await;
        if matches!(*state, SlotState::Waiting) {
            *state = SlotState::Closed;
            drop(state);
            self.hub.leave(self.id);
            info!("Connection {}: closed while waiting", self.id);
            return;
        }

        let SlotState::Assigned(assigned) = &*state else {
            return;
        };
        let assigned = assigned.clone();
        drop(state);

        let notice = Inbound {
            player: assigned.player,
            request: Request::Disconnect,
        };
        // A closed queue means the session already ended.
        let _ = assigned.inbound.send(notice).await;
        info!(
            "Connection {}: player {} disconnected from session {}",
            self.id, assigned.player, assigned.session
        );
    }
}

async fn write_pump<W>(
    id: ConnectionId,
    mut sink: W,
    mut outbound: mpsc::Receiver<String>,
    _writer_alive: oneshot::Sender<()>,
    ping_period: Duration,
    write_wait: Duration,
) where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let mut ping = interval(ping_period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first tick since it fires immediately
    ping.tick().await;

    loop {
        tokio::select! {
            payload = outbound.recv() => {
                let Some(first) = payload else {
                    debug!("Connection {}: outbound queue closed", id);
                    let _ = write_frame(&mut sink, Message::Close(None), write_wait).await;
                    break;
                };
                let frame = merge_pending(first, &mut outbound);
                if let Err(e) = write_frame(&mut sink, Message::Text(frame), write_wait).await {
                    debug!("Connection {}: write failed: {}", id, e);
                    break;
                }
            }
            _ = ping.tick() => {
                let ping_frame = Message::Ping(Vec::new());
                if let Err(e) = write_frame(&mut sink, ping_frame, write_wait).await {
                    debug!("Connection {}: ping failed: {}", id, e);
                    break;
                }
            }
        }
    }

    debug!("Connection {}: writer closed", id);
}

/// Appends every payload already waiting in the queue, newline separated.
fn merge_pending(first: String, outbound: &mut mpsc::Receiver<String>) -> String {
    let mut frame = first;
    while let Ok(next) = outbound.try_recv() {
        frame.push('\n');
        frame.push_str(&next);
    }
    frame
}

async fn write_frame<W>(
    sink: &mut W,
    message: Message,
    write_wait: Duration,
) -> Result<(), ServerError>
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    match timeout(write_wait, sink.send(message)).await {
        Ok(result) => result.map_err(ServerError::from),
        Err(_) => Err(ServerError::WriteTimeout(write_wait)),
    }
}
