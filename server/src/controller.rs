//! Session router between WebSocket connections and the session loop
//!
//! [`WsController`] implements [`Controller`] for networked players. It owns
//! the only handle to every player's outbound queue and all liveness
//! bookkeeping (`connected`, `won`, `n_playing`). Connection tasks never touch
//! that state directly; they enqueue [`Inbound`] requests, including a
//! disconnect notice, and the session loop applies them one at a time.
//!
//! Outbound delivery is lossy. A message that cannot be queued immediately
//! marks its player as unresponsive and disconnects them; the session never
//! waits on a slow peer.

use crate::session::Controller;
use log::{debug, error, info, warn};
use shared::{Action, Board, ClientMessage, ServerMessage};
use tokio::sync::mpsc::{self, error::TrySendError};

pub type SessionId = u64;

/// What a connection can ask of its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Action(ClientMessage),
    /// A frame that could not be decoded, with the reason.
    Malformed(String),
    /// The connection's socket is gone.
    Disconnect,
}

/// A request tagged with the player it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub player: usize,
    pub request: Request,
}

pub struct WsController {
    session: SessionId,
    inbound: mpsc::Receiver<Inbound>,
    /// `None` once a player's queue has been closed.
    outbound: Vec<Option<mpsc::Sender<String>>>,
    connected: Vec<bool>,
    won: Vec<bool>,
    n_playing: usize,
}

impl WsController {
    /// Creates a controller for `outbound.len()` players, all connected.
    pub fn new(
        session: SessionId,
        inbound: mpsc::Receiver<Inbound>,
        outbound: Vec<mpsc::Sender<String>>,
    ) -> Self {
        let num_players = outbound.len();
        Self {
            session,
            inbound,
            outbound: outbound.into_iter().map(Some).collect(),
            connected: vec![true; num_players],
            won: vec![false; num_players],
            n_playing: num_players,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn num_players(&self) -> usize {
        self.outbound.len()
    }

    /// Players that have neither left nor won.
    pub fn n_playing(&self) -> usize {
        self.n_playing
    }

    pub fn is_connected(&self, player: usize) -> bool {
        self.connected.get(player).copied().unwrap_or(false)
    }

    pub fn has_won(&self, player: usize) -> bool {
        self.won.get(player).copied().unwrap_or(false)
    }

    /// Closes every remaining outbound queue and the inbound queue.
    ///
    /// Called once the session loop has finished (or never started). Closing
    /// an outbound queue makes that connection send a close frame and exit,
    /// so no socket outlives its session.
    pub fn shutdown(&mut self) {
        for player in 0..self.num_players() {
            if self.outbound[player].take().is_some() {
                debug!("Session {}: closing player {}", self.session, player);
            }
            self.connected[player] = false;
        }

        self.inbound.close();
        let mut pending = 0;
        while self.inbound.try_recv().is_ok() {
            pending += 1;
        }
        info!(
            "Session {} shut down ({} pending requests discarded)",
            self.session, pending
        );
    }

    /// Marks `player` as gone and closes their queue. Decrements `n_playing`
    /// only on the first transition and only if they had not already won.
    fn disconnect(&mut self, player: usize) {
        if !self.is_connected(player) {
            return;
        }
        self.connected[player] = false;
        self.outbound[player] = None;
        if !self.won[player] {
            self.n_playing -= 1;
        }
        info!(
            "Session {}: player {} left ({} still playing)",
            self.session, player, self.n_playing
        );
    }

    fn send_to(&mut self, player: usize, message: &ServerMessage) {
        match message.to_json() {
            Ok(payload) => self.send_raw(player, payload),
            Err(e) => error!("Session {}: failed to encode message: {}", self.session, e),
        }
    }

    fn broadcast(&mut self, message: &ServerMessage, except: Option<usize>) {
        let payload = match message.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Session {}: failed to encode broadcast: {}", self.session, e);
                return;
            }
        };

        for player in 0..self.num_players() {
            if Some(player) != except {
                self.send_raw(player, payload.clone());
            }
        }
    }

    /// Queues a payload without waiting. A full or closed queue disconnects the player.
    fn send_raw(&mut self, player: usize, payload: String) {
        if !self.is_connected(player) {
            return;
        }
        let Some(queue) = &self.outbound[player] else {
            return;
        };

        match queue.try_send(payload) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Session {}: player {} unresponsive", self.session, player);
                self.disconnect(player);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Session {}: player {} writer already gone", self.session, player);
                self.disconnect(player);
            }
        }
    }
}

impl Controller for WsController {
    fn init(&mut self, board: &Board) {
        let view = board.to_view();
        let num_players = self.num_players();
        for player in 0..num_players {
            self.send_to(
                player,
                &ServerMessage::start(num_players, player, view.clone()),
            );
        }
    }

    /// Blocks on the inbound queue; must not be called from an async context.
    fn recv_input(&mut self) -> Option<(usize, Action)> {
        loop {
            let Some(Inbound { player, request }) = self.inbound.blocking_recv() else {
                // Every connection handle is gone; nobody can act any more.
                for player in 0..self.num_players() {
                    self.disconnect(player);
                }
                return None;
            };

            match request {
                Request::Disconnect => {
                    self.disconnect(player);
                    return Some((player, Action::invalid()));
                }
                Request::Malformed(reason) => {
                    debug!(
                        "Session {}: malformed request from player {}: {}",
                        self.session, player, reason
                    );
                    self.send_to(player, &ServerMessage::error(player, reason));
                }
                Request::Action(message) => {
                    let action = if self.is_connected(player) {
                        message.to_action()
                    } else {
                        Action::invalid()
                    };
                    debug!(
                        "Session {}: player {} {} {}",
                        self.session,
                        player,
                        message.action,
                        action.direction_label()
                    );
                    return Some((player, action));
                }
            }
        }
    }

    fn send_result(&mut self, player: usize, success: bool, action: Action) {
        self.send_to(player, &ServerMessage::result(player, success));
        if success {
            self.broadcast(&ServerMessage::opponent_action(player, &action), Some(player));
        }
    }

    fn output_board(&mut self, player: usize, board: &Board) {
        if !self.is_connected(player) || self.won[player] || !board.won() {
            return;
        }

        self.won[player] = true;
        self.n_playing -= 1;
        info!(
            "Session {}: player {} won ({} still playing)",
            self.session, player, self.n_playing
        );
        self.broadcast(&ServerMessage::win(player), None);
    }

    fn closing(&self) -> bool {
        self.n_playing == 0
    }
}
