//! Matchmaking hub
//!
//! The hub is an actor: a single task owns the waiting pool and changes it
//! only in response to [`HubEvent`]s from connection tasks. When the pool
//! holds a full room, the hub drains it in join order, publishes each
//! player's [`Assignment`] through the connection's slot and starts the
//! session loop on the blocking thread pool.

use crate::controller::{Inbound, SessionId, WsController};
use crate::session::{Controller, Game};
use log::{debug, error, info};
use shared::BoardMaker;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

pub type ConnectionId = u64;

/// Everything a connection needs once it has been placed in a session.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub session: SessionId,
    pub player: usize,
    pub inbound: mpsc::Sender<Inbound>,
}

/// Lifecycle of a connection as seen by the hub.
#[derive(Debug, Clone, Default)]
pub enum SlotState {
    #[default]
    Waiting,
    Assigned(Assignment),
    /// The connection went away before being matched.
    Closed,
}

/// Handoff point between the hub and a connection's reader task.
pub type AssignmentSlot = Arc<Mutex<SlotState>>;

/// A connection waiting to be matched.
#[derive(Debug)]
pub struct Waiting {
    pub id: ConnectionId,
    /// Sole handle to the connection's outbound queue; dropping it closes the connection.
    pub outbound: mpsc::Sender<String>,
    pub slot: AssignmentSlot,
}

#[derive(Debug)]
pub enum HubEvent {
    Join(Waiting),
    Leave(ConnectionId),
}

/// Cloneable handle used by connection tasks to reach the hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    events: mpsc::UnboundedSender<HubEvent>,
}

impl HubHandle {
    /// Adds a connection to the waiting pool. Returns false if the hub has stopped.
    pub fn accept(&self, waiting: Waiting) -> bool {
        self.events.send(HubEvent::Join(waiting)).is_ok()
    }

    /// Evicts a connection that has not been matched yet.
    pub fn leave(&self, id: ConnectionId) {
        if self.events.send(HubEvent::Leave(id)).is_err() {
            debug!("Hub stopped; ignoring leave for connection {}", id);
        }
    }
}

/// A handle whose events are delivered to the caller instead of a running hub.
#[cfg(test)]
pub(crate) fn test_handle() -> (HubHandle, mpsc::UnboundedReceiver<HubEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (HubHandle { events: tx }, rx)
}

pub struct Hub {
    events: mpsc::UnboundedReceiver<HubEvent>,
    waiting: BTreeMap<ConnectionId, Waiting>,
    room_size: usize,
    maker: Arc<dyn BoardMaker>,
    next_session: SessionId,
}

impl Hub {
    pub fn new(room_size: usize, maker: Arc<dyn BoardMaker>) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            events: rx,
            waiting: BTreeMap::new(),
            room_size,
            maker,
            next_session: 1,
        };
        (hub, HubHandle { events: tx })
    }

    /// Processes events until every [`HubHandle`] has been dropped.
    pub async fn run(mut self) {
        info!("Hub started (room size {})", self.room_size);
        while let Some(event) = self.events.recv().await {
            match event {
                HubEvent::Join(waiting) => {
                    let id = waiting.id;
                    self.waiting.insert(id, waiting);
                    info!(
                        "Connection {} joined hub, {} waiting",
                        id,
                        self.waiting.len()
                    );
                    self.start_sessions().await;
                }
                HubEvent::Leave(id) => {
                    // Dropping the entry drops its outbound sender, closing the connection.
                    if self.waiting.remove(&id).is_some() {
                        info!(
                            "Connection {} left hub, {} waiting",
                            id,
                            self.waiting.len()
                        );
                    }
                }
            }
        }
        info!("Hub stopped");
    }

    /// Starts as many sessions as the waiting pool can fill.
    async fn start_sessions(&mut self) {
        while self.waiting.len() >= self.room_size {
            let room: Vec<Waiting> = (0..self.room_size)
                .filter_map(|_| self.waiting.pop_first().map(|(_, waiting)| waiting))
                .collect();

            // Hold every slot lock so no member can close between check and handoff.
            let mut slots = Vec::with_capacity(room.len());
            for waiting in &room {
                slots.push(Arc::clone(&waiting.slot).lock_owned().await);
            }

            if slots.iter().any(|slot| matches!(**slot, SlotState::Closed)) {
                self.requeue_live(room, slots);
                continue;
            }

            self.launch(room, slots);
        }
    }

    /// Returns the still-open members of an aborted room to the pool.
    fn requeue_live(&mut self, room: Vec<Waiting>, slots: Vec<OwnedMutexGuard<SlotState>>) {
        let closed: Vec<bool> = slots
            .iter()
            .map(|slot| matches!(**slot, SlotState::Closed))
            .collect();
        drop(slots);

        for (waiting, closed) in room.into_iter().zip(closed) {
            if closed {
                debug!("Dropping closed connection {} from hub", waiting.id);
            } else {
                self.waiting.insert(waiting.id, waiting);
            }
        }
    }

    fn launch(&mut self, room: Vec<Waiting>, mut slots: Vec<OwnedMutexGuard<SlotState>>) {
        let session = self.next_session;
        self.next_session += 1;

        let (inbound_tx, inbound_rx) = mpsc::channel(room.len() + 1);
        for (player, slot) in slots.iter_mut().enumerate() {
            **slot = SlotState::Assigned(Assignment {
                session,
                player,
                inbound: inbound_tx.clone(),
            });
        }
        drop(slots);
        drop(inbound_tx);

        let ids: Vec<ConnectionId> = room.iter().map(|waiting| waiting.id).collect();
        let outbound = room.into_iter().map(|waiting| waiting.outbound).collect();
        let controller = WsController::new(session, inbound_rx, outbound);

        info!(
            "Starting session {} with {} players (connections {:?})",
            session,
            ids.len(),
            ids
        );
        spawn_session(controller, Arc::clone(&self.maker));
    }
}

/// Runs a session loop on the blocking pool and tears it down afterwards.
///
/// The loop holds its thread until the session ends, so the pool size
/// (see [`crate::config::ServerConfig::max_sessions`]) caps concurrent sessions.
pub fn spawn_session(
    mut controller: WsController,
    maker: Arc<dyn BoardMaker>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let session = controller.session();
        match Game::new(controller.num_players(), maker.as_ref()) {
            Ok(mut game) => {
                let turns = game.play(&mut controller);
                info!(
                    "Session {} finished after {} turns (closing: {})",
                    session,
                    turns,
                    controller.closing()
                );
            }
            Err(e) => {
                error!("Session {} aborted, failed to build board: {}", session, e);
            }
        }
        controller.shutdown();
    })
}
