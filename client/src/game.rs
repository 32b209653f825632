//! Local replica of the player's board
//!
//! The server never sends board snapshots after the start message, only
//! per-action results. The client therefore remembers the actions it has sent
//! but not yet seen confirmed, and applies each one to its replica when the
//! matching result arrives with `move_valid = true`. Results arrive in the
//! order the actions were sent, so a FIFO queue is enough to pair them up.

use log::{debug, warn};
use shared::protocol::{ActionResult, GameStart, PlayerAction, WIN_ACTION};
use shared::{Action, Board, BoardError, ServerMessage};
use std::collections::VecDeque;

/// What changed after handling one server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// The session started and the replica was built.
    Started { me: usize, num_players: usize },
    /// One of our own actions was confirmed or rejected.
    Confirmed { action: Action, valid: bool },
    /// Another player acted on their own board.
    Opponent { player: usize, action: String, direction: String },
    /// Someone solved the puzzle.
    Won { player: usize },
    /// The server rejected a message we sent.
    Rejected { error: String },
    /// Nothing to show.
    Ignored,
}

#[derive(Debug, Default)]
pub struct ClientGameState {
    pub me: Option<usize>,
    pub num_players: usize,
    pub board: Option<Board>,
    pending: VecDeque<Action>,
    winners: Vec<usize>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.board.is_some()
    }

    pub fn has_won(&self) -> bool {
        self.me.map_or(false, |me| self.winners.contains(&me))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Remembers an action that has just been sent to the server.
    pub fn record_sent(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    pub fn handle(&mut self, message: ServerMessage) -> Result<Update, BoardError> {
        match message {
            ServerMessage::Start(start) => self.apply_start(start),
            ServerMessage::Result(result) => Ok(self.apply_result(result)),
            ServerMessage::Action(action) => Ok(self.apply_broadcast(action)),
            ServerMessage::Error(reply) => {
                // The rejected frame never produced a result, so forget it.
                self.pending.pop_front();
                Ok(Update::Rejected { error: reply.error })
            }
        }
    }

    fn apply_start(&mut self, start: GameStart) -> Result<Update, BoardError> {
        let board = Board::from_view(&start.board)?;
        self.me = Some(start.me);
        self.num_players = start.num_players;
        self.board = Some(board);
        self.pending.clear();
        self.winners.clear();
        Ok(Update::Started {
            me: start.me,
            num_players: start.num_players,
        })
    }

    fn apply_result(&mut self, result: ActionResult) -> Update {
        if Some(result.player) != self.me {
            debug!("Ignoring result addressed to player {}", result.player);
            return Update::Ignored;
        }
        let Some(action) = self.pending.pop_front() else {
            warn!("Received a result with no action pending");
            return Update::Ignored;
        };

        if result.move_valid {
            if let Some(board) = self.board.as_mut() {
                if !board.apply(action) {
                    warn!("Server accepted {:?} but the local board rejected it", action);
                }
            }
        }

        Update::Confirmed {
            action,
            valid: result.move_valid,
        }
    }

    fn apply_broadcast(&mut self, action: PlayerAction) -> Update {
        if action.action == WIN_ACTION {
            if !self.winners.contains(&action.player) {
                self.winners.push(action.player);
            }
            return Update::Won {
                player: action.player,
            };
        }
        Update::Opponent {
            player: action.player,
            action: action.action,
            direction: action.direction,
        }
    }
}
