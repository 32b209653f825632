//! Player actions and movement directions

use serde::{Deserialize, Serialize};

/// Direction in which a player attempts to walk or push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Grid delta `(dx, dy)`; y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Parses the lowercase name clients send.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Lowercase name used in client messages.
    pub fn wire_name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Capitalised name used in broadcasts to other players.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
        }
    }
}

/// What a player asked the board to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Move,
    Undo,
    Reset,
    /// Unrecognised request or a disconnect notice; never succeeds.
    Invalid,
}

impl ActionKind {
    pub fn wire_name(self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Undo => "undo",
            ActionKind::Reset => "reset",
            ActionKind::Invalid => "invalid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Move => "Move",
            ActionKind::Undo => "Undo",
            ActionKind::Reset => "Reset",
            ActionKind::Invalid => "?",
        }
    }
}

/// A single turn submitted by a player.
///
/// `direction` only matters for [`ActionKind::Move`]; a move without a
/// recognised direction always fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    pub kind: ActionKind,
    pub direction: Option<Direction>,
}

impl Action {
    pub fn walk(direction: Direction) -> Self {
        Self {
            kind: ActionKind::Move,
            direction: Some(direction),
        }
    }

    pub fn undo() -> Self {
        Self {
            kind: ActionKind::Undo,
            direction: None,
        }
    }

    pub fn reset() -> Self {
        Self {
            kind: ActionKind::Reset,
            direction: None,
        }
    }

    pub fn invalid() -> Self {
        Self {
            kind: ActionKind::Invalid,
            direction: None,
        }
    }

    /// Builds an action from the `action` / `direction` fields of a client message.
    pub fn from_wire(action: &str, direction: Option<&str>) -> Self {
        match action {
            "move" => Self {
                kind: ActionKind::Move,
                direction: direction.and_then(Direction::from_wire),
            },
            "undo" => Self::undo(),
            "reset" => Self::reset(),
            _ => Self::invalid(),
        }
    }

    pub fn direction_label(&self) -> &'static str {
        self.direction.map_or("?", Direction::label)
    }
}
