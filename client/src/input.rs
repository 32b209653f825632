//! Keyboard commands read from stdin

use shared::{Action, Direction};

/// What the player asked for on one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send this action to the server.
    Play(Action),
    /// Leave the game.
    Quit,
}

/// Translates lines typed by the player into commands.
///
/// Every character of the line is a key, so `wwa` walks up twice and then left.
#[derive(Debug, Default)]
pub struct InputManager {
    sent: u64,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_line(&mut self, line: &str) -> Vec<Command> {
        let mut commands = Vec::new();
        for key in line.chars().filter(|c| !c.is_whitespace()) {
            match parse_key(key) {
                Some(Command::Quit) => {
                    commands.push(Command::Quit);
                    break;
                }
                Some(command) => commands.push(command),
                None => log::warn!("Unknown key '{}'", key),
            }
        }
        self.sent += commands
            .iter()
            .filter(|c| matches!(c, Command::Play(_)))
            .count() as u64;
        commands
    }

    /// Number of actions produced so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

fn parse_key(key: char) -> Option<Command> {
    let command = match key.to_ascii_lowercase() {
        'w' => Command::Play(Action::walk(Direction::Up)),
        'a' => Command::Play(Action::walk(Direction::Left)),
        's' => Command::Play(Action::walk(Direction::Down)),
        'd' => Command::Play(Action::walk(Direction::Right)),
        'u' => Command::Play(Action::undo()),
        'r' => Command::Play(Action::reset()),
        'q' => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// Help line shown at startup.
pub const CONTROLS: &str = "Controls: w/a/s/d to move, u to undo, r to reset, q to quit (press Enter to send)";
