//! ASCII rendering of the board and of game events

use crate::game::{ClientGameState, Update};
use shared::{Board, Tile};
use std::io::{self, Write};

/// Draws a board, one text row per grid row.
///
/// `#` wall, `P` player, `B` box, `*` box on target, `T` empty target.
/// The player standing on a target is still drawn as `P`.
pub fn render_board(board: &Board) -> String {
    let mut out = String::with_capacity(((board.width() + 1) * board.height()) as usize);
    for y in 0..board.height() {
        for x in 0..board.width() {
            let tile = board.tile(x, y);
            let glyph = if board.player().x == x && board.player().y == y {
                'P'
            } else if board.has_box(x, y) {
                if tile == Some(Tile::Target) {
                    '*'
                } else {
                    'B'
                }
            } else {
                match tile {
                    Some(Tile::Wall) => '#',
                    Some(Tile::Target) => 'T',
                    _ => ' ',
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

/// One-line description of an update, or `None` if there is nothing to say.
pub fn describe(update: &Update, me: Option<usize>) -> Option<String> {
    let line = match update {
        Update::Started { me, num_players } => {
            format!("Game started with {} players, you are player {}", num_players, me)
        }
        Update::Confirmed { valid: false, .. } => "Move not possible".to_string(),
        Update::Confirmed { valid: true, .. } => return None,
        Update::Opponent {
            player,
            action,
            direction,
        } => format!("Player {}: {} {}", player, action, direction),
        Update::Won { player } if Some(*player) == me => "You solved the puzzle!".to_string(),
        Update::Won { player } => format!("Player {} solved the puzzle", player),
        Update::Rejected { error } => format!("Server rejected message: {}", error),
        Update::Ignored => return None,
    };
    Some(line)
}

/// Writes the game to a terminal or any other sink.
pub struct Renderer<W: Write> {
    out: W,
}

impl Renderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints the update and, when our own board may have changed, the board.
    pub fn render(&mut self, state: &ClientGameState, update: &Update) -> io::Result<()> {
        if let Some(line) = describe(update, state.me) {
            writeln!(self.out, "{}", line)?;
        }

        let redraw = matches!(update, Update::Started { .. } | Update::Confirmed { .. });
        if redraw {
            if let Some(board) = &state.board {
                write!(self.out, "{}", render_board(board))?;
                writeln!(
                    self.out,
                    "Score: {}/{}",
                    board.score(),
                    board.targets().len()
                )?;
            }
        }
        self.out.flush()
    }

    pub fn message(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Action, BoardMaker, DemoLevel, Direction, ServerMessage};

    #[test]
    fn test_demo_level_rendering() {
        let board = DemoLevel.gen_board().unwrap();
        assert_eq!(
            render_board(&board),
            "######\n#    #\n#  #P#\n#  BT#\n######\n"
        );
    }

    #[test]
    fn test_box_on_target_rendering() {
        let mut board = DemoLevel.gen_board().unwrap();
        for direction in [
            Direction::Up,
            Direction::Left,
            Direction::Left,
            Direction::Down,
            Direction::Down,
            Direction::Right,
        ] {
            assert!(board.apply(Action::walk(direction)));
        }
        assert_eq!(
            render_board(&board),
            "######\n#    #\n#  # #\n#  P*#\n######\n"
        );
    }

    #[test]
    fn test_describe_updates() {
        assert_eq!(
            describe(&Update::Won { player: 0 }, Some(0)).as_deref(),
            Some("You solved the puzzle!")
        );
        assert_eq!(
            describe(&Update::Won { player: 1 }, Some(0)).as_deref(),
            Some("Player 1 solved the puzzle")
        );
        assert_eq!(describe(&Update::Ignored, Some(0)), None);
    }

    #[test]
    fn test_render_start_draws_board() {
        let mut state = ClientGameState::new();
        let view = DemoLevel.gen_board().unwrap().to_view();
        let update = state.handle(ServerMessage::start(2, 1, view)).unwrap();

        let mut renderer = Renderer::new(Vec::new());
        renderer.render(&state, &update).unwrap();
        let output = String::from_utf8(renderer.into_inner()).unwrap();

        assert!(output.starts_with("Game started with 2 players, you are player 1\n"));
        assert!(output.contains("#  BT#\n"));
        assert!(output.ends_with("Score: 0/1\n"));
    }
}
