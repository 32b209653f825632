//! Turn-processing loop for a single session
//!
//! The loop is deliberately synchronous: it pulls one request at a time from a
//! [`Controller`], applies it to the acting player's board and reports the
//! outcome. All board mutation for a session therefore happens on one thread,
//! in the order the controller hands requests out.

use log::debug;
use shared::{Action, Board, BoardError, BoardMaker};

/// Request/result contract between the session loop and its players.
///
/// Implementations may block inside [`Controller::recv_input`]; the loop is
/// run on a thread where that is allowed.
pub trait Controller {
    /// Announces the starting board to every player.
    fn init(&mut self, board: &Board);

    /// Waits for the next `(player, action)`. `None` means no further input
    /// can ever arrive and the session should stop.
    fn recv_input(&mut self) -> Option<(usize, Action)>;

    /// Reports the outcome of `action` taken by `player`.
    fn send_result(&mut self, player: usize, success: bool, action: Action);

    /// Called after every result with the acting player's board.
    fn output_board(&mut self, player: usize, board: &Board);

    /// True once the session has nobody left to play for.
    fn closing(&self) -> bool;
}

/// One board per player, all cloned from the same starting position.
#[derive(Debug, Clone)]
pub struct Game {
    boards: Vec<Board>,
}

impl Game {
    pub fn new(num_players: usize, maker: &dyn BoardMaker) -> Result<Self, BoardError> {
        let board = maker.gen_board()?;
        Ok(Self {
            boards: vec![board; num_players],
        })
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    /// Runs the session until the controller reports closing.
    /// Returns the number of turns processed.
    pub fn play<C: Controller + ?Sized>(&mut self, controller: &mut C) -> usize {
        if let Some(first) = self.boards.first() {
            controller.init(first);
        }

        let mut turns = 0;
        while !controller.closing() {
            let Some((player, action)) = controller.recv_input() else {
                break;
            };
            let Some(board) = self.boards.get_mut(player) else {
                debug!("Ignoring action from unknown player {}", player);
                continue;
            };

            let success = board.apply(action);
            controller.send_result(player, success, action);
            controller.output_board(player, board);
            turns += 1;
        }
        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{DemoLevel, Direction, Point};
    use std::collections::VecDeque;

    /// Feeds a fixed script of actions and checks the call protocol.
    #[derive(Default)]
    struct ScriptedController {
        script: VecDeque<(usize, Action)>,
        init_calls: usize,
        recv_calls: usize,
        results: Vec<(usize, bool)>,
        output_calls: usize,
        winners: Vec<usize>,
        stop_after_first_win: bool,
    }

    impl ScriptedController {
        fn new(script: Vec<(usize, Action)>) -> Self {
            Self {
                script: script.into(),
                ..Self::default()
            }
        }
    }

    impl Controller for ScriptedController {
        fn init(&mut self, board: &Board) {
            self.init_calls += 1;
            assert!(!board.won(), "starting board must not be won");
        }

        fn recv_input(&mut self) -> Option<(usize, Action)> {
            let next = self.script.pop_front();
            if next.is_some() {
                self.recv_calls += 1;
            }
            next
        }

        fn send_result(&mut self, player: usize, success: bool, _action: Action) {
            self.results.push((player, success));
            assert_eq!(self.results.len(), self.recv_calls);
        }

        fn output_board(&mut self, player: usize, board: &Board) {
            self.output_calls += 1;
            assert_eq!(self.output_calls, self.results.len());
            if board.won() && !self.winners.contains(&player) {
                self.winners.push(player);
            }
        }

        fn closing(&self) -> bool {
            self.stop_after_first_win && !self.winners.is_empty()
        }
    }

    fn walk(player: usize, directions: &[Direction]) -> Vec<(usize, Action)> {
        directions
            .iter()
            .map(|d| (player, Action::walk(*d)))
            .collect()
    }

    const WINNING_ROUTE: [Direction; 6] = [
        Direction::Up,
        Direction::Left,
        Direction::Left,
        Direction::Down,
        Direction::Down,
        Direction::Right,
    ];

    #[test]
    fn test_winning_session() {
        let mut game = Game::new(1, &DemoLevel).unwrap();
        let mut controller = ScriptedController::new(walk(0, &WINNING_ROUTE));

        let turns = game.play(&mut controller);

        assert_eq!(turns, 6);
        assert_eq!(controller.init_calls, 1);
        assert!(controller.results.iter().all(|(_, ok)| *ok));
        assert_eq!(controller.winners, vec![0]);
    }

    #[test]
    fn test_closing_stops_the_loop() {
        let mut game = Game::new(1, &DemoLevel).unwrap();
        let mut script = walk(0, &WINNING_ROUTE);
        script.push((0, Action::undo()));
        let mut controller = ScriptedController::new(script);
        controller.stop_after_first_win = true;

        game.play(&mut controller);

        assert_eq!(controller.recv_calls, 6);
        assert_eq!(controller.script.len(), 1);
        assert!(game.boards()[0].won());
    }

    #[test]
    fn test_players_have_independent_boards() {
        let mut game = Game::new(2, &DemoLevel).unwrap();
        let mut controller = ScriptedController::new(walk(1, &[Direction::Up, Direction::Left]));

        game.play(&mut controller);

        assert_eq!(game.boards()[0].player(), Point::new(4, 2));
        assert_eq!(game.boards()[1].player(), Point::new(3, 1));
        assert_eq!(controller.results, vec![(1, true), (1, true)]);
    }

    #[test]
    fn test_out_of_range_player_is_ignored() {
        let mut game = Game::new(2, &DemoLevel).unwrap();
        let mut controller = ScriptedController::new(vec![
            (7, Action::walk(Direction::Up)),
            (0, Action::walk(Direction::Up)),
        ]);

        let turns = game.play(&mut controller);

        assert_eq!(turns, 1);
        assert_eq!(controller.results, vec![(0, true)]);
    }

    #[test]
    fn test_action_outcomes() {
        let mut game = Game::new(1, &DemoLevel).unwrap();
        let mut controller = ScriptedController::new(vec![
            (0, Action::walk(Direction::Right)),
            (0, Action::undo()),
            (0, Action::walk(Direction::Up)),
            (0, Action::from_wire("move", None)),
            (0, Action::invalid()),
            (0, Action::reset()),
            (0, Action::reset()),
            (0, Action::undo()),
        ]);

        game.play(&mut controller);

        let outcomes: Vec<bool> = controller.results.iter().map(|(_, ok)| *ok).collect();
        assert_eq!(
            outcomes,
            vec![false, false, true, false, false, true, true, false]
        );
        assert_eq!(game.boards()[0].player(), Point::new(4, 2));
    }

    #[test]
    fn test_construction_error_is_reported() {
        struct Broken;
        impl BoardMaker for Broken {
            fn gen_board(&self) -> Result<Board, BoardError> {
                Board::new(0, 0, 0)
            }
        }

        assert!(matches!(
            Game::new(2, &Broken),
            Err(BoardError::InvalidDimensions { .. })
        ));
    }
}
