//! Sources of starting boards

use crate::board::Board;
use crate::error::BoardError;
use crate::protocol::BoardView;

/// Produces the starting board for a new session.
///
/// Implementations must be deterministic enough that every call yields a
/// playable board or a construction error.
pub trait BoardMaker: Send + Sync {
    fn gen_board(&self) -> Result<Board, BoardError>;
}

/// Level described as a [`BoardView`] JSON document.
#[derive(Debug, Clone)]
pub struct JsonLevel {
    content: String,
}

impl JsonLevel {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn from_board(board: &Board) -> Result<Self, BoardError> {
        Ok(Self::new(serde_json::to_string(&board.to_view())?))
    }
}

impl BoardMaker for JsonLevel {
    fn gen_board(&self) -> Result<Board, BoardError> {
        let view: BoardView = serde_json::from_str(&self.content)?;
        Board::from_view(&view)
    }
}

/// Small built-in level with one box and one target.
///
/// ```text
/// ######
/// #    #
/// #  #P#
/// #  BT#
/// ######
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoLevel;

impl BoardMaker for DemoLevel {
    fn gen_board(&self) -> Result<Board, BoardError> {
        let mut board = Board::new(2, 6, 5)?;
        for x in 0..6 {
            board.add_wall(x, 0)?;
            board.add_wall(x, 4)?;
        }
        for y in 0..5 {
            board.add_wall(0, y)?;
            board.add_wall(5, y)?;
        }
        board.add_wall(3, 2)?;
        board.add_box(3, 3)?;
        board.add_target(4, 3)?;
        board.init_player(4, 2)?;
        Ok(board)
    }
}
