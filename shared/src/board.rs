//! Deterministic Sokoban board
//!
//! A [`Board`] holds the static grid (walls and targets), the moving pieces
//! (player and boxes) and the history needed to undo moves. Every method is
//! synchronous and side-effect free outside the board itself, so the server
//! can keep one independent copy per player and mutate it from a single task.

use crate::action::{Action, ActionKind, Direction};
use crate::error::BoardError;
use crate::protocol::BoardView;

/// Grid coordinate; `(0, 0)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Static content of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tile {
    #[default]
    Floor,
    Target,
    Wall,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    tile: Tile,
    box_id: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Push {
    box_id: usize,
    from: Point,
    to: Point,
}

/// One entry of the move history.
#[derive(Debug, Clone, Copy)]
struct Step {
    player_from: Point,
    push: Option<Push>,
}

/// Playable Sokoban board with move history.
///
/// Cloning yields a fully independent copy; no state is shared between clones.
#[derive(Debug, Clone)]
pub struct Board {
    id: u32,
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    player: Point,
    boxes: Vec<Point>,
    targets: Vec<Point>,
    history: Vec<Step>,
    score: usize,
}

impl Board {
    /// Creates an empty board of the given dimensions with the player at the origin.
    pub fn new(id: u32, width: i32, height: i32) -> Result<Self, BoardError> {
        let area = match width.checked_mul(height) {
            Some(area) if width > 0 && height > 0 => area,
            _ => return Err(BoardError::InvalidDimensions { width, height }),
        };

        Ok(Self {
            id,
            width,
            height,
            cells: vec![Cell::default(); area as usize],
            player: Point::default(),
            boxes: Vec::new(),
            targets: Vec::new(),
            history: Vec::new(),
            score: 0,
        })
    }

    /// Rebuilds a board from its wire representation.
    pub fn from_view(view: &BoardView) -> Result<Self, BoardError> {
        let mut board = Board::new(view.id, view.width, view.height)?;
        for [x, y] in &view.walls {
            board.add_wall(*x, *y)?;
        }
        for [x, y] in &view.targets {
            board.add_target(*x, *y)?;
        }
        for [x, y] in &view.boxes {
            board.add_box(*x, *y)?;
        }
        board.init_player(view.player[0], view.player[1])?;
        Ok(board)
    }

    /// Exports the current positions in wire form, scanning column by column.
    pub fn to_view(&self) -> BoardView {
        let mut view = BoardView {
            id: self.id,
            width: self.width,
            height: self.height,
            player: [self.player.x, self.player.y],
            walls: Vec::new(),
            targets: Vec::new(),
            boxes: Vec::new(),
        };

        for x in 0..self.width {
            for y in 0..self.height {
                let cell = &self.cells[self.index(Point::new(x, y))];
                match cell.tile {
                    Tile::Wall => view.walls.push([x, y]),
                    Tile::Target => view.targets.push([x, y]),
                    Tile::Floor => {}
                }
                if cell.box_id.is_some() {
                    view.boxes.push([x, y]);
                }
            }
        }
        view
    }

    pub fn add_wall(&mut self, x: i32, y: i32) -> Result<(), BoardError> {
        let idx = self.checked_index(x, y)?;
        if self.cells[idx].box_id.is_some() {
            return Err(BoardError::Occupied { x, y });
        }
        if self.cells[idx].tile == Tile::Target {
            self.targets.retain(|t| *t != Point::new(x, y));
        }
        self.cells[idx].tile = Tile::Wall;
        Ok(())
    }

    pub fn add_target(&mut self, x: i32, y: i32) -> Result<(), BoardError> {
        let idx = self.checked_index(x, y)?;
        match self.cells[idx].tile {
            Tile::Target => return Ok(()),
            Tile::Wall => return Err(BoardError::Occupied { x, y }),
            Tile::Floor => {}
        }
        self.cells[idx].tile = Tile::Target;
        self.targets.push(Point::new(x, y));
        if self.cells[idx].box_id.is_some() {
            self.score += 1;
        }
        Ok(())
    }

    pub fn add_box(&mut self, x: i32, y: i32) -> Result<(), BoardError> {
        let idx = self.checked_index(x, y)?;
        let cell = &mut self.cells[idx];
        if cell.tile == Tile::Wall || cell.box_id.is_some() {
            return Err(BoardError::Occupied { x, y });
        }
        cell.box_id = Some(self.boxes.len());
        if cell.tile == Tile::Target {
            self.score += 1;
        }
        self.boxes.push(Point::new(x, y));
        Ok(())
    }

    /// Places the player at its starting position.
    pub fn init_player(&mut self, x: i32, y: i32) -> Result<(), BoardError> {
        let idx = self.checked_index(x, y)?;
        let cell = &self.cells[idx];
        if cell.tile == Tile::Wall || cell.box_id.is_some() {
            return Err(BoardError::Occupied { x, y });
        }
        self.player = Point::new(x, y);
        Ok(())
    }

    /// Walks the player one cell, pushing a box if one is in the way.
    ///
    /// Returns false, leaving the board untouched, when the player would hit a
    /// wall or the board edge, or when the box cannot be pushed.
    pub fn apply_move(&mut self, direction: Direction) -> bool {
        let next = self.player.step(direction);
        if !self.is_open(next) {
            return false;
        }

        let next_idx = self.index(next);
        let push = match self.cells[next_idx].box_id {
            Some(box_id) => {
                let beyond = next.step(direction);
                if !self.is_open(beyond) || self.cells[self.index(beyond)].box_id.is_some() {
                    return false;
                }
                let push = Push {
                    box_id,
                    from: next,
                    to: beyond,
                };
                self.move_box(push.box_id, push.from, push.to);
                Some(push)
            }
            None => None,
        };

        self.history.push(Step {
            player_from: self.player,
            push,
        });
        self.player = next;
        true
    }

    /// Dispatches a player action. Reset always succeeds and `Invalid` never does.
    pub fn apply(&mut self, action: Action) -> bool {
        match action.kind {
            ActionKind::Move => action
                .direction
                .map_or(false, |direction| self.apply_move(direction)),
            ActionKind::Undo => self.undo(),
            ActionKind::Reset => {
                self.reset();
                true
            }
            ActionKind::Invalid => false,
        }
    }

    /// Reverts the most recent move, restoring player, box and score.
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(step) = self.history.pop() else {
            return false;
        };

        if let Some(push) = step.push {
            self.move_box(push.box_id, push.to, push.from);
        }
        self.player = step.player_from;
        true
    }

    /// Undoes every move, returning the board to its starting position.
    pub fn reset(&mut self) {
        while self.undo() {}
    }

    /// Number of boxes currently resting on targets.
    pub fn score(&self) -> usize {
        self.score
    }

    /// True once every target is covered and there is at least one target.
    pub fn won(&self) -> bool {
        self.score > 0 && self.score == self.targets.len()
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn player(&self) -> Point {
        self.player
    }

    pub fn boxes(&self) -> &[Point] {
        &self.boxes
    }

    pub fn targets(&self) -> &[Point] {
        &self.targets
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<Tile> {
        self.checked_index(x, y).ok().map(|idx| self.cells[idx].tile)
    }

    pub fn has_box(&self, x: i32, y: i32) -> bool {
        self.checked_index(x, y)
            .map(|idx| self.cells[idx].box_id.is_some())
            .unwrap_or(false)
    }

    fn move_box(&mut self, box_id: usize, from: Point, to: Point) {
        let from_idx = self.index(from);
        let to_idx = self.index(to);

        self.cells[from_idx].box_id = None;
        if self.cells[from_idx].tile == Tile::Target {
            self.score -= 1;
        }

        self.cells[to_idx].box_id = Some(box_id);
        if self.cells[to_idx].tile == Tile::Target {
            self.score += 1;
        }

        self.boxes[box_id] = to;
    }

    fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    fn is_open(&self, p: Point) -> bool {
        self.in_bounds(p) && self.cells[self.index(p)].tile != Tile::Wall
    }

    // Caller guarantees `p` is in bounds.
    fn index(&self, p: Point) -> usize {
        (p.y * self.width + p.x) as usize
    }

    fn checked_index(&self, x: i32, y: i32) -> Result<usize, BoardError> {
        let p = Point::new(x, y);
        if self.in_bounds(p) {
            Ok(self.index(p))
        } else {
            Err(BoardError::OutOfBounds { x, y })
        }
    }
}
