//! Seams between the navigation engine and the robot it drives.

use crate::error::Result;
use crate::grid::{Cell, Direction};

/// Fire-and-forget drawing commands. Nothing here feeds back into navigation.
pub trait MazeDisplay {
    fn set_wall(&mut self, cell: Cell, direction: Direction);
    fn clear_wall(&mut self, cell: Cell, direction: Direction);
    fn set_text(&mut self, cell: Cell, text: &str);
    fn clear_text(&mut self, cell: Cell);
    fn set_color(&mut self, cell: Cell, color: char);
    fn clear_color(&mut self, cell: Cell);
}

/// Blocking sensing and motion requests, one in flight at a time.
///
/// Sensing is relative to the robot's current heading. Motion calls report
/// whether the robot acknowledged the action; `Err` is reserved for transport
/// failures.
pub trait Mouse: MazeDisplay {
    fn maze_width(&mut self) -> Result<usize>;
    fn maze_height(&mut self) -> Result<usize>;

    fn wall_front(&mut self) -> Result<bool>;
    fn wall_left(&mut self) -> Result<bool>;
    fn wall_right(&mut self) -> Result<bool>;

    fn move_forward(&mut self) -> Result<bool>;
    fn turn_left(&mut self) -> Result<bool>;
    fn turn_right(&mut self) -> Result<bool>;
}

/// Discards all telemetry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl MazeDisplay for NullDisplay {
    fn set_wall(&mut self, _cell: Cell, _direction: Direction) {}
    fn clear_wall(&mut self, _cell: Cell, _direction: Direction) {}
    fn set_text(&mut self, _cell: Cell, _text: &str) {}
    fn clear_text(&mut self, _cell: Cell) {}
    fn set_color(&mut self, _cell: Cell, _color: char) {}
    fn clear_color(&mut self, _cell: Cell) {}
}

/// Dead-reckoned position and heading, advanced only on acknowledged actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pose {
    pub position: Cell,
    pub heading: Direction,
}

impl Pose {
    pub fn new(position: Cell, heading: Direction) -> Self {
        Pose { position, heading }
    }

    /// Pose at the start cell facing north.
    pub fn start() -> Self {
        Pose::new(Cell::new(0, 0), Direction::North)
    }

    pub fn turn_left(&mut self) {
        self.heading = self.heading.rotate_left();
    }

    pub fn turn_right(&mut self) {
        self.heading = self.heading.rotate_right();
    }

    /// Steps one cell along the heading. Positions never go negative; a step
    /// south or west from the edge leaves the coordinate at zero.
    pub fn advance(&mut self) {
        let Cell { x, y } = self.position;
        self.position = match self.heading {
            Direction::North => Cell::new(x, y + 1),
            Direction::East => Cell::new(x + 1, y),
            Direction::South => Cell::new(x, y.saturating_sub(1)),
            Direction::West => Cell::new(x.saturating_sub(1), y),
        };
    }
}
