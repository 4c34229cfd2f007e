use crate::agent::MazeDisplay;
use std::fmt::Write;

/// Largest maze the engine models; bigger reported sizes are truncated.
pub const MAX_WIDTH: usize = 16;
pub const MAX_HEIGHT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Cell { x, y }
    }
}

/// Cardinal heading. North is +y, East is +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Candidate order used everywhere a tie has to be broken deterministically.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    pub fn rotate_left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn rotate_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn reverse(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Number of clockwise quarter turns from `heading` to `self` (0..=3).
    pub fn clockwise_steps_from(self, heading: Direction) -> usize {
        (self.index() + 4 - heading.index()) % 4
    }

    /// Minimal number of 90 degree turns needed to face `self` from `heading`.
    pub fn rotation_cost(self, heading: Direction) -> usize {
        match self.clockwise_steps_from(heading) {
            0 => 0,
            2 => 2,
            _ => 1,
        }
    }

    /// Single-letter form used by the simulator protocol.
    pub fn as_char(self) -> char {
        match self {
            Direction::North => 'n',
            Direction::East => 'e',
            Direction::South => 's',
            Direction::West => 'w',
        }
    }
}

/// Caps reported maze dimensions to the modelled maximum.
pub fn clamp_dimensions(width: usize, height: usize) -> (usize, usize) {
    let mut clamped = (width, height);
    if width > MAX_WIDTH {
        tracing::warn!("Maze width {} exceeds maximum {}; truncating", width, MAX_WIDTH);
        clamped.0 = MAX_WIDTH;
    }
    if height > MAX_HEIGHT {
        tracing::warn!("Maze height {} exceeds maximum {}; truncating", height, MAX_HEIGHT);
        clamped.1 = MAX_HEIGHT;
    }
    clamped
}

/// Known wall segments of the maze.
///
/// Every edge is stored exactly once: `horizontal` holds the `height + 1` rows of
/// edges below/above each cell row, `vertical` the `width + 1` columns of edges
/// left/right of each cell column. Two adjacent cells therefore always agree on
/// the wall between them. Boundary edges are set at construction and can never
/// be cleared.
#[derive(Debug, Clone)]
pub struct WallModel {
    width: usize,
    height: usize,
    horizontal: Vec<bool>,
    vertical: Vec<bool>,
}

impl WallModel {
    pub fn new(width: usize, height: usize) -> Self {
        let mut walls = WallModel {
            width,
            height,
            horizontal: vec![false; (height + 1) * width],
            vertical: vec![false; height * (width + 1)],
        };

        for x in 0..width {
            walls.horizontal[x] = true;
            walls.horizontal[height * width + x] = true;
        }
        for y in 0..height {
            walls.vertical[y * (width + 1)] = true;
            walls.vertical[y * (width + 1) + width] = true;
        }
        walls
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn is_valid(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// The adjacent cell in `direction`, or `None` if it falls outside the maze.
    pub fn neighbor(&self, cell: Cell, direction: Direction) -> Option<Cell> {
        if !self.is_valid(cell) {
            return None;
        }
        let neighbor = match direction {
            Direction::North => Cell::new(cell.x, cell.y + 1),
            Direction::East => Cell::new(cell.x + 1, cell.y),
            Direction::South => Cell::new(cell.x, cell.y.checked_sub(1)?),
            Direction::West => Cell::new(cell.x.checked_sub(1)?, cell.y),
        };
        self.is_valid(neighbor).then_some(neighbor)
    }

    fn slot(&self, cell: Cell, direction: Direction) -> Option<usize> {
        if !self.is_valid(cell) {
            return None;
        }
        Some(match direction {
            Direction::North => (cell.y + 1) * self.width + cell.x,
            Direction::South => cell.y * self.width + cell.x,
            Direction::East => cell.y * (self.width + 1) + cell.x + 1,
            Direction::West => cell.y * (self.width + 1) + cell.x,
        })
    }

    fn edges(&self, direction: Direction) -> &[bool] {
        match direction {
            Direction::North | Direction::South => &self.horizontal,
            Direction::East | Direction::West => &self.vertical,
        }
    }

    pub fn is_boundary_edge(&self, cell: Cell, direction: Direction) -> bool {
        match direction {
            Direction::North => cell.y + 1 >= self.height,
            Direction::East => cell.x + 1 >= self.width,
            Direction::South => cell.y == 0,
            Direction::West => cell.x == 0,
        }
    }

    /// Whether a wall separates `cell` from its neighbor in `direction`.
    /// Invalid cells report a wall.
    pub fn has_wall_between(&self, cell: Cell, direction: Direction) -> bool {
        match self.slot(cell, direction) {
            Some(index) => self.edges(direction)[index],
            None => true,
        }
    }

    pub fn can_move(&self, cell: Cell, direction: Direction) -> bool {
        !self.has_wall_between(cell, direction) && self.neighbor(cell, direction).is_some()
    }

    /// Records a wall (or its absence) and mirrors the change on `display`.
    ///
    /// Returns `true` only when the stored edge actually changed. Out-of-range
    /// cells, attempts to clear a boundary edge and writes of the value already
    /// stored are ignored and emit no telemetry.
    pub fn mark_wall(
        &mut self,
        cell: Cell,
        direction: Direction,
        present: bool,
        display: &mut dyn MazeDisplay,
    ) -> bool {
        let Some(index) = self.slot(cell, direction) else {
            return false;
        };
        if !present && self.is_boundary_edge(cell, direction) {
            return false;
        }

        let edges = match direction {
            Direction::North | Direction::South => &mut self.horizontal,
            Direction::East | Direction::West => &mut self.vertical,
        };
        if edges[index] == present {
            return false;
        }
        edges[index] = present;

        if present {
            display.set_wall(cell, direction);
        } else {
            display.clear_wall(cell, direction);
        }
        true
    }

    /// ASCII picture of the known walls, north at the top.
    pub fn render(&self, marker: Option<Cell>) -> String {
        let mut out = String::new();
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let cell = Cell::new(x, y);
                let top = if self.has_wall_between(cell, Direction::North) { "---" } else { "   " };
                let _ = write!(out, "+{}", top);
            }
            out.push_str("+\n");

            for x in 0..self.width {
                let cell = Cell::new(x, y);
                let left = if self.has_wall_between(cell, Direction::West) { '|' } else { ' ' };
                let body = if Some(cell) == marker { " M " } else { "   " };
                let _ = write!(out, "{}{}", left, body);
            }
            out.push_str("|\n");
        }
        for _ in 0..self.width {
            out.push_str("+---");
        }
        out.push_str("+\n");
        out
    }
}
