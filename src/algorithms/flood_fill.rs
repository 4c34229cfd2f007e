use crate::agent::MazeDisplay;
use crate::algorithms::common::CellQueue;
use crate::algorithms::goals::{center_goals, GoalSet};
use crate::error::{NavError, Result};
use crate::grid::{clamp_dimensions, Cell, Direction, WallModel};

/// Shortest known distance from every cell to the nearest goal.
///
/// `None` means the cell has not been reached under the current wall knowledge.
#[derive(Debug, Clone)]
pub struct DistanceField {
    width: usize,
    height: usize,
    distances: Vec<Option<u32>>,
}

impl DistanceField {
    pub fn new(width: usize, height: usize) -> Self {
        DistanceField {
            width,
            height,
            distances: vec![None; width * height],
        }
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        (cell.x < self.width && cell.y < self.height).then(|| cell.y * self.width + cell.x)
    }

    pub fn distance_at(&self, cell: Cell) -> Option<u32> {
        self.index(cell).and_then(|index| self.distances[index])
    }

    fn settle(&mut self, cell: Cell, distance: u32, display: &mut dyn MazeDisplay) {
        if let Some(index) = self.index(cell) {
            self.distances[index] = Some(distance);
            display.set_text(cell, &distance.to_string());
        }
    }

    fn clear(&mut self, display: &mut dyn MazeDisplay) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.distances[y * self.width + x] = None;
                display.clear_text(Cell::new(x, y));
            }
        }
    }

    /// Rebuilds every distance with a multi-source breadth-first search from
    /// `goals` through edges that have no known wall. Does nothing when
    /// `goals` is empty.
    pub fn recalculate(&mut self, walls: &WallModel, goals: &GoalSet, display: &mut dyn MazeDisplay) {
        if goals.is_empty() {
            return;
        }
        self.clear(display);

        let mut queue = CellQueue::with_capacity(walls.cell_count());
        for &goal in goals.cells() {
            if !walls.is_valid(goal) {
                continue;
            }
            self.settle(goal, 0, display);
            queue.push(goal);
        }

        while let Some(current) = queue.pop() {
            let Some(current_distance) = self.distance_at(current) else {
                continue;
            };
            for direction in Direction::ALL {
                if walls.has_wall_between(current, direction) {
                    continue;
                }
                let Some(neighbor) = walls.neighbor(current, direction) else {
                    continue;
                };
                if self.distance_at(neighbor).is_some() {
                    continue;
                }
                self.settle(neighbor, current_distance + 1, display);
                queue.push(neighbor);
            }
        }
    }
}

/// Everything the navigation engine knows about the maze: walls, goals and
/// the distance field derived from them.
#[derive(Debug, Clone)]
pub struct Floodfill {
    walls: WallModel,
    distances: DistanceField,
    goals: GoalSet,
}

impl Floodfill {
    /// Creates an empty maze model (boundary walls only) targeting the center.
    pub fn new(width: usize, height: usize, display: &mut dyn MazeDisplay) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(NavError::InvalidMaze(format!(
                "maze dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let (width, height) = clamp_dimensions(width, height);

        let mut floodfill = Floodfill {
            walls: WallModel::new(width, height),
            distances: DistanceField::new(width, height),
            goals: GoalSet::new(),
        };
        floodfill.set_goals(&center_goals(width, height), display);
        tracing::info!("Floodfill initialized for {}x{} maze", width, height);
        Ok(floodfill)
    }

    pub fn walls(&self) -> &WallModel {
        &self.walls
    }

    pub fn goals(&self) -> &GoalSet {
        &self.goals
    }

    pub fn width(&self) -> usize {
        self.walls.width()
    }

    pub fn height(&self) -> usize {
        self.walls.height()
    }

    /// Retargets the flood fill. Invalid and duplicate cells are dropped; an
    /// empty result leaves every distance unknown.
    pub fn set_goals(&mut self, candidates: &[Cell], display: &mut dyn MazeDisplay) {
        self.goals.set_goals(candidates, &self.walls);
        if self.goals.is_empty() {
            tracing::warn!("No valid goals among {} candidates", candidates.len());
            self.distances.clear(display);
            return;
        }
        self.recalculate(display);
    }

    pub fn mark_wall(
        &mut self,
        cell: Cell,
        direction: Direction,
        present: bool,
        display: &mut dyn MazeDisplay,
    ) -> bool {
        self.walls.mark_wall(cell, direction, present, display)
    }

    pub fn recalculate(&mut self, display: &mut dyn MazeDisplay) {
        self.distances.recalculate(&self.walls, &self.goals, display);
    }

    pub fn distance_at(&self, cell: Cell) -> Option<u32> {
        self.distances.distance_at(cell)
    }

    pub fn has_wall_between(&self, cell: Cell, direction: Direction) -> bool {
        self.walls.has_wall_between(cell, direction)
    }

    pub fn can_move(&self, cell: Cell, direction: Direction) -> bool {
        self.walls.can_move(cell, direction)
    }

    pub fn neighbor(&self, cell: Cell, direction: Direction) -> Option<Cell> {
        self.walls.neighbor(cell, direction)
    }
}
