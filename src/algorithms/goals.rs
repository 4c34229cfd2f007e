use crate::grid::{Cell, WallModel};

pub const MAX_GOALS: usize = 4;

/// Up to four distinct, in-range target cells for the flood fill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalSet {
    cells: Vec<Cell>,
}

impl GoalSet {
    pub fn new() -> Self {
        GoalSet::default()
    }

    /// Replaces the goals with the valid, distinct cells of `candidates`, in order,
    /// keeping at most [`MAX_GOALS`].
    pub fn set_goals(&mut self, candidates: &[Cell], walls: &WallModel) {
        self.cells.clear();
        for &candidate in candidates {
            if self.cells.len() >= MAX_GOALS {
                break;
            }
            if walls.is_valid(candidate) && !self.cells.contains(&candidate) {
                self.cells.push(candidate);
            }
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// The one to four cells forming the geometric center of a `width` x `height` maze.
pub fn center_goals(width: usize, height: usize) -> Vec<Cell> {
    let x_low = width.saturating_sub(1) / 2;
    let x_high = width / 2;
    let y_low = height.saturating_sub(1) / 2;
    let y_high = height / 2;

    let mut goals = vec![Cell::new(x_low, y_low)];
    if x_high != x_low {
        goals.push(Cell::new(x_high, y_low));
    }
    if y_high != y_low {
        goals.push(Cell::new(x_low, y_high));
        if x_high != x_low {
            goals.push(Cell::new(x_high, y_high));
        }
    }
    goals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_goals_even_and_odd() {
        assert_eq!(
            center_goals(16, 16),
            vec![Cell::new(7, 7), Cell::new(8, 7), Cell::new(7, 8), Cell::new(8, 8)]
        );
        assert_eq!(center_goals(5, 5), vec![Cell::new(2, 2)]);
        assert_eq!(center_goals(4, 5), vec![Cell::new(1, 2), Cell::new(2, 2)]);
        assert_eq!(center_goals(5, 4), vec![Cell::new(2, 1), Cell::new(2, 2)]);
        assert_eq!(center_goals(1, 1), vec![Cell::new(0, 0)]);
        assert_eq!(
            center_goals(2, 2),
            vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(0, 1), Cell::new(1, 1)]
        );
    }

    #[test]
    fn test_set_goals_filters_and_clips() {
        let walls = WallModel::new(4, 4);
        let mut goals = GoalSet::new();
        goals.set_goals(
            &[
                Cell::new(0, 0),
                Cell::new(9, 9),
                Cell::new(0, 0),
                Cell::new(1, 1),
                Cell::new(2, 2),
                Cell::new(3, 3),
                Cell::new(3, 0),
            ],
            &walls,
        );
        assert_eq!(
            goals.cells(),
            &[Cell::new(0, 0), Cell::new(1, 1), Cell::new(2, 2), Cell::new(3, 3)]
        );
    }

    #[test]
    fn test_set_goals_resets_previous() {
        let walls = WallModel::new(4, 4);
        let mut goals = GoalSet::new();
        goals.set_goals(&[Cell::new(1, 1)], &walls);
        goals.set_goals(&[Cell::new(8, 8)], &walls);
        assert!(goals.is_empty());
    }
}
