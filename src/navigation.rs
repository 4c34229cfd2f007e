//! Exploration state machine and fast-run planning.
//!
//! The controller runs a strictly sequential loop: sense the three walls around
//! the robot, rebuild the flood fill, check whether the current leg of the run
//! is finished, pick a neighbor and drive to it. Once the robot has been to the
//! center and back, the final wall map is used to plan a fast path that is
//! replayed without further sensing.

use crate::agent::{Mouse, Pose};
use crate::algorithms::flood_fill::Floodfill;
use crate::algorithms::goals::center_goals;
use crate::error::{NavError, Result};
use crate::grid::{Cell, Direction};
use crate::statistics::RunStatistics;

pub const START_CELL: Cell = Cell::new(0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    ToCenter,
    ToStart,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The robot advanced one cell.
    Moved,
    /// The chosen edge turned out to be walled before moving.
    Blocked,
    /// A turn was not acknowledged; the step ends and the next one re-senses.
    TurnFailed,
    /// The robot did not acknowledge the move; the edge is now marked as a wall.
    MoveFailed,
    /// Exploration is over.
    Finished,
}

/// Picks the next heading from `current`.
///
/// Only passable neighbors with a known distance are considered. Neighbors
/// strictly closer to the goal than `current` win; if there are none the best
/// known neighbor is taken instead. Within a tier the smallest distance wins,
/// then the fewest quarter turns from `heading`, then north/east/south/west order.
pub fn choose_next_direction(
    floodfill: &Floodfill,
    current: Cell,
    heading: Direction,
) -> Option<Direction> {
    let own_distance = floodfill.distance_at(current);
    let candidates: Vec<(Direction, u32, usize)> = Direction::ALL
        .iter()
        .copied()
        .filter(|&direction| floodfill.can_move(current, direction))
        .filter_map(|direction| {
            let neighbor = floodfill.neighbor(current, direction)?;
            let distance = floodfill.distance_at(neighbor)?;
            Some((direction, distance, direction.rotation_cost(heading)))
        })
        .collect();

    let descending = candidates
        .iter()
        .filter(|(_, distance, _)| own_distance.is_some_and(|own| *distance < own));
    best_of(descending).or_else(|| best_of(candidates.iter()))
}

fn best_of<'a>(tier: impl Iterator<Item = &'a (Direction, u32, usize)>) -> Option<Direction> {
    tier.min_by_key(|(_, distance, rotation)| (*distance, *rotation))
        .map(|(direction, _, _)| *direction)
}

/// Walks downhill through the distance field from `start` until a goal cell is
/// reached, preferring the fewest turns at each step.
///
/// Returns `None` when the walk gets stuck (no strictly closer passable
/// neighbor) or would take more steps than there are cells.
pub fn synthesize_fast_path(
    floodfill: &Floodfill,
    start: Cell,
    heading: Direction,
) -> Option<Vec<Direction>> {
    let max_length = floodfill.walls().cell_count();
    let mut path = Vec::new();
    let mut current = start;
    let mut heading = heading;

    while !floodfill.goals().contains(current) {
        if path.len() >= max_length {
            tracing::warn!("Fast path aborted: exceeded {} steps", max_length);
            return None;
        }
        let Some(current_distance) = floodfill.distance_at(current) else {
            tracing::warn!("Fast path aborted: ({}, {}) has no distance", current.x, current.y);
            return None;
        };

        let next = Direction::ALL
            .iter()
            .copied()
            .filter(|&direction| floodfill.can_move(current, direction))
            .filter(|&direction| {
                floodfill
                    .neighbor(current, direction)
                    .and_then(|neighbor| floodfill.distance_at(neighbor))
                    .is_some_and(|distance| distance < current_distance)
            })
            .min_by_key(|direction| direction.rotation_cost(heading));

        let Some(direction) = next else {
            tracing::warn!(
                "Fast path aborted: no descending neighbor at ({}, {})",
                current.x,
                current.y
            );
            return None;
        };
        path.push(direction);
        heading = direction;
        current = floodfill.neighbor(current, direction)?;
    }

    Some(path)
}

/// Drives a [`Mouse`] from the start cell to the center, back to the start, and
/// then along the fastest known route.
pub struct NavigationController<M: Mouse> {
    mouse: M,
    floodfill: Floodfill,
    center_goals: Vec<Cell>,
    phase: NavigationPhase,
    pose: Pose,
    stats: RunStatistics,
    max_steps: Option<usize>,
}

impl<M: Mouse> NavigationController<M> {
    /// Queries the maze size and builds an empty model targeting the center.
    /// The robot is assumed to sit on the start cell facing north.
    pub fn new(mut mouse: M) -> Result<Self> {
        let width = mouse.maze_width()?;
        let height = mouse.maze_height()?;
        let floodfill = Floodfill::new(width, height, &mut mouse)?;
        let center_goals = center_goals(floodfill.width(), floodfill.height());

        Ok(NavigationController {
            mouse,
            floodfill,
            center_goals,
            phase: NavigationPhase::ToCenter,
            pose: Pose::start(),
            stats: RunStatistics::new(),
            max_steps: None,
        })
    }

    /// Caps the number of exploration steps. Unlimited by default.
    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn phase(&self) -> NavigationPhase {
        self.phase
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn floodfill(&self) -> &Floodfill {
        &self.floodfill
    }

    pub fn center_goals(&self) -> &[Cell] {
        &self.center_goals
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn mouse(&self) -> &M {
        &self.mouse
    }

    pub fn mouse_mut(&mut self) -> &mut M {
        &mut self.mouse
    }

    pub fn into_mouse(self) -> M {
        self.mouse
    }

    /// Full mission: explore, then replay the best path to the center.
    pub fn run(&mut self) -> Result<RunStatistics> {
        tracing::info!("Running...");
        self.mouse.set_color(START_CELL, 'G');
        self.explore()?;
        self.fast_run()?;
        Ok(self.stats.clone())
    }

    /// Repeats [`step`](Self::step) until the robot is back on the start cell.
    pub fn explore(&mut self) -> Result<()> {
        let mut steps = 0;
        loop {
            if let Some(limit) = self.max_steps {
                if steps >= limit {
                    return Err(NavError::StepLimit(limit));
                }
            }
            if self.step()? == StepOutcome::Finished {
                tracing::info!(
                    "Exploration finished after {} steps ({} moves)",
                    self.stats.exploration_steps,
                    self.stats.exploration_moves
                );
                return Ok(());
            }
            steps += 1;
        }
    }

    /// One sense, plan and act iteration.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if self.phase == NavigationPhase::Done {
            return Ok(StepOutcome::Finished);
        }

        self.sense_walls_and_flood()?;
        let current = self.pose.position;
        self.update_phase(current);
        if self.phase == NavigationPhase::Done {
            return Ok(StepOutcome::Finished);
        }
        self.stats.exploration_steps += 1;

        let target = choose_next_direction(&self.floodfill, current, self.pose.heading)
            .ok_or(NavError::NoRoute { cell: current })?;
        if !self.rotate_to(target)? {
            return Ok(StepOutcome::TurnFailed);
        }

        if !self.floodfill.can_move(current, target) {
            self.floodfill.mark_wall(current, target, true, &mut self.mouse);
            self.stats.blocked_moves += 1;
            return Ok(StepOutcome::Blocked);
        }

        if !self.mouse.move_forward()? {
            tracing::warn!(
                "Move {:?} from ({}, {}) failed; marking wall",
                target,
                current.x,
                current.y
            );
            self.floodfill.mark_wall(current, target, true, &mut self.mouse);
            self.stats.failed_moves += 1;
            return Ok(StepOutcome::MoveFailed);
        }

        self.pose.advance();
        self.stats.exploration_moves += 1;
        tracing::debug!("Moved to ({}, {})", self.pose.position.x, self.pose.position.y);

        // The edge just crossed is open by definition.
        let behind = self.pose.heading.reverse();
        self.floodfill
            .mark_wall(self.pose.position, behind, false, &mut self.mouse);
        Ok(StepOutcome::Moved)
    }

    fn sense_walls_and_flood(&mut self) -> Result<()> {
        let current = self.pose.position;
        let heading = self.pose.heading;

        let front = self.mouse.wall_front()?;
        let left = self.mouse.wall_left()?;
        let right = self.mouse.wall_right()?;

        self.floodfill.mark_wall(current, heading, front, &mut self.mouse);
        self.floodfill
            .mark_wall(current, heading.rotate_left(), left, &mut self.mouse);
        self.floodfill
            .mark_wall(current, heading.rotate_right(), right, &mut self.mouse);

        self.floodfill.recalculate(&mut self.mouse);
        Ok(())
    }

    /// Advances the phase for the robot standing on `current`.
    pub fn update_phase(&mut self, current: Cell) {
        if self.phase == NavigationPhase::ToCenter && self.center_goals.contains(&current) {
            tracing::info!("Reached center at ({}, {}); targeting start", current.x, current.y);
            self.floodfill.set_goals(&[START_CELL], &mut self.mouse);
            self.phase = NavigationPhase::ToStart;
        }
        if self.phase == NavigationPhase::ToStart && current == START_CELL {
            tracing::info!("Returned to start; exploration complete");
            self.phase = NavigationPhase::Done;
        }
    }

    /// Turns in place until facing `target`, one acknowledged quarter turn at a
    /// time. Gives up at the first turn that is not acknowledged and returns
    /// `false`; the heading then reflects only the turns that went through.
    fn rotate_to(&mut self, target: Direction) -> Result<bool> {
        while self.pose.heading != target {
            let acknowledged = match target.clockwise_steps_from(self.pose.heading) {
                1 => self.turn_right()?,
                _ => self.turn_left()?,
            };
            if !acknowledged {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn turn_left(&mut self) -> Result<bool> {
        self.stats.turns += 1;
        if !self.mouse.turn_left()? {
            self.stats.failed_turns += 1;
            tracing::warn!("Left turn not acknowledged");
            return Ok(false);
        }
        self.pose.turn_left();
        tracing::trace!("Turned left; heading {:?}", self.pose.heading);
        Ok(true)
    }

    fn turn_right(&mut self) -> Result<bool> {
        self.stats.turns += 1;
        if !self.mouse.turn_right()? {
            self.stats.failed_turns += 1;
            tracing::warn!("Right turn not acknowledged");
            return Ok(false);
        }
        self.pose.turn_right();
        tracing::trace!("Turned right; heading {:?}", self.pose.heading);
        Ok(true)
    }

    /// Retargets the center and plans a path from the start cell using
    /// everything learned during exploration.
    pub fn build_fast_path(&mut self) -> Option<Vec<Direction>> {
        let center = self.center_goals.clone();
        self.floodfill.set_goals(&center, &mut self.mouse);

        let path = synthesize_fast_path(&self.floodfill, START_CELL, self.pose.heading)?;
        tracing::info!("Fast path length: {}", path.len());
        self.stats.fast_path_length = Some(path.len());
        Some(path)
    }

    /// Replays `path` open-loop. Returns `false` if a turn or move was refused,
    /// in which case the rest of the path is abandoned.
    pub fn execute_fast_run(&mut self, path: &[Direction]) -> Result<bool> {
        for &direction in path {
            if !self.rotate_to(direction)? {
                tracing::warn!(
                    "Fast run halted at ({}, {}): turn failed",
                    self.pose.position.x,
                    self.pose.position.y
                );
                return Ok(false);
            }
            if !self.mouse.move_forward()? {
                tracing::warn!(
                    "Fast run halted at ({}, {}): move failed",
                    self.pose.position.x,
                    self.pose.position.y
                );
                return Ok(false);
            }
            self.pose.advance();
            self.stats.fast_run_moves += 1;
        }
        tracing::info!("Fast run complete");
        self.stats.fast_run_completed = true;
        Ok(true)
    }

    /// Plans and replays the fast path. Planning failures are logged and
    /// reported as `false`; they do not fail the mission.
    pub fn fast_run(&mut self) -> Result<bool> {
        tracing::info!("Starting fast run toward center");
        match self.build_fast_path() {
            Some(path) => self.execute_fast_run(&path),
            None => {
                tracing::warn!("Fast run aborted: unable to build path");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::NullDisplay;
    use crate::grid::WallModel;
    use crate::simulation::{MazeLayout, SimulatedMouse};

    fn corridor_floodfill() -> Floodfill {
        // 3x1 corridor, goal on the east end.
        let mut floodfill = Floodfill::new(3, 1, &mut NullDisplay).unwrap();
        floodfill.set_goals(&[Cell::new(2, 0)], &mut NullDisplay);
        floodfill
    }

    #[test]
    fn test_corridor_has_single_choice() {
        let floodfill = corridor_floodfill();
        for heading in Direction::ALL {
            assert_eq!(
                choose_next_direction(&floodfill, Cell::new(0, 0), heading),
                Some(Direction::East)
            );
        }
    }

    #[test]
    fn test_dead_end_turns_around() {
        // Facing north at the top of a vertical corridor; the only way out is behind.
        let mut floodfill = Floodfill::new(1, 4, &mut NullDisplay).unwrap();
        floodfill.set_goals(&[Cell::new(0, 0)], &mut NullDisplay);
        assert_eq!(
            choose_next_direction(&floodfill, Cell::new(0, 3), Direction::North),
            Some(Direction::South)
        );
    }

    #[test]
    fn test_descending_tie_prefers_fewer_turns() {
        let mut floodfill = Floodfill::new(3, 3, &mut NullDisplay).unwrap();
        floodfill.set_goals(&[Cell::new(1, 1)], &mut NullDisplay);
        // From (0, 0) both north and east descend to distance 1.
        assert_eq!(
            choose_next_direction(&floodfill, Cell::new(0, 0), Direction::East),
            Some(Direction::East)
        );
        assert_eq!(
            choose_next_direction(&floodfill, Cell::new(0, 0), Direction::North),
            Some(Direction::North)
        );
        assert_eq!(
            choose_next_direction(&floodfill, Cell::new(0, 0), Direction::South),
            Some(Direction::East)
        );
        assert_eq!(
            choose_next_direction(&floodfill, Cell::new(0, 0), Direction::West),
            Some(Direction::North)
        );
    }

    #[test]
    fn test_goal_cell_falls_back_to_nearest_neighbor() {
        let mut floodfill = Floodfill::new(3, 1, &mut NullDisplay).unwrap();
        floodfill.set_goals(&[Cell::new(1, 0)], &mut NullDisplay);
        // Nothing descends from a goal; the cheapest known neighbor is taken.
        assert_eq!(
            choose_next_direction(&floodfill, Cell::new(1, 0), Direction::West),
            Some(Direction::West)
        );
        assert_eq!(
            choose_next_direction(&floodfill, Cell::new(1, 0), Direction::North),
            Some(Direction::East)
        );
    }

    #[test]
    fn test_unreachable_cell_has_no_choice() {
        let mut floodfill = Floodfill::new(3, 1, &mut NullDisplay).unwrap();
        floodfill.set_goals(&[Cell::new(2, 0)], &mut NullDisplay);
        // Wall off the goal: nothing is known west of it any more.
        floodfill.mark_wall(Cell::new(1, 0), Direction::East, true, &mut NullDisplay);
        floodfill.recalculate(&mut NullDisplay);
        assert_eq!(choose_next_direction(&floodfill, Cell::new(0, 0), Direction::East), None);
    }

    #[test]
    fn test_fast_path_on_open_two_by_two() {
        let mut floodfill = Floodfill::new(2, 2, &mut NullDisplay).unwrap();
        floodfill.set_goals(&[Cell::new(1, 1)], &mut NullDisplay);

        let path = synthesize_fast_path(&floodfill, START_CELL, Direction::North).unwrap();
        assert_eq!(path, vec![Direction::North, Direction::East]);

        let mut cell = START_CELL;
        let mut last = floodfill.distance_at(cell).unwrap();
        for direction in path {
            cell = floodfill.neighbor(cell, direction).unwrap();
            let distance = floodfill.distance_at(cell).unwrap();
            assert!(distance < last);
            last = distance;
        }
        assert_eq!(cell, Cell::new(1, 1));
    }

    #[test]
    fn test_fast_path_fails_without_descent() {
        let mut floodfill = Floodfill::new(2, 1, &mut NullDisplay).unwrap();
        floodfill.set_goals(&[Cell::new(1, 0)], &mut NullDisplay);
        floodfill.mark_wall(START_CELL, Direction::East, true, &mut NullDisplay);
        floodfill.recalculate(&mut NullDisplay);
        assert!(synthesize_fast_path(&floodfill, START_CELL, Direction::North).is_none());
    }

    #[test]
    fn test_phase_transitions_are_monotonic() {
        let mouse = SimulatedMouse::new(MazeLayout::open(4, 4));
        let mut controller = NavigationController::new(mouse).unwrap();
        assert_eq!(controller.phase(), NavigationPhase::ToCenter);

        controller.update_phase(START_CELL);
        assert_eq!(controller.phase(), NavigationPhase::ToCenter);

        controller.update_phase(Cell::new(2, 2));
        assert_eq!(controller.phase(), NavigationPhase::ToStart);
        assert_eq!(controller.floodfill().goals().cells(), &[START_CELL]);

        controller.update_phase(Cell::new(1, 1));
        assert_eq!(controller.phase(), NavigationPhase::ToStart);

        controller.update_phase(START_CELL);
        assert_eq!(controller.phase(), NavigationPhase::Done);

        for cell in [Cell::new(1, 1), START_CELL, Cell::new(3, 3)] {
            controller.update_phase(cell);
            assert_eq!(controller.phase(), NavigationPhase::Done);
        }
        assert_eq!(controller.step().unwrap(), StepOutcome::Finished);
    }

    #[test]
    fn test_single_cell_maze_finishes_immediately() {
        let mouse = SimulatedMouse::new(MazeLayout::open(1, 1));
        let mut controller = NavigationController::new(mouse).unwrap();
        assert_eq!(controller.step().unwrap(), StepOutcome::Finished);
        assert_eq!(controller.phase(), NavigationPhase::Done);
    }

    #[test]
    fn test_step_senses_and_moves() {
        let mouse = SimulatedMouse::new(MazeLayout::open(4, 4));
        let mut controller = NavigationController::new(mouse).unwrap();
        assert_eq!(controller.step().unwrap(), StepOutcome::Moved);
        assert_eq!(controller.pose().position, Cell::new(0, 1));
        assert_eq!(controller.mouse().pose(), controller.pose());
    }

    #[test]
    fn test_failed_move_marks_wall_and_retries() {
        let mut mouse = SimulatedMouse::new(MazeLayout::open(4, 4));
        mouse.fail_next_moves(1);
        let mut controller = NavigationController::new(mouse).unwrap();

        assert_eq!(controller.step().unwrap(), StepOutcome::MoveFailed);
        assert_eq!(controller.pose().position, START_CELL);
        assert!(controller
            .floodfill()
            .has_wall_between(START_CELL, Direction::North));

        // Re-sensing clears the phantom wall in front and the move goes through.
        assert_eq!(controller.step().unwrap(), StepOutcome::Moved);
        assert_eq!(controller.stats().failed_moves, 1);
    }

    #[test]
    fn test_failed_turn_ends_the_step() {
        let mut mouse = SimulatedMouse::new(MazeLayout::open(3, 1));
        mouse.fail_next_turns(1);
        let mut controller = NavigationController::new(mouse).unwrap();

        // Facing north in an east-west corridor: the first turn is refused.
        assert_eq!(controller.step().unwrap(), StepOutcome::TurnFailed);
        assert_eq!(controller.pose(), Pose::start());
        assert_eq!(controller.stats().failed_turns, 1);

        assert_eq!(controller.step().unwrap(), StepOutcome::Moved);
        assert_eq!(controller.pose().position, Cell::new(1, 0));
        assert_eq!(controller.mouse().pose(), controller.pose());
    }

    #[test]
    fn test_fast_run_abandons_on_failed_turn() {
        let mut mouse = SimulatedMouse::new(MazeLayout::open(2, 2));
        mouse.fail_next_turns(1);
        let mut controller = NavigationController::new(mouse).unwrap();

        let completed = controller
            .execute_fast_run(&[Direction::East, Direction::North])
            .unwrap();
        assert!(!completed);
        assert_eq!(controller.stats().fast_run_moves, 0);
        assert!(!controller.stats().fast_run_completed);
    }

    #[test]
    fn test_no_goals_leaves_no_choice() {
        let mut floodfill = Floodfill::new(4, 4, &mut NullDisplay).unwrap();
        floodfill.set_goals(&[Cell::new(7, 7)], &mut NullDisplay);
        assert_eq!(choose_next_direction(&floodfill, START_CELL, Direction::North), None);
    }

    #[test]
    fn test_enclosed_start_reports_no_route() {
        let mut walls = WallModel::new(3, 3);
        walls.mark_wall(START_CELL, Direction::North, true, &mut NullDisplay);
        walls.mark_wall(START_CELL, Direction::East, true, &mut NullDisplay);
        let mouse = SimulatedMouse::new(MazeLayout::from_walls(walls));
        let mut controller = NavigationController::new(mouse).unwrap();
        assert!(matches!(
            controller.step(),
            Err(NavError::NoRoute { cell }) if cell == START_CELL
        ));
    }
}
