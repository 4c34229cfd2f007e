use crate::agent::{MazeDisplay, Mouse, NullDisplay, Pose};
use crate::algorithms::goals::center_goals;
use crate::config::Config;
use crate::error::Result;
use crate::grid::{clamp_dimensions, Cell, Direction, WallModel};
use crate::navigation::{NavigationController, NavigationPhase, START_CELL};
use crate::statistics::RunStatistics;
use pathfinding::prelude::bfs;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;

/// Ground-truth maze used by the in-process simulator.
#[derive(Debug, Clone)]
pub struct MazeLayout {
    walls: WallModel,
    center: Vec<Cell>,
    seed: Option<u64>,
}

impl MazeLayout {
    /// A maze with boundary walls only.
    pub fn open(width: usize, height: usize) -> Self {
        Self::from_walls(WallModel::new(width, height))
    }

    pub fn from_walls(walls: WallModel) -> Self {
        let center = center_goals(walls.width(), walls.height());
        MazeLayout {
            walls,
            center,
            seed: None,
        }
    }

    /// Generate a random maze with a carved-out center block.
    ///
    /// A randomized depth-first search carves a perfect maze (exactly one route
    /// between any two cells), the walls inside the center block are removed,
    /// then up to `openings` extra interior walls are knocked down to create
    /// loops. The same seed always yields the same maze.
    pub fn generate(width: usize, height: usize, openings: usize, seed: Option<u64>) -> Self {
        let (width, height) = clamp_dimensions(width.max(1), height.max(1));
        let seed = seed.unwrap_or_else(rand::random::<u64>);
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut display = NullDisplay;

        let mut walls = WallModel::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let cell = Cell::new(x, y);
                walls.mark_wall(cell, Direction::North, true, &mut display);
                walls.mark_wall(cell, Direction::East, true, &mut display);
            }
        }

        let mut visited = FxHashSet::default();
        let mut stack = vec![START_CELL];
        visited.insert(START_CELL);
        while let Some(&current) = stack.last() {
            let unvisited: Vec<(Direction, Cell)> = Direction::ALL
                .iter()
                .filter_map(|&direction| {
                    walls
                        .neighbor(current, direction)
                        .filter(|neighbor| !visited.contains(neighbor))
                        .map(|neighbor| (direction, neighbor))
                })
                .collect();

            if unvisited.is_empty() {
                stack.pop();
                continue;
            }
            let (direction, next) = unvisited[rng.gen_range(0..unvisited.len())];
            walls.mark_wall(current, direction, false, &mut display);
            visited.insert(next);
            stack.push(next);
        }

        let center = center_goals(width, height);
        for &cell in &center {
            for direction in Direction::ALL {
                let inside = walls
                    .neighbor(cell, direction)
                    .is_some_and(|neighbor| center.contains(&neighbor));
                if inside {
                    walls.mark_wall(cell, direction, false, &mut display);
                }
            }
        }

        let closed_interior = (0..height)
            .flat_map(|y| (0..width).map(move |x| Cell::new(x, y)))
            .flat_map(|cell| [(cell, Direction::North), (cell, Direction::East)])
            .filter(|&(cell, direction)| {
                !walls.is_boundary_edge(cell, direction) && walls.has_wall_between(cell, direction)
            })
            .count();
        let openings = openings.min(closed_interior);

        let mut opened = 0;
        let mut attempts = 0;
        while opened < openings && attempts < openings.saturating_mul(10) {
            let cell = Cell::new(rng.gen_range(0..width), rng.gen_range(0..height));
            let direction = Direction::ALL[rng.gen_range(0..4)];
            if !walls.is_boundary_edge(cell, direction) && walls.has_wall_between(cell, direction) {
                walls.mark_wall(cell, direction, false, &mut display);
                opened += 1;
            }
            attempts += 1;
        }

        tracing::debug!(
            "Generated {}x{} maze (seed {}, {} extra openings)",
            width,
            height,
            seed,
            opened
        );

        MazeLayout {
            walls,
            center,
            seed: Some(seed),
        }
    }

    pub fn walls(&self) -> &WallModel {
        &self.walls
    }

    pub fn center(&self) -> &[Cell] {
        &self.center
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Length of the true shortest route from the start cell into the center.
    pub fn shortest_path_length(&self) -> Option<usize> {
        bfs(
            &START_CELL,
            |cell| {
                Direction::ALL
                    .iter()
                    .filter(|&&direction| self.walls.can_move(*cell, direction))
                    .filter_map(|&direction| self.walls.neighbor(*cell, direction))
                    .collect::<Vec<_>>()
            },
            |cell| self.center.contains(cell),
        )
        .map(|path| path.len() - 1)
    }
}

/// Telemetry received by a [`SimulatedMouse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Telemetry {
    pub walls_set: usize,
    pub walls_cleared: usize,
    pub texts_set: usize,
    pub texts_cleared: usize,
    pub colors_set: usize,
    pub colors_cleared: usize,
}

/// A robot living in a [`MazeLayout`].
///
/// Sensing reads the ground truth, moves into walls are refused, and a number
/// of upcoming moves or turns can be made to fail on purpose.
#[derive(Debug, Clone)]
pub struct SimulatedMouse {
    layout: MazeLayout,
    pose: Pose,
    pending_move_failures: usize,
    pending_turn_failures: usize,
    crashes: usize,
    telemetry: Telemetry,
}

impl SimulatedMouse {
    pub fn new(layout: MazeLayout) -> Self {
        SimulatedMouse {
            layout,
            pose: Pose::start(),
            pending_move_failures: 0,
            pending_turn_failures: 0,
            crashes: 0,
            telemetry: Telemetry::default(),
        }
    }

    pub fn fail_next_moves(&mut self, count: usize) {
        self.pending_move_failures = count;
    }

    pub fn fail_next_turns(&mut self, count: usize) {
        self.pending_turn_failures = count;
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn layout(&self) -> &MazeLayout {
        &self.layout
    }

    pub fn crashes(&self) -> usize {
        self.crashes
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn wall(&self, direction: Direction) -> bool {
        self.layout.walls.has_wall_between(self.pose.position, direction)
    }

    fn take_turn_failure(&mut self) -> bool {
        if self.pending_turn_failures > 0 {
            self.pending_turn_failures -= 1;
            return true;
        }
        false
    }
}

impl MazeDisplay for SimulatedMouse {
    fn set_wall(&mut self, _cell: Cell, _direction: Direction) {
        self.telemetry.walls_set += 1;
    }

    fn clear_wall(&mut self, _cell: Cell, _direction: Direction) {
        self.telemetry.walls_cleared += 1;
    }

    fn set_text(&mut self, _cell: Cell, _text: &str) {
        self.telemetry.texts_set += 1;
    }

    fn clear_text(&mut self, _cell: Cell) {
        self.telemetry.texts_cleared += 1;
    }

    fn set_color(&mut self, _cell: Cell, _color: char) {
        self.telemetry.colors_set += 1;
    }

    fn clear_color(&mut self, _cell: Cell) {
        self.telemetry.colors_cleared += 1;
    }
}

impl Mouse for SimulatedMouse {
    fn maze_width(&mut self) -> Result<usize> {
        Ok(self.layout.walls.width())
    }

    fn maze_height(&mut self) -> Result<usize> {
        Ok(self.layout.walls.height())
    }

    fn wall_front(&mut self) -> Result<bool> {
        Ok(self.wall(self.pose.heading))
    }

    fn wall_left(&mut self) -> Result<bool> {
        Ok(self.wall(self.pose.heading.rotate_left()))
    }

    fn wall_right(&mut self) -> Result<bool> {
        Ok(self.wall(self.pose.heading.rotate_right()))
    }

    fn move_forward(&mut self) -> Result<bool> {
        if self.pending_move_failures > 0 {
            self.pending_move_failures -= 1;
            return Ok(false);
        }
        if !self.layout.walls.can_move(self.pose.position, self.pose.heading) {
            self.crashes += 1;
            return Ok(false);
        }
        self.pose.advance();
        Ok(true)
    }

    fn turn_left(&mut self) -> Result<bool> {
        if self.take_turn_failure() {
            return Ok(false);
        }
        self.pose.turn_left();
        Ok(true)
    }

    fn turn_right(&mut self) -> Result<bool> {
        if self.take_turn_failure() {
            return Ok(false);
        }
        self.pose.turn_right();
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub seed: Option<u64>,
    pub reached_center: bool,
    pub returned_to_start: bool,
    pub statistics: RunStatistics,
    pub final_position: Cell,
    pub known_map: String,
    pub true_map: String,
    pub error: Option<String>,
}

impl SimulationResult {
    pub fn success(&self) -> bool {
        self.returned_to_start && self.error.is_none()
    }
}

/// One exploration run against a simulated maze.
pub struct Simulation {
    layout: MazeLayout,
    max_steps: usize,
    fast_run: bool,
}

impl Simulation {
    pub fn new(config: &Config) -> Self {
        let layout = MazeLayout::generate(config.width, config.height, config.openings, config.seed);
        Self::with_layout(config, layout)
    }

    /// Uses `layout` as the maze. Without an explicit `--max-steps` the run is
    /// capped at the square of the cell count.
    pub fn with_layout(config: &Config, layout: MazeLayout) -> Self {
        let cells = layout.walls().cell_count();
        Simulation {
            layout,
            max_steps: config.max_steps.unwrap_or(cells * cells),
            fast_run: !config.skip_fast_run,
        }
    }

    pub fn layout(&self) -> &MazeLayout {
        &self.layout
    }

    pub fn run(&self) -> Result<SimulationResult> {
        let mouse = SimulatedMouse::new(self.layout.clone());
        let mut controller = NavigationController::new(mouse)?.with_max_steps(Some(self.max_steps));
        controller.mouse_mut().set_color(START_CELL, 'G');

        let outcome = controller.explore().and_then(|()| {
            if self.fast_run {
                controller.fast_run()
            } else {
                Ok(false)
            }
        });
        if let Err(e) = &outcome {
            tracing::warn!("Simulation ended early: {}", e);
        }

        let mut statistics = controller.stats().clone();
        statistics.optimal_path_length = self.layout.shortest_path_length().unwrap_or(0);
        statistics.calculate_efficiency();

        let final_position = controller.pose().position;
        Ok(SimulationResult {
            seed: self.layout.seed(),
            reached_center: controller.phase() != NavigationPhase::ToCenter,
            returned_to_start: controller.phase() == NavigationPhase::Done,
            statistics,
            final_position,
            known_map: controller.floodfill().walls().render(Some(final_position)),
            true_map: self.layout.walls().render(None),
            error: outcome.err().map(|e| e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reachable_cells(walls: &WallModel) -> usize {
        let mut seen = FxHashSet::default();
        let mut frontier = vec![START_CELL];
        seen.insert(START_CELL);
        while let Some(cell) = frontier.pop() {
            for direction in Direction::ALL {
                if walls.can_move(cell, direction) {
                    if let Some(next) = walls.neighbor(cell, direction) {
                        if seen.insert(next) {
                            frontier.push(next);
                        }
                    }
                }
            }
        }
        seen.len()
    }

    #[test]
    fn test_generation_is_reproducible() {
        let a = MazeLayout::generate(8, 8, 5, Some(42));
        let b = MazeLayout::generate(8, 8, 5, Some(42));
        assert_eq!(a.walls().render(None), b.walls().render(None));
        assert_eq!(a.seed(), Some(42));
    }

    #[test]
    fn test_generated_maze_is_connected() {
        for seed in 0..5 {
            let layout = MazeLayout::generate(10, 7, 0, Some(seed));
            assert_eq!(reachable_cells(layout.walls()), 70);
            assert!(layout.shortest_path_length().is_some());
        }
    }

    #[test]
    fn test_center_block_is_open() {
        let layout = MazeLayout::generate(6, 6, 0, Some(3));
        assert_eq!(
            layout.center(),
            &[Cell::new(2, 2), Cell::new(3, 2), Cell::new(2, 3), Cell::new(3, 3)]
        );
        let walls = layout.walls();
        assert!(!walls.has_wall_between(Cell::new(2, 2), Direction::East));
        assert!(!walls.has_wall_between(Cell::new(2, 2), Direction::North));
        assert!(!walls.has_wall_between(Cell::new(3, 3), Direction::West));
        assert!(!walls.has_wall_between(Cell::new(3, 3), Direction::South));
    }

    #[test]
    fn test_huge_opening_count_is_bounded() {
        let layout = MazeLayout::generate(4, 4, usize::MAX, Some(8));
        assert_eq!(reachable_cells(layout.walls()), 16);
        assert_eq!(layout.seed(), Some(8));
    }

    #[test]
    fn test_open_layout_shortest_path() {
        assert_eq!(MazeLayout::open(16, 16).shortest_path_length(), Some(14));
        assert_eq!(MazeLayout::open(1, 1).shortest_path_length(), Some(0));
    }

    #[test]
    fn test_mouse_refuses_to_enter_walls() {
        let mut mouse = SimulatedMouse::new(MazeLayout::open(2, 2));
        assert!(mouse.wall_left().unwrap());
        assert!(!mouse.wall_front().unwrap());
        assert!(mouse.turn_left().unwrap());
        assert!(!mouse.move_forward().unwrap());
        assert_eq!(mouse.crashes(), 1);
        assert_eq!(mouse.pose(), Pose::new(START_CELL, Direction::West));
    }

    #[test]
    fn test_injected_turn_failures() {
        let mut mouse = SimulatedMouse::new(MazeLayout::open(2, 2));
        mouse.fail_next_turns(1);
        assert!(!mouse.turn_right().unwrap());
        assert!(mouse.turn_right().unwrap());
        assert_eq!(mouse.pose().heading, Direction::East);
    }
}
