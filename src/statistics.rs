use std::fmt;

/// Counters collected over one navigation run.
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    pub exploration_steps: usize,
    pub exploration_moves: usize,
    pub turns: usize,
    pub failed_turns: usize,
    pub failed_moves: usize,
    pub blocked_moves: usize,
    pub fast_path_length: Option<usize>,
    pub fast_run_moves: usize,
    pub fast_run_completed: bool,
    pub optimal_path_length: usize,
    pub route_efficiency: f64,
}

impl RunStatistics {
    pub fn new() -> Self {
        RunStatistics::default()
    }

    /// Ratio of the replayed fast path to the true shortest route; 1.0 is optimal.
    pub fn calculate_efficiency(&mut self) {
        self.route_efficiency = match self.fast_path_length {
            Some(length) if self.optimal_path_length > 0 => {
                length as f64 / self.optimal_path_length as f64
            }
            _ => 0.0,
        };
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exploration steps: {}", self.exploration_steps)?;
        writeln!(f, "Exploration moves: {}", self.exploration_moves)?;
        writeln!(f, "Turns: {} ({} unacknowledged)", self.turns, self.failed_turns)?;
        writeln!(f, "Failed moves: {}", self.failed_moves)?;
        writeln!(f, "Moves blocked after rotating: {}", self.blocked_moves)?;

        match self.fast_path_length {
            Some(length) => writeln!(f, "Fast path length: {}", length)?,
            None => writeln!(f, "Fast path: not built")?,
        }
        writeln!(
            f,
            "Fast run: {} ({} moves)",
            if self.fast_run_completed { "completed" } else { "incomplete" },
            self.fast_run_moves
        )?;

        if self.optimal_path_length > 0 {
            writeln!(f, "Optimal path length: {}", self.optimal_path_length)?;
            writeln!(f, "Route efficiency: {:.3}", self.route_efficiency)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_efficiency_requires_both_lengths() {
        let mut stats = RunStatistics::new();
        stats.calculate_efficiency();
        assert_eq!(stats.route_efficiency, 0.0);

        stats.fast_path_length = Some(18);
        stats.optimal_path_length = 12;
        stats.calculate_efficiency();
        assert!((stats.route_efficiency - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_display_mentions_missing_fast_path() {
        let text = RunStatistics::new().to_string();
        assert!(text.contains("Fast path: not built"));
        assert!(!text.contains("Route efficiency"));
    }
}
