use crate::config::Config;
use crate::error::Result;
use crate::simulation::Simulation;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub simulation_id: usize,
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub openings: usize,
    pub success: bool,
    pub fast_run_completed: bool,
    pub exploration_moves: usize,
    pub failed_moves: usize,
    pub fast_path_length: usize,
    pub optimal_path_length: usize,
    pub route_efficiency: f64,
    pub execution_time_ms: u64,
}

/// Runs many seeded simulations back to back. Seeds start at `--seed` (or 0)
/// and increase by one per run, so a batch is reproducible.
pub struct BatchSimulation {
    config: Config,
    results: Vec<BatchResult>,
    start_time: Instant,
}

impl BatchSimulation {
    pub fn new(config: Config) -> Self {
        BatchSimulation {
            config,
            results: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn results(&self) -> &[BatchResult] {
        &self.results
    }

    pub fn run(&mut self) -> Result<()> {
        let base_seed = self.config.seed.unwrap_or(0);
        tracing::info!(
            "Batch of {} runs on {}x{} mazes starting at seed {}",
            self.config.batch_runs,
            self.config.width,
            self.config.height,
            base_seed
        );

        let mut last_progress_report = Instant::now();
        let progress_interval = Duration::from_secs(10);

        for simulation_id in 0..self.config.batch_runs {
            let seed = base_seed.wrapping_add(simulation_id as u64);
            let mut run_config = self.config.clone();
            run_config.seed = Some(seed);

            let simulation_start = Instant::now();
            let result = Simulation::new(&run_config).run()?;
            let stats = &result.statistics;

            self.results.push(BatchResult {
                simulation_id,
                seed,
                width: run_config.width,
                height: run_config.height,
                openings: run_config.openings,
                success: result.success(),
                fast_run_completed: stats.fast_run_completed,
                exploration_moves: stats.exploration_moves,
                failed_moves: stats.failed_moves,
                fast_path_length: stats.fast_path_length.unwrap_or(0),
                optimal_path_length: stats.optimal_path_length,
                route_efficiency: stats.route_efficiency,
                execution_time_ms: simulation_start.elapsed().as_millis() as u64,
            });

            if last_progress_report.elapsed() > progress_interval {
                tracing::info!(
                    "Progress: {}/{} runs - elapsed {:.1}s",
                    simulation_id + 1,
                    self.config.batch_runs,
                    self.start_time.elapsed().as_secs_f64()
                );
                last_progress_report = Instant::now();
            }
        }

        if let Some(path) = self.config.output_file.clone() {
            self.write_csv(&path)?;
            tracing::info!("Results saved to {}", path);
        }
        Ok(())
    }

    pub fn write_csv(&self, path: &str) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.write_rows(&mut file)?;
        file.flush()?;
        Ok(())
    }

    fn write_rows(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "simulation_id,seed,width,height,openings,success,fast_run_completed,exploration_moves,failed_moves,fast_path_length,optimal_path_length,route_efficiency,execution_time_ms")?;
        for result in &self.results {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{:.6},{}",
                result.simulation_id,
                result.seed,
                result.width,
                result.height,
                result.openings,
                result.success,
                result.fast_run_completed,
                result.exploration_moves,
                result.failed_moves,
                result.fast_path_length,
                result.optimal_path_length,
                result.route_efficiency,
                result.execution_time_ms
            )?;
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        if self.results.is_empty() {
            println!("No results to summarize.");
            return;
        }

        println!("\n=== BATCH SIMULATION SUMMARY ===");
        let total = self.results.len();
        let successful: Vec<_> = self.results.iter().filter(|r| r.success).collect();
        let success_rate = (successful.len() as f64 / total as f64) * 100.0;
        println!("Success rate: {}/{} ({:.1}%)", successful.len(), total, success_rate);

        if !successful.is_empty() {
            let count = successful.len() as f64;
            let avg_moves = successful.iter().map(|r| r.exploration_moves as f64).sum::<f64>() / count;
            let avg_efficiency = successful.iter().map(|r| r.route_efficiency).sum::<f64>() / count;
            let avg_time = successful.iter().map(|r| r.execution_time_ms as f64).sum::<f64>() / count;
            let fast_runs = successful.iter().filter(|r| r.fast_run_completed).count();

            println!("Average exploration moves: {:.1}", avg_moves);
            println!("Average route efficiency: {:.3}", avg_efficiency);
            println!("Fast runs completed: {}/{}", fast_runs, successful.len());
            println!("Average execution time: {:.1}ms", avg_time);
        }
        println!("Total time: {:.2?}", self.start_time.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_config(runs: usize) -> Config {
        Config {
            width: 6,
            height: 6,
            openings: 3,
            seed: Some(11),
            batch_runs: runs,
            ..Config::default()
        }
    }

    #[test]
    fn test_batch_uses_consecutive_seeds() {
        let mut batch = BatchSimulation::new(batch_config(3));
        batch.run().unwrap();
        let seeds: Vec<_> = batch.results().iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![11, 12, 13]);
        assert!(batch.results().iter().all(|r| r.success));
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let mut batch = BatchSimulation::new(batch_config(2));
        batch.run().unwrap();
        let mut out = Vec::new();
        batch.write_rows(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("simulation_id,seed,"));
        assert!(lines[1].starts_with("0,11,6,6,3,true,"));
    }
}
