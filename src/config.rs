use clap::Parser;

/// Flood-fill maze solver. Speaks the simulator protocol on stdin/stdout unless
/// asked to run against a generated maze.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Run against an in-process generated maze instead of the simulator protocol
    #[arg(long, default_value_t = false)]
    pub simulate: bool,

    #[arg(long, default_value_t = 16)]
    pub width: usize,

    #[arg(long, default_value_t = 16)]
    pub height: usize,

    /// Extra walls knocked out of the generated maze to create loops
    #[arg(long, default_value_t = 10)]
    pub openings: usize,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop exploring after this many steps (unlimited against the simulator)
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Run this many seeded simulations and summarize them
    #[arg(long, default_value_t = 0)]
    pub batch_runs: usize,

    /// CSV file for batch results
    #[arg(long)]
    pub output_file: Option<String>,

    #[arg(long, default_value_t = false)]
    pub skip_fast_run: bool,

    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config::parse_from(["floodfill_mouse"])
    }
}
