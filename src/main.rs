use clap::Parser;

use floodfill_mouse::batch_simulation::BatchSimulation;
use floodfill_mouse::config::Config;
use floodfill_mouse::navigation::NavigationController;
use floodfill_mouse::protocol::MmsClient;
use floodfill_mouse::simulation::Simulation;
use tracing::{error, info};

fn main() {
    let config = Config::parse();

    // stdout belongs to the simulator protocol, so logs go to stderr
    let default_level = if config.quiet { "floodfill_mouse=warn" } else { "floodfill_mouse=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().unwrap()),
        )
        .init();

    if config.batch_runs > 0 {
        let mut batch = BatchSimulation::new(config.clone());
        match batch.run() {
            Ok(()) => {
                if !config.quiet {
                    batch.print_summary();
                }
            }
            Err(e) => {
                error!("Batch simulation failed: {}", e);
                std::process::exit(1);
            }
        }
    } else if config.simulate {
        let simulation = Simulation::new(&config);
        match simulation.run() {
            Ok(result) => {
                println!("=== SIMULATION COMPLETE ===");
                if let Some(seed) = result.seed {
                    println!("Maze seed: {} (for reproducibility)", seed);
                }
                if result.success() {
                    println!("SUCCESS: reached the center and returned to start");
                } else {
                    println!(
                        "FAILED: {}",
                        result.error.as_deref().unwrap_or("did not return to start")
                    );
                }
                println!("Final position: ({}, {})", result.final_position.x, result.final_position.y);
                println!("{}", result.statistics);

                if !config.quiet {
                    println!("Known walls:");
                    println!("{}", result.known_map);
                    println!("Actual maze:");
                    println!("{}", result.true_map);
                }
                if !result.success() {
                    std::process::exit(1);
                }
            }
            Err(e) => {
                error!("Simulation failed: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        let outcome = NavigationController::new(MmsClient::stdio())
            .map(|controller| controller.with_max_steps(config.max_steps))
            .and_then(|mut controller| controller.run());
        match outcome {
            Ok(stats) => {
                for line in stats.to_string().lines() {
                    info!("{}", line);
                }
            }
            Err(e) => {
                error!("Navigation failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
