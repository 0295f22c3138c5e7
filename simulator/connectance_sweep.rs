// Connectance Sweep
//
// Runs the same horizon and seed over a range of connectances and compares
// the measured averages. Diversity is expected to fall as connectance grows.
//
// Run with: cargo run --example connectance_sweep [seed]

mod comparison;

use std::process;

use dg_rust::{Horizon, SimConfig, Simulation};
use log::{info, LevelFilter};
use comparison::print_comparison;
use simple_logger::SimpleLogger;

fn main() {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Warn).init() {
        eprintln!("logger: {}", e);
    }

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42u64);

    println!("╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO: Connectance Sweep                          ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Seed: {}\n", seed);

    let connectances = [0.05, 0.1, 0.15, 0.2, 0.3, 0.5];
    let mut rows = Vec::new();

    for &connectance in &connectances {
        let config = SimConfig {
            connectance,
            horizon: Horizon::Phased {
                t_init: 1024,
                t_measure: 16384,
            },
            seed: Some(seed),
            ..Default::default()
        };

        info!("running connectance {}", connectance);
        let simulation = match Simulation::new(config) {
            Ok(simulation) => simulation,
            Err(e) => {
                eprintln!("connectance {}: {}", connectance, e);
                process::exit(1);
            }
        };
        let result = simulation.run();
        rows.push((connectance, result));
    }

    print_comparison(&rows);
    println!("\n✓ Sweep complete!");
}
