// Scenario Runner - Load and execute scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/baseline.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/baseline.yaml --seed 1234

mod scenario;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use dg_rust::dg_events::LoggingEventSink;
use dg_rust::dg_output::write_results;
use dg_rust::{EventSink, Simulation};
use log::{info, LevelFilter};
use scenario::{print_summary, CsvEventSink, ScenarioFile};
use simple_logger::SimpleLogger;

fn main() {
    // event lines only appear for scenarios that set log_events
    if let Err(e) = SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .with_module_level("dg_rust::dg_events", LevelFilter::Debug)
        .init()
    {
        eprintln!("logger: {}", e);
    }

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/baseline.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/baseline.yaml --seed 1234", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);

    // Parse optional seed
    let seed: Option<u64> = if args.len() >= 4 && args[2] == "--seed" {
        match args[3].parse() {
            Ok(seed) => Some(seed),
            Err(e) => {
                eprintln!("Invalid seed {:?}: {}", args[3], e);
                process::exit(1);
            }
        }
    } else {
        None
    };

    let scenarios = if path.is_file() {
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        find_scenarios(path)
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        process::exit(1);
    };

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", path.display());
        process::exit(1);
    }

    let mut failed = 0;
    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        if let Err(e) = run_scenario_file(scenario_path, seed) {
            eprintln!("Scenario {} failed: {}", scenario_path.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        process::exit(1);
    }
}

fn find_scenarios(dir: &Path) -> Vec<PathBuf> {
    let mut scenarios = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();
    scenarios
}

fn run_scenario_file(path: &Path, seed: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loading scenario from: {}", path.display());

    let mut scenario = ScenarioFile::load(path)?;
    let name = scenario.display_name(path);

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  {}  {}", name, " ".repeat(54_usize.saturating_sub(name.len())));
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    if seed.is_some() {
        scenario.config.seed = seed;
    }

    // each scenario gets its own directory below the configured one
    let mut output = scenario.config.output.clone();
    output.directory = output.directory.join(&name);
    let connectance = scenario.config.connectance;

    let sink: Box<dyn EventSink> = match scenario.events_csv {
        Some(ref csv) => {
            if let Some(parent) = csv.parent() {
                fs::create_dir_all(parent)?;
            }
            Box::new(CsvEventSink::new(csv)?)
        }
        None => Box::new(LoggingEventSink::new(scenario.log_events)),
    };

    let simulation = Simulation::new_with_sink(scenario.config, sink)?;
    info!("seed: {}", simulation.seed());
    let result = simulation.run();

    write_results(&result, &output)?;
    print_summary(&name, connectance, &result);

    println!("\n✓ Scenario complete!\n");
    Ok(())
}
