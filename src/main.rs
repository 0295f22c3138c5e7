use std::env;
use std::error::Error;
use std::process;
use std::time::Instant;

use dg_rust::dg_output::write_results;
use dg_rust::{SimConfig, Simulation};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

fn main() {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).init() {
        eprintln!("logger: {}", e);
    }

    let args: Vec<String> = env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let config = SimConfig::from_args(args)?;

    info!("Lists of given parameters are as follows:");
    info!("  connectance:\t{}", config.connectance);
    info!("  t_init:\t{}", config.horizon.t_init());
    info!("  t_measure:\t{}", config.horizon.t_measure());
    info!("  seed:\t{}", config.resolve_seed());

    let start = Instant::now();
    let output = config.output.clone();
    let result = Simulation::new(config)?.run();
    write_results(&result, &output)?;

    info!("elapsed time : {:.3}", start.elapsed().as_secs_f64());
    Ok(())
}
