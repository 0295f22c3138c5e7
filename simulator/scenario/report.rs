// Console reports

use dg_rust::RunResult;

/// Print a summary of a finished run
pub fn print_summary(name: &str, connectance: f64, result: &RunResult) {
    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║        Dynamical Graph Results                        ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    println!("Configuration:");
    println!("  Scenario: {}", name);
    println!("  Connectance: {}", connectance);
    println!("  Seed: {}", result.seed);
    println!("  Steps: {}\n", result.steps);

    println!("Averages (measurement phase):");
    println!("  Diversity: {:.3}", result.summary.diversity);
    if let Some(density) = result.summary.link_density {
        println!("  Link density: {:.5}", density);
    }
    if let Some(cc) = result.summary.clustering {
        println!("  Clustering coefficient: {:.5}", cc);
    }
    println!();

    println!("Distributions:");
    println!("  Final diversity: {}", result.final_diversity);
    println!(
        "  Extinctions recorded: {}",
        result.lifetime.total()
    );
    if let Some(mean) = result.lifetime.mean() {
        println!("  Mean lifetime: {:.2}", mean);
    }
    if let Some((largest, _)) = result.extinction.iter().last() {
        println!("  Largest avalanche: {}", largest);
    }
    let quiet = result.extinction.get(0);
    let steps = result.extinction.total();
    if steps > 0 {
        println!(
            "  Steps without extinction: {:.1}%",
            quiet as f64 / steps as f64 * 100.0
        );
    }
    println!();
}
