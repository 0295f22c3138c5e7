// Side-by-side table of finished runs

use dg_rust::RunResult;

/// One table row per (connectance, result)
pub fn print_comparison(rows: &[(f64, RunResult)]) {
    println!(
        "{:>12} {:>12} {:>14} {:>12} {:>14}",
        "connectance", "diversity", "link density", "CC", "mean lifetime"
    );
    println!("{}", "-".repeat(68));

    for (connectance, result) in rows {
        println!(
            "{:>12.3} {:>12.3} {:>14.5} {:>12.5} {:>14.2}",
            connectance,
            result.summary.diversity,
            result.summary.link_density.unwrap_or(0.0),
            result.summary.clustering.unwrap_or(0.0),
            result.lifetime.mean().unwrap_or(0.0)
        );
    }
}
