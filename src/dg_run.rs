//! Run loop: burn-in, measurement and periodic sampling.
//!
//! ```no_run
//! use dg_rust::{SimConfig, Simulation};
//!
//! let config = SimConfig {
//!     connectance: 0.2,
//!     seed: Some(1),
//!     ..Default::default()
//! };
//! let result = Simulation::new(config).unwrap().run();
//! println!("average diversity {}", result.summary.diversity);
//! ```

use log::info;

use crate::dg_config::{ConfigError, SimConfig};
use crate::dg_graph::DynamicalGraph;
use crate::dg_histogram::Histogram;
use crate::dg_interface::{DgTime, EventSink, NoOpSink};
use crate::dg_random::SeededRandom;
use crate::dg_stats::{Sample, Summary};

/// Everything a finished run reports
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Seed used for the run
    pub seed: u64,
    pub steps: u64,
    pub summary: Summary,
    pub samples: Vec<Sample>,
    pub lifetime: Histogram,
    pub diversity: Histogram,
    pub extinction: Histogram,
    /// In-degree distribution of the final population
    pub in_degree: Histogram,
    /// Out-degree distribution of the final population
    pub out_degree: Histogram,
    /// Diversity when the run ended
    pub final_diversity: usize,
}

pub struct Simulation {
    config: SimConfig,
    seed: u64,
    graph: DynamicalGraph<SeededRandom>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::new_with_sink(config, Box::new(NoOpSink))
    }

    pub fn new_with_sink(
        config: SimConfig,
        event_sink: Box<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.resolve_seed();
        let graph =
            DynamicalGraph::new_with_sink(SeededRandom::new(seed), config.connectance, event_sink)?;

        Ok(Self {
            config,
            seed,
            graph,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn graph(&self) -> &DynamicalGraph<SeededRandom> {
        &self.graph
    }

    /// Main simulation loop
    pub fn run(mut self) -> RunResult {
        let t_init = self.config.horizon.t_init();
        let total = self.config.horizon.total();
        let metrics = self.config.metrics;

        info!(
            "connectance: {} t_init: {} t_measure: {} seed: {}",
            self.config.connectance,
            t_init,
            self.config.horizon.t_measure(),
            self.seed
        );

        let mut samples = Vec::new();

        // burn-in
        for t in 0..t_init {
            self.graph.step();
            self.sample(t, &mut samples);
        }

        // runs even when nothing is measured so burn-in never leaks into the results
        self.graph.begin_measurement();
        for t in t_init..total {
            self.graph.step();
            self.graph.accumulate_averages(&metrics);
            self.sample(t, &mut samples);
        }

        let summary = self.graph.summary(&metrics);
        info!(
            "done. {} steps, average diversity {:.3}",
            total, summary.diversity
        );

        let (in_degree, out_degree) = self.graph.degree_histograms();
        RunResult {
            seed: self.seed,
            steps: total,
            summary,
            samples,
            lifetime: self.graph.lifetime_histo().clone(),
            diversity: self.graph.diversity_histo().clone(),
            extinction: self.graph.extinction_histo().clone(),
            in_degree,
            out_degree,
            final_diversity: self.graph.diversity(),
        }
    }

    fn sample(&self, t: DgTime, samples: &mut Vec<Sample>) {
        if t % self.config.sample_interval != 0 {
            return;
        }

        let metrics = self.config.metrics;
        let sample = Sample {
            time: t,
            diversity: self.graph.diversity(),
            link_density: metrics
                .link_density
                .then(|| self.graph.link_density().unwrap_or(0.0)),
            clustering: metrics
                .clustering
                .then(|| self.graph.mean_clustering_coefficient()),
        };
        info!("t : {} diversity: {}", t, sample.diversity);
        samples.push(sample);
    }
}
