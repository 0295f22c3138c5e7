//! # dgRust - Dynamical Graph Model
//!
//! An evolving ecological interaction network. Every time step one species
//! immigrates and forms randomly weighted directed interactions with the
//! existing species; species whose fitness (the sum of their incoming
//! weights) turns negative are removed one at a time, most negative first,
//! until the population is stable again. Removals can push other species
//! negative, producing extinction avalanches.
//!
//! ## Core Components
//!
//! - **Species / SpeciesArena**: nodes with incoming weights, outgoing
//!   back-references and a cached local clustering coefficient input
//! - **DynamicalGraph**: population controller driving immigration, wiring
//!   and the extinction cascade, with diversity/lifetime/avalanche histograms
//! - **Simulation**: burn-in and measurement run loop producing time series
//!   and averaged metrics
//!
//! ```
//! use dg_rust::DynamicalGraph;
//!
//! let mut graph = DynamicalGraph::new(42, 0.0).unwrap();
//! for _ in 0..10 {
//!     graph.step();
//! }
//! // without interactions nothing ever goes extinct
//! assert_eq!(graph.diversity(), 10);
//! ```

// Core model
pub mod dg_interface;
pub mod dg_histogram;
pub mod dg_random;
pub mod dg_species;
pub mod dg_graph;

// Run loop and reporting
pub mod dg_config;
pub mod dg_events;
pub mod dg_output;
pub mod dg_run;
pub mod dg_stats;

// Re-export commonly used types
pub use dg_config::{ConfigError, Horizon, MetricsConfig, OutputConfig, SimConfig};
pub use dg_graph::{DynamicalGraph, Interaction, StepReport};
pub use dg_histogram::Histogram;
pub use dg_interface::{DgTime, Event, EventSink, NoOpSink, SpeciesId, Weight};
pub use dg_random::{RandomSource, SeededRandom};
pub use dg_run::{RunResult, Simulation};
pub use dg_species::{GraphError, Species, SpeciesArena};
pub use dg_stats::{RunningMean, Sample, Summary};
