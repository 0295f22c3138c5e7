// population controller: immigration, random wiring and the extinction cascade

use std::collections::BTreeSet;

use log::{debug, info, trace};

use crate::dg_config::{ConfigError, MetricsConfig};
use crate::dg_histogram::Histogram;
use crate::dg_interface::{DgTime, Event, EventSink, NoOpSink, SpeciesId, Weight};
use crate::dg_random::{RandomSource, SeededRandom};
use crate::dg_species::{GraphError, Species, SpeciesArena};
use crate::dg_stats::{RunningMean, Summary};

/// Prescribed interaction of the immigrant for `DynamicalGraph::step_with`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// Edge `source -> immigrant`
    From { source: SpeciesId, weight: Weight },
    /// Edge `immigrant -> target`
    To { target: SpeciesId, weight: Weight },
}

impl Interaction {
    fn partner(&self) -> SpeciesId {
        match self {
            Interaction::From { source, .. } => *source,
            Interaction::To { target, .. } => *target,
        }
    }
}

/// Outcome of one completed time step
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub time: DgTime,
    pub immigrant: SpeciesId,
    /// Removed species in cascade order
    pub extinct: Vec<SpeciesId>,
    /// (diversity before + 1) - diversity after
    pub extinction_size: u64,
    pub diversity: usize,
}

pub struct DynamicalGraph<R: RandomSource = SeededRandom> {
    connectance: f64,
    rng: R,

    arena: SpeciesArena,
    live: BTreeSet<SpeciesId>,
    // extinction eligible species found during the current step, empty between steps
    cascade: BTreeSet<SpeciesId>,
    current_time: DgTime,

    extinction_histo: Histogram,
    diversity_histo: Histogram,
    lifetime_histo: Histogram,

    diversity_mean: RunningMean,
    link_density_mean: RunningMean,
    clustering_mean: RunningMean,

    event_sink: Box<dyn EventSink>,
}

impl DynamicalGraph<SeededRandom> {
    pub fn new(seed: u64, connectance: f64) -> Result<Self, ConfigError> {
        Self::new_with_rng(SeededRandom::new(seed), connectance)
    }
}

impl<R: RandomSource> DynamicalGraph<R> {
    pub fn new_with_rng(rng: R, connectance: f64) -> Result<Self, ConfigError> {
        Self::new_with_sink(rng, connectance, Box::new(NoOpSink))
    }

    /// Create a graph with a custom event sink for debugging/analysis
    pub fn new_with_sink(
        rng: R,
        connectance: f64,
        event_sink: Box<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&connectance) {
            return Err(ConfigError::ConnectanceOutOfRange(connectance));
        }

        Ok(Self {
            connectance,
            rng,
            arena: SpeciesArena::new(),
            live: BTreeSet::new(),
            cascade: BTreeSet::new(),
            current_time: 0,
            extinction_histo: Histogram::new(),
            diversity_histo: Histogram::new(),
            lifetime_histo: Histogram::new(),
            diversity_mean: RunningMean::default(),
            link_density_mean: RunningMean::default(),
            clustering_mean: RunningMean::default(),
            event_sink,
        })
    }

    // ------------------------------------------------------------------------
    // time step
    // ------------------------------------------------------------------------

    /// Immigrate one species, wire it at random, resolve the cascade and
    /// record the step.
    pub fn step(&mut self) -> StepReport {
        let previous = self.diversity();
        let immigrant = self.immigrate();

        let existing: Vec<SpeciesId> = self.live.iter().copied().collect();
        for other in existing {
            // always two uniform draws per existing species, a normal only on success
            if self.rng.uniform() < self.connectance {
                let weight = self.rng.normal();
                self.form_interaction(immigrant, other, weight);
            }
            if self.rng.uniform() < self.connectance {
                let weight = self.rng.normal();
                self.form_interaction(other, immigrant, weight);
            }
        }

        self.finish_step(previous, immigrant)
    }

    /// Same as `step` with the immigrant's interactions given instead of
    /// drawn. No random draws are consumed. Partners must be alive; nothing is
    /// changed when one is not.
    pub fn step_with(&mut self, interactions: &[Interaction]) -> Result<StepReport, GraphError> {
        if let Some(missing) = interactions
            .iter()
            .map(Interaction::partner)
            .find(|id| !self.live.contains(id))
        {
            return Err(GraphError::UnknownSpecies(missing));
        }

        let previous = self.diversity();
        let immigrant = self.immigrate();

        for interaction in interactions {
            match *interaction {
                Interaction::From { source, weight } => {
                    self.form_interaction(source, immigrant, weight)
                }
                Interaction::To { target, weight } => {
                    self.form_interaction(immigrant, target, weight)
                }
            }
        }

        Ok(self.finish_step(previous, immigrant))
    }

    fn immigrate(&mut self) -> SpeciesId {
        let id = self.current_time;
        self.arena.insert(Species::new(id));
        self.event_sink
            .log(self.current_time, Event::Immigrated { species: id });
        trace!("{}: immigrant {}", self.current_time, id);
        id
    }

    fn form_interaction(&mut self, from: SpeciesId, to: SpeciesId, weight: Weight) {
        self.arena.connect(from, to, weight);
        self.event_sink.log(
            self.current_time,
            Event::InteractionFormed { from, to, weight },
        );

        // the immigrant is checked once its wiring is complete
        if self.live.contains(&to) && self.is_eligible(to) {
            self.cascade.insert(to);
        }
    }

    fn finish_step(&mut self, previous: usize, immigrant: SpeciesId) -> StepReport {
        self.live.insert(immigrant);
        if self.is_eligible(immigrant) {
            self.cascade.insert(immigrant);
        }

        let extinct = self.resolve_cascade();

        let diversity = self.diversity();
        let extinction_size = (previous + 1 - diversity) as u64;
        self.extinction_histo.add(extinction_size);
        self.diversity_histo.add(diversity as u64);

        if extinction_size > 0 {
            debug!(
                "{}: avalanche of {} (diversity {})",
                self.current_time, extinction_size, diversity
            );
        }
        self.event_sink.log(
            self.current_time,
            Event::AvalancheResolved {
                size: extinction_size,
                diversity,
            },
        );

        let report = StepReport {
            time: self.current_time,
            immigrant,
            extinct,
            extinction_size,
            diversity,
        };
        self.current_time += 1;
        report
    }

    /// Remove the most negative candidate until none is left. Every removal
    /// shrinks the live set, so at most `live.len()` iterations run.
    fn resolve_cascade(&mut self) -> Vec<SpeciesId> {
        let bound = self.live.len();
        let mut extinct = Vec::new();

        while let Some(victim) = self.select_victim() {
            assert!(
                extinct.len() < bound,
                "cascade at t={} exceeded {} removals",
                self.current_time,
                bound
            );
            self.extinguish(victim);
            extinct.push(victim);
        }

        self.cascade.clear();
        extinct
    }

    /// Candidate with the strictly smallest negative fitness; ties go to the
    /// earliest immigrant. Candidates that recovered are skipped.
    fn select_victim(&self) -> Option<SpeciesId> {
        let mut min = 0.0;
        let mut victim = None;

        for &id in &self.cascade {
            let species = self.live_species(id);
            if species.is_extinction_eligible() && species.fitness() < min {
                min = species.fitness();
                victim = Some(id);
            }
        }
        victim
    }

    fn extinguish(&mut self, victim: SpeciesId) {
        self.live.remove(&victim);
        self.cascade.remove(&victim);

        let species = self.arena.sever_all_edges(victim, &mut self.cascade);
        let lifetime = self.current_time - species.immigration_time();
        self.lifetime_histo.add(lifetime);

        self.event_sink.log(
            self.current_time,
            Event::Extinct {
                species: victim,
                fitness: species.fitness(),
                lifetime,
            },
        );
    }

    fn is_eligible(&self, id: SpeciesId) -> bool {
        self.arena
            .get(id)
            .map_or(false, Species::is_extinction_eligible)
    }

    fn live_species(&self, id: SpeciesId) -> &Species {
        self.arena
            .get(id)
            .unwrap_or_else(|| panic!("species {} is not alive", id))
    }

    // ------------------------------------------------------------------------
    // metrics
    // ------------------------------------------------------------------------

    pub fn diversity(&self) -> usize {
        self.live.len()
    }

    /// Realised fraction of the n(n-1) possible directed edges, None for n <= 1
    pub fn link_density(&self) -> Option<f64> {
        let n = self.diversity();
        if n <= 1 {
            return None;
        }
        let links: usize = self
            .live
            .iter()
            .map(|id| self.live_species(*id).out_degree())
            .sum();
        Some(links as f64 / (n * (n - 1)) as f64)
    }

    pub fn local_clustering_coefficient(&self, id: SpeciesId) -> Option<f64> {
        self.live
            .contains(&id)
            .then(|| self.arena.local_clustering_coefficient(id))
    }

    /// Mean local clustering coefficient over the live population, 0 if empty
    pub fn mean_clustering_coefficient(&self) -> f64 {
        if self.live.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .live
            .iter()
            .map(|id| self.arena.local_clustering_coefficient(*id))
            .sum();
        total / self.live.len() as f64
    }

    /// In-degree and out-degree distributions of the live population
    pub fn degree_histograms(&self) -> (Histogram, Histogram) {
        let mut in_degrees = Histogram::new();
        let mut out_degrees = Histogram::new();
        for id in &self.live {
            let species = self.live_species(*id);
            in_degrees.add(species.in_degree() as u64);
            out_degrees.add(species.out_degree() as u64);
        }
        (in_degrees, out_degrees)
    }

    // ------------------------------------------------------------------------
    // measurement
    // ------------------------------------------------------------------------

    /// Start the measurement phase: histograms and averages start from zero
    pub fn begin_measurement(&mut self) {
        info!("t : {} starting measurement", self.current_time);
        self.extinction_histo.clear();
        self.diversity_histo.clear();
        self.lifetime_histo.clear();
        self.diversity_mean.reset();
        self.link_density_mean.reset();
        self.clustering_mean.reset();
    }

    /// Add the current state to the running averages
    pub fn accumulate_averages(&mut self, metrics: &MetricsConfig) {
        self.diversity_mean.add(self.diversity() as f64);
        if metrics.link_density {
            if let Some(density) = self.link_density() {
                self.link_density_mean.add(density);
            }
        }
        if metrics.clustering {
            let cc = self.mean_clustering_coefficient();
            self.clustering_mean.add(cc);
        }
    }

    pub fn summary(&self, metrics: &MetricsConfig) -> Summary {
        Summary {
            diversity: self.diversity_mean.mean(),
            link_density: metrics.link_density.then(|| self.link_density_mean.mean()),
            clustering: metrics.clustering.then(|| self.clustering_mean.mean()),
        }
    }

    // ------------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------------

    pub fn current_time(&self) -> DgTime {
        self.current_time
    }

    pub fn connectance(&self) -> f64 {
        self.connectance
    }

    pub fn species(&self, id: SpeciesId) -> Option<&Species> {
        self.arena.get(id)
    }

    /// Live species ids, ascending by immigration time
    pub fn live_ids(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.live.iter().copied()
    }

    pub fn extinction_histo(&self) -> &Histogram {
        &self.extinction_histo
    }

    pub fn diversity_histo(&self) -> &Histogram {
        &self.diversity_histo
    }

    pub fn lifetime_histo(&self) -> &Histogram {
        &self.lifetime_histo
    }

    /// Full bookkeeping check between steps
    pub fn check_consistency(&self) -> Result<(), GraphError> {
        self.arena.check_consistency()?;

        if self.arena.len() != self.live.len() {
            return Err(GraphError::Inconsistent {
                species: self.current_time,
                reason: format!(
                    "{} stored species but {} live",
                    self.arena.len(),
                    self.live.len()
                ),
            });
        }
        for id in &self.live {
            let species = self.species(*id).ok_or(GraphError::UnknownSpecies(*id))?;
            if species.is_extinction_eligible() {
                return Err(GraphError::Inconsistent {
                    species: *id,
                    reason: "extinction eligible species survived the cascade".to_string(),
                });
            }
        }
        if !self.cascade.is_empty() {
            return Err(GraphError::Inconsistent {
                species: self.current_time,
                reason: "cascade candidates left over between steps".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dg_events::CollectorEventSink;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Replays fixed draws, panics when the script runs out
    struct ScriptedRandom {
        uniforms: VecDeque<f64>,
        normals: VecDeque<f64>,
    }

    impl ScriptedRandom {
        fn new(uniforms: &[f64], normals: &[f64]) -> Self {
            Self {
                uniforms: uniforms.iter().copied().collect(),
                normals: normals.iter().copied().collect(),
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn uniform(&mut self) -> f64 {
            self.uniforms.pop_front().expect("uniform script exhausted")
        }

        fn normal(&mut self) -> f64 {
            self.normals.pop_front().expect("normal script exhausted")
        }
    }

    fn prescribed_graph() -> DynamicalGraph<ScriptedRandom> {
        DynamicalGraph::new_with_rng(ScriptedRandom::new(&[], &[]), 0.5).unwrap()
    }

    #[test]
    fn test_rejects_invalid_connectance() {
        assert!(DynamicalGraph::new(1, 1.01).is_err());
        assert!(DynamicalGraph::new(1, -0.5).is_err());
        assert!(DynamicalGraph::new(1, f64::NAN).is_err());
    }

    #[test]
    fn test_zero_connectance_never_dies() {
        let mut graph = DynamicalGraph::new(5, 0.0).unwrap();

        for t in 0..500u64 {
            let report = graph.step();
            assert_eq!(report.time, t);
            assert!(report.extinct.is_empty());
        }

        assert_eq!(graph.diversity(), 500);
        assert_eq!(graph.extinction_histo().get(0), 500);
        assert_eq!(graph.extinction_histo().total(), 500);
        assert!(graph.lifetime_histo().is_empty());
        assert!(graph
            .live_ids()
            .all(|id| graph.species(id).unwrap().fitness() == 0.0
                && graph.species(id).unwrap().in_degree() == 0));
        assert_eq!(graph.link_density(), Some(0.0));
        graph.check_consistency().unwrap();
    }

    #[test]
    fn test_two_species_forced_negative_edge() {
        // t=1: existing species 0 gets no edge from the immigrant (0.9 >= 0.5)
        // but sends one with weight -5 (0.1 < 0.5)
        let rng = ScriptedRandom::new(&[0.9, 0.1], &[-5.0]);
        let mut graph = DynamicalGraph::new_with_rng(rng, 0.5).unwrap();

        let first = graph.step();
        assert_eq!(first.immigrant, 0);
        assert_eq!(first.diversity, 1);

        let second = graph.step();
        assert_eq!(second.immigrant, 1);
        assert_eq!(second.extinct, vec![1]);
        assert_eq!(second.diversity, 1);
        assert_eq!(second.extinction_size, 1);
        assert_eq!(graph.lifetime_histo().get(0), 1);
        assert_eq!(graph.lifetime_histo().total(), 1);

        // the sender lost its back-reference
        assert_eq!(graph.species(0).unwrap().out_degree(), 0);
        graph.check_consistency().unwrap();
    }

    #[test]
    fn test_secondary_extinction_in_same_step() {
        let mut graph = prescribed_graph();

        graph.step_with(&[]).unwrap(); // 0
        graph
            .step_with(&[Interaction::From { source: 0, weight: 1.0 }])
            .unwrap(); // 1, fitness 1
        graph
            .step_with(&[
                Interaction::From { source: 0, weight: -1.0 },
                Interaction::From { source: 1, weight: 2.0 },
            ])
            .unwrap(); // 2, fitness 1, depends on 1
        assert_eq!(graph.diversity(), 3);

        // 3 pushes 1 to -2; losing 1 leaves 2 at -1
        let report = graph
            .step_with(&[Interaction::To { target: 1, weight: -3.0 }])
            .unwrap();

        assert_eq!(report.extinct, vec![1, 2]);
        assert_eq!(report.extinction_size, 2);
        assert_eq!(report.diversity, 2);
        assert_eq!(graph.live_ids().collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(graph.extinction_histo().get(2), 1);
        assert_eq!(graph.lifetime_histo().get(2), 1);
        assert_eq!(graph.lifetime_histo().get(1), 1);
        graph.check_consistency().unwrap();
    }

    #[test]
    fn test_tie_breaks_to_earliest_immigrant() {
        let mut graph = prescribed_graph();

        graph.step_with(&[]).unwrap(); // 0
        graph.step_with(&[]).unwrap(); // 1
        graph
            .step_with(&[
                Interaction::From { source: 0, weight: -1.0 },
                Interaction::From { source: 1, weight: 1.0 },
            ])
            .unwrap(); // 2, fitness 0
        assert_eq!(graph.diversity(), 3);

        // 0 and 2 both drop to -1; removing 0 first lifts 2 back to 0
        let report = graph
            .step_with(&[
                Interaction::To { target: 0, weight: -1.0 },
                Interaction::To { target: 2, weight: -1.0 },
            ])
            .unwrap();

        assert_eq!(report.extinct, vec![0]);
        assert_eq!(report.diversity, 3);
        assert_eq!(report.extinction_size, 1);
        assert!(graph.species(2).unwrap().fitness().abs() < 1e-12);
        graph.check_consistency().unwrap();
    }

    #[test]
    fn test_most_negative_goes_first() {
        let mut graph = prescribed_graph();

        graph.step_with(&[]).unwrap(); // 0
        graph.step_with(&[]).unwrap(); // 1
        let report = graph
            .step_with(&[
                Interaction::To { target: 0, weight: -0.5 },
                Interaction::To { target: 1, weight: -2.0 },
            ])
            .unwrap();

        assert_eq!(report.extinct, vec![1, 0]);
    }

    #[test]
    fn test_step_with_unknown_partner_changes_nothing() {
        let mut graph = prescribed_graph();
        graph.step_with(&[]).unwrap();

        let result = graph.step_with(&[Interaction::From { source: 7, weight: 1.0 }]);
        assert_eq!(result, Err(GraphError::UnknownSpecies(7)));

        // the immigrant's own id is not a valid partner either
        let result = graph.step_with(&[Interaction::To { target: 1, weight: 1.0 }]);
        assert_eq!(result, Err(GraphError::UnknownSpecies(1)));

        assert_eq!(graph.current_time(), 1);
        assert_eq!(graph.diversity(), 1);
        assert_eq!(graph.diversity_histo().total(), 1);
        graph.check_consistency().unwrap();
    }

    #[test]
    fn test_random_runs_keep_invariants() {
        for seed in 0..4u64 {
            let mut graph = DynamicalGraph::new(seed, 0.25).unwrap();

            for _ in 0..600 {
                let before = graph.diversity();
                let report = graph.step();

                assert!(report.extinct.len() <= before + 1);
                assert_eq!(report.extinction_size as usize, report.extinct.len());
                assert_eq!(report.diversity, before + 1 - report.extinct.len());
                for id in &report.extinct {
                    assert!(graph.species(*id).is_none());
                }
                graph.check_consistency().unwrap();
            }

            let cc = graph.mean_clustering_coefficient();
            assert!((0.0..=1.0).contains(&cc));
            for id in graph.live_ids().collect::<Vec<_>>() {
                let local = graph.local_clustering_coefficient(id).unwrap();
                assert!((0.0..=1.0).contains(&local), "cc {} of {}", local, id);
            }
        }
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let mut a = DynamicalGraph::new(99, 0.2).unwrap();
        let mut b = DynamicalGraph::new(99, 0.2).unwrap();

        for _ in 0..1500 {
            assert_eq!(a.step(), b.step());
        }

        assert_eq!(a.lifetime_histo(), b.lifetime_histo());
        assert_eq!(a.diversity_histo(), b.diversity_histo());
        assert_eq!(a.extinction_histo(), b.extinction_histo());
        assert_eq!(
            a.mean_clustering_coefficient().to_bits(),
            b.mean_clustering_coefficient().to_bits()
        );
    }

    #[test]
    fn test_full_connectance_wires_every_pair() {
        let sink = Rc::new(RefCell::new(CollectorEventSink::new()));
        let mut graph =
            DynamicalGraph::new_with_sink(SeededRandom::new(3), 1.0, Box::new(sink.clone()))
                .unwrap();

        for _ in 0..50 {
            let before = graph.diversity();
            let t = graph.current_time();
            graph.step();

            let formed = sink.borrow().in_time_range(t, t).filter(|r| {
                matches!(r.event, Event::InteractionFormed { .. })
            }).count();
            assert_eq!(formed, 2 * before);
        }
    }

    #[test]
    fn test_link_density() {
        let mut graph = prescribed_graph();
        assert_eq!(graph.link_density(), None);

        graph.step_with(&[]).unwrap();
        assert_eq!(graph.link_density(), None);

        graph
            .step_with(&[
                Interaction::From { source: 0, weight: 1.0 },
                Interaction::To { target: 0, weight: 1.0 },
            ])
            .unwrap();
        assert_eq!(graph.link_density(), Some(1.0));

        graph.step_with(&[]).unwrap();
        // 2 of 6 possible directed edges
        assert!((graph.link_density().unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_population_metrics() {
        let graph = prescribed_graph();
        assert_eq!(graph.diversity(), 0);
        assert_eq!(graph.mean_clustering_coefficient(), 0.0);
        assert_eq!(graph.local_clustering_coefficient(0), None);
        let (ins, outs) = graph.degree_histograms();
        assert!(ins.is_empty() && outs.is_empty());
    }

    #[test]
    fn test_degree_histograms() {
        let mut graph = prescribed_graph();
        graph.step_with(&[]).unwrap();
        graph.step_with(&[]).unwrap();
        graph
            .step_with(&[
                Interaction::From { source: 0, weight: 1.0 },
                Interaction::From { source: 1, weight: 1.0 },
            ])
            .unwrap();

        let (ins, outs) = graph.degree_histograms();
        assert_eq!(ins.get(0), 2);
        assert_eq!(ins.get(2), 1);
        assert_eq!(outs.get(1), 2);
        assert_eq!(outs.get(0), 1);
    }

    #[test]
    fn test_measurement_resets_and_averages() {
        let metrics = MetricsConfig {
            link_density: true,
            clustering: true,
        };
        let mut graph = DynamicalGraph::new(11, 0.0).unwrap();
        for _ in 0..10 {
            graph.step();
        }
        graph.begin_measurement();
        assert!(graph.diversity_histo().is_empty());
        assert!(graph.extinction_histo().is_empty());

        for _ in 0..2 {
            graph.step();
            graph.accumulate_averages(&metrics);
        }

        let summary = graph.summary(&metrics);
        assert!((summary.diversity - 11.5).abs() < 1e-12);
        assert_eq!(summary.link_density, Some(0.0));
        assert_eq!(summary.clustering, Some(0.0));
        assert_eq!(graph.diversity_histo().total(), 2);

        let disabled = MetricsConfig {
            link_density: false,
            clustering: false,
        };
        let summary = graph.summary(&disabled);
        assert_eq!(summary.link_density, None);
        assert_eq!(summary.clustering, None);
    }

    #[test]
    fn test_link_density_average_skips_undefined() {
        let metrics = MetricsConfig {
            link_density: true,
            clustering: false,
        };
        let mut graph = prescribed_graph();

        graph.step_with(&[]).unwrap();
        graph.accumulate_averages(&metrics); // n = 1, not sampled
        graph
            .step_with(&[Interaction::From { source: 0, weight: 1.0 }])
            .unwrap();
        graph.accumulate_averages(&metrics); // 1 / 2

        let summary = graph.summary(&metrics);
        assert_eq!(summary.link_density, Some(0.5));
        assert!((summary.diversity - 1.5).abs() < 1e-12);
    }
}
