// all the same numeric type: a species is identified by the step it immigrated in
pub type DgTime = u64;
pub type SpeciesId = DgTime;
pub type Weight = f64;

/// Samples emitted to the time series every this many steps
pub const SAMPLE_INTERVAL: DgTime = 1024;

// ============================================================================
// Event Logging System
// ============================================================================

/// Events emitted by the population controller for debugging and analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new species entered the population
    Immigrated { species: SpeciesId },
    /// A directed interaction was formed while wiring an immigrant
    InteractionFormed {
        from: SpeciesId,
        to: SpeciesId,
        weight: Weight,
    },
    /// A species was removed by the selection cascade
    Extinct {
        species: SpeciesId,
        fitness: f64,
        lifetime: DgTime,
    },
    /// The cascade of one step finished
    AvalancheResolved { size: u64, diversity: usize },
}

/// Trait for consuming events from the population controller
pub trait EventSink {
    fn log(&mut self, time: DgTime, event: Event);
}

/// No-op event sink for production use (zero overhead)
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _time: DgTime, _event: Event) {}
}
