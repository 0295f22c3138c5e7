//! Event sinks for inspecting a running population

use log::debug;

use crate::dg_interface::{DgTime, Event, EventSink, SpeciesId};

// ============================================================================
// Logging Sink
// ============================================================================

/// Forwards events to the `log` facade at debug level
pub struct LoggingEventSink {
    enabled: bool,
}

impl LoggingEventSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl EventSink for LoggingEventSink {
    fn log(&mut self, time: DgTime, event: Event) {
        if !self.enabled {
            return;
        }

        match event {
            Event::Immigrated { species } => debug!("{:>8} immigrated   s:{}", time, species),
            Event::InteractionFormed { from, to, weight } => {
                debug!("{:>8} interaction  {} -> {} w:{:.4}", time, from, to, weight)
            }
            Event::Extinct {
                species,
                fitness,
                lifetime,
            } => debug!(
                "{:>8} extinct      s:{} f:{:.4} lifetime:{}",
                time, species, fitness, lifetime
            ),
            Event::AvalancheResolved { size, diversity } => {
                debug!("{:>8} avalanche    size:{} diversity:{}", time, size, diversity)
            }
        }
    }
}

// ============================================================================
// Collector Event Sink (In-Memory)
// ============================================================================

/// Collects events in memory for programmatic analysis
#[derive(Default)]
pub struct CollectorEventSink {
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub time: DgTime,
    pub event: Event,
}

impl CollectorEventSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Species in the order the cascade removed them
    pub fn extinctions(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.events.iter().filter_map(|r| match r.event {
            Event::Extinct { species, .. } => Some(species),
            _ => None,
        })
    }

    pub fn interactions(&self) -> impl Iterator<Item = &EventRecord> {
        self.events
            .iter()
            .filter(|r| matches!(r.event, Event::InteractionFormed { .. }))
    }

    pub fn in_time_range(&self, start: DgTime, end: DgTime) -> impl Iterator<Item = &EventRecord> {
        self.events
            .iter()
            .filter(move |r| r.time >= start && r.time <= end)
    }
}

impl EventSink for CollectorEventSink {
    fn log(&mut self, time: DgTime, event: Event) {
        self.events.push(EventRecord { time, event });
    }
}

/// Shares one collector between the graph and the test or tool that reads it
impl EventSink for std::rc::Rc<std::cell::RefCell<CollectorEventSink>> {
    fn log(&mut self, time: DgTime, event: Event) {
        self.borrow_mut().log(time, event);
    }
}
