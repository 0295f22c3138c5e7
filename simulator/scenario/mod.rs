//! Scenario support for the simulator binaries
//!
//! - YAML scenario files (`file`)
//! - CSV export of engine events (`event_sinks`)
//! - Console reports of finished runs (`report`)

pub mod event_sinks;
pub mod file;
pub mod report;

pub use event_sinks::CsvEventSink;
pub use file::ScenarioFile;
pub use report::print_summary;
