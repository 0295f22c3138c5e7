// CSV export of engine events

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use dg_rust::{DgTime, Event, EventSink};

/// CSV event sink for structured data export
pub struct CsvEventSink {
    writer: BufWriter<File>,
}

impl CsvEventSink {
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // Write CSV header
        writeln!(writer, "time,event_type,species,related,value")?;

        Ok(Self { writer })
    }
}

impl EventSink for CsvEventSink {
    fn log(&mut self, time: DgTime, event: Event) {
        let result = match event {
            Event::Immigrated { species } => {
                writeln!(self.writer, "{},Immigrated,{},,", time, species)
            }
            Event::InteractionFormed { from, to, weight } => {
                writeln!(self.writer, "{},Interaction,{},{},{}", time, from, to, weight)
            }
            Event::Extinct {
                species,
                fitness,
                lifetime,
            } => writeln!(
                self.writer,
                "{},Extinct,{},{},{}",
                time, species, lifetime, fitness
            ),
            Event::AvalancheResolved { size, diversity } => {
                writeln!(self.writer, "{},Avalanche,,{},{}", time, diversity, size)
            }
        };

        if let Err(e) = result {
            eprintln!("Error writing to CSV: {}", e);
        }
    }
}

impl Drop for CsvEventSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
