// result files: histograms, time series and the summary record

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::dg_config::OutputConfig;
use crate::dg_histogram::Histogram;
use crate::dg_run::RunResult;
use crate::dg_stats::{Sample, Summary};

pub const LIFETIME_FILE: &str = "lifetime.dat";
pub const LIFETIME_LOGBIN_FILE: &str = "lifetime_logbin.dat";
pub const DIVERSITY_FILE: &str = "diversity_histo.dat";
pub const EXTINCTION_FILE: &str = "extinction_histo.dat";
pub const IN_DEGREE_FILE: &str = "in_degree_histo.dat";
pub const OUT_DEGREE_FILE: &str = "out_degree_histo.dat";
pub const TIMESERIES_FILE: &str = "timeseries.dat";
pub const SUMMARY_FILE: &str = "_output.json";

/// `time diversity [link_density] [cc]`, one row per line
pub fn write_timeseries<W: Write>(writer: &mut W, samples: &[Sample]) -> io::Result<()> {
    for sample in samples {
        write!(writer, "{} {}", sample.time, sample.diversity)?;
        if let Some(density) = sample.link_density {
            write!(writer, " {}", density)?;
        }
        if let Some(cc) = sample.clustering {
            write!(writer, " {}", cc)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn write_log_binned<W: Write>(writer: &mut W, histo: &Histogram) -> io::Result<()> {
    for (bin, value) in histo.log_binned() {
        writeln!(writer, "{} {}", bin, value)?;
    }
    Ok(())
}

pub fn write_summary<W: Write>(writer: &mut W, summary: &Summary) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, summary)?;
    writeln!(writer)
}

/// Write every enabled output of `result` into the configured directory
pub fn write_results(result: &RunResult, output: &OutputConfig) -> io::Result<()> {
    let dir = output.directory.as_path();
    fs::create_dir_all(dir)?;

    write_file(&dir.join(LIFETIME_FILE), |w| result.lifetime.write_to(w))?;
    write_file(&dir.join(DIVERSITY_FILE), |w| result.diversity.write_to(w))?;
    write_file(&dir.join(EXTINCTION_FILE), |w| result.extinction.write_to(w))?;
    write_file(&dir.join(IN_DEGREE_FILE), |w| result.in_degree.write_to(w))?;
    write_file(&dir.join(OUT_DEGREE_FILE), |w| result.out_degree.write_to(w))?;
    write_file(&dir.join(SUMMARY_FILE), |w| write_summary(w, &result.summary))?;

    if output.timeseries {
        write_file(&dir.join(TIMESERIES_FILE), |w| {
            write_timeseries(w, &result.samples)
        })?;
    }
    if output.log_binned_lifetime {
        write_file(&dir.join(LIFETIME_LOGBIN_FILE), |w| {
            write_log_binned(w, &result.lifetime)
        })?;
    }

    info!("results written to {}", dir.display());
    Ok(())
}

fn write_file<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()
}
