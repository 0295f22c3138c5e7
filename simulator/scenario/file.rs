// Scenario file format

use std::fs;
use std::path::{Path, PathBuf};

use dg_rust::{ConfigError, SimConfig};
use serde::Deserialize;

/// Simplified scenario file format
#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    pub meta: ScenarioMeta,

    /// Run configuration, missing keys keep their defaults
    #[serde(default)]
    pub config: SimConfig,

    /// Write every engine event as CSV to this file
    #[serde(default)]
    pub events_csv: Option<PathBuf>,

    /// Forward engine events to the debug log when no CSV file is set
    #[serde(default)]
    pub log_events: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hypothesis: Option<String>,
}

impl ScenarioFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let scenario: ScenarioFile = serde_yaml::from_str(&content)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Name from the metadata, else the file stem
    pub fn display_name(&self, path: &Path) -> String {
        self.meta.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scenario".to_string())
        })
    }
}
