// Simulation Configuration

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Deserialize;
use thiserror::Error;

use crate::dg_interface::{DgTime, SAMPLE_INTERVAL};

pub const USAGE: &str = "<connectance> <t_init> <t_measure> <seed> | <connectance> <tmax> <seed>";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("usage: {program} {usage}", usage = USAGE)]
    Usage { program: String },

    #[error("invalid {name}: {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("connectance must lie in [0, 1], got {0}")]
    ConnectanceOutOfRange(f64),

    #[error("t_init {t_init} plus t_measure {t_measure} overflows the time counter")]
    HorizonOverflow { t_init: DgTime, t_measure: DgTime },

    #[error("sample interval must be positive")]
    ZeroSampleInterval,

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

// ============================================================================
// Main Configuration
// ============================================================================

/// Main configuration for a dynamical graph run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Per-direction, per-pair probability that an interaction forms
    pub connectance: f64,

    /// Burn-in and measurement durations
    pub horizon: Horizon,

    /// Random seed (None = generate random)
    pub seed: Option<u64>,

    /// Time-series rows are emitted every this many steps
    pub sample_interval: DgTime,

    /// Which averaged metrics are computed
    pub metrics: MetricsConfig,

    /// Where results are written
    pub output: OutputConfig,
}

/// Run horizon, either phased or a single measured duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Horizon {
    /// Histograms are cleared after `t_init` steps, averages cover `t_measure`
    Phased { t_init: DgTime, t_measure: DgTime },
    /// Every step is measured
    Total { tmax: DgTime },
}

impl Horizon {
    pub fn t_init(&self) -> DgTime {
        match self {
            Horizon::Phased { t_init, .. } => *t_init,
            Horizon::Total { .. } => 0,
        }
    }

    pub fn t_measure(&self) -> DgTime {
        match self {
            Horizon::Phased { t_measure, .. } => *t_measure,
            Horizon::Total { tmax } => *tmax,
        }
    }

    /// None when the sum overflows
    pub fn checked_total(&self) -> Option<DgTime> {
        self.t_init().checked_add(self.t_measure())
    }

    /// Validated horizons never saturate
    pub fn total(&self) -> DgTime {
        self.t_init().saturating_add(self.t_measure())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Average and sample link density
    pub link_density: bool,
    /// Average and sample the mean local clustering coefficient
    pub clustering: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory all output files are written into
    pub directory: PathBuf,
    /// Write the periodic time series
    pub timeseries: bool,
    /// Also write the log-binned lifetime distribution
    pub log_binned_lifetime: bool,
}

// ============================================================================
// Default Configurations
// ============================================================================

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            connectance: 0.2,
            horizon: Horizon::default(),
            seed: None,
            sample_interval: SAMPLE_INTERVAL,
            metrics: MetricsConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon::Phased {
            t_init: 1024,
            t_measure: 65536,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            link_density: true,
            clustering: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            timeseries: true,
            log_binned_lifetime: false,
        }
    }
}

impl SimConfig {
    /// Parse `<connectance> <t_init> <t_measure> <seed>` or
    /// `<connectance> <tmax> <seed>`; `args[0]` is the program name.
    pub fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        let program = args
            .first()
            .cloned()
            .unwrap_or_else(|| "dynamical_graph".to_string());

        let (connectance, horizon, seed) = match args.len() {
            5 => (
                parse_number::<f64>("connectance", &args[1])?,
                Horizon::Phased {
                    t_init: parse_number("t_init", &args[2])?,
                    t_measure: parse_number("t_measure", &args[3])?,
                },
                parse_number::<u64>("seed", &args[4])?,
            ),
            4 => (
                parse_number::<f64>("connectance", &args[1])?,
                Horizon::Total {
                    tmax: parse_number("tmax", &args[2])?,
                },
                parse_number::<u64>("seed", &args[3])?,
            ),
            _ => return Err(ConfigError::Usage { program }),
        };

        let config = Self {
            connectance,
            horizon,
            seed: Some(seed),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.connectance) {
            // NaN also fails the range check
            return Err(ConfigError::ConnectanceOutOfRange(self.connectance));
        }
        if self.horizon.checked_total().is_none() {
            return Err(ConfigError::HorizonOverflow {
                t_init: self.horizon.t_init(),
                t_measure: self.horizon.t_measure(),
            });
        }
        if self.sample_interval == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        Ok(())
    }

    /// Get or generate seed
    pub fn resolve_seed(&self) -> u64 {
        self.seed
            .unwrap_or_else(|| StdRng::from_entropy().next_u64())
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_phased_arguments() {
        let config = SimConfig::from_args(&args(&["dg", "0.3", "100", "2000", "7"])).unwrap();

        assert_eq!(config.connectance, 0.3);
        assert_eq!(
            config.horizon,
            Horizon::Phased {
                t_init: 100,
                t_measure: 2000
            }
        );
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.horizon.total(), 2100);
    }

    #[test]
    fn test_total_arguments() {
        let config = SimConfig::from_args(&args(&["dg", "0.1", "500", "1"])).unwrap();

        assert_eq!(config.horizon, Horizon::Total { tmax: 500 });
        assert_eq!(config.horizon.t_init(), 0);
        assert_eq!(config.horizon.t_measure(), 500);
    }

    #[test]
    fn test_wrong_argument_count() {
        let result = SimConfig::from_args(&args(&["dg", "0.1"]));
        assert!(matches!(result, Err(ConfigError::Usage { .. })));
    }

    #[test]
    fn test_unparseable_number() {
        let result = SimConfig::from_args(&args(&["dg", "0.1", "ten", "100", "1"]));
        match result {
            Err(ConfigError::InvalidNumber { name, value }) => {
                assert_eq!(name, "t_init");
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_negative_seed_rejected() {
        let result = SimConfig::from_args(&args(&["dg", "0.1", "10", "-3"]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber { name: "seed", .. })
        ));
    }

    #[test]
    fn test_connectance_range() {
        for bad in ["1.5", "-0.1", "NaN"] {
            let result = SimConfig::from_args(&args(&["dg", bad, "10", "1"]));
            assert!(
                matches!(result, Err(ConfigError::ConnectanceOutOfRange(_))),
                "{} accepted",
                bad
            );
        }
        assert!(SimConfig::from_args(&args(&["dg", "0", "10", "1"])).is_ok());
        assert!(SimConfig::from_args(&args(&["dg", "1", "10", "1"])).is_ok());
    }

    #[test]
    fn test_yaml_defaults_and_overrides() {
        let yaml = r#"
connectance: 0.15
horizon:
  t_init: 10
  t_measure: 20
metrics:
  clustering: false
"#;
        let config = SimConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.connectance, 0.15);
        assert_eq!(config.horizon.total(), 30);
        assert!(config.metrics.link_density);
        assert!(!config.metrics.clustering);
        assert_eq!(config.sample_interval, SAMPLE_INTERVAL);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_yaml_total_horizon() {
        let config = SimConfig::from_yaml_str("horizon:\n  tmax: 64\nseed: 9\n").unwrap();
        assert_eq!(config.horizon, Horizon::Total { tmax: 64 });
        assert_eq!(config.resolve_seed(), 9);
    }

    #[test]
    fn test_yaml_invalid_connectance() {
        let result = SimConfig::from_yaml_str("connectance: 2.0\n");
        assert!(matches!(result, Err(ConfigError::ConnectanceOutOfRange(_))));
    }

    #[test]
    fn test_zero_sample_interval() {
        let config = SimConfig {
            sample_interval: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSampleInterval)));
    }

    #[test]
    fn test_horizon_overflow_rejected() {
        let result = SimConfig::from_args(&args(&["dg", "0.1", "18446744073709551615", "5", "1"]));
        assert!(matches!(
            result,
            Err(ConfigError::HorizonOverflow {
                t_init: u64::MAX,
                t_measure: 5
            })
        ));

        let horizon = Horizon::Phased {
            t_init: u64::MAX,
            t_measure: 0,
        };
        assert_eq!(horizon.checked_total(), Some(u64::MAX));
    }
}
