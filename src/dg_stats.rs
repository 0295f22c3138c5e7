//! Statistics and results collected over the measurement phase

use serde::Serialize;

use crate::dg_interface::DgTime;

/// Running sum/count pair for a time-averaged quantity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    sum: f64,
    count: u64,
}

impl RunningMean {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of all samples, 0 when nothing was sampled
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Time averages over the measurement phase, written as the summary record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub diversity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_density: Option<f64>,
    #[serde(rename = "CC", skip_serializing_if = "Option::is_none")]
    pub clustering: Option<f64>,
}

/// One time-series row
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: DgTime,
    pub diversity: usize,
    /// Present when enabled; 0 while link density is undefined (n <= 1)
    pub link_density: Option<f64>,
    pub clustering: Option<f64>,
}
