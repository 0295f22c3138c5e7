// frequency tables over integer keys (diversity, extinction size, lifetime)

use std::collections::BTreeMap;
use std::io::{self, Write};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: BTreeMap<u64, u64>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: u64) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: u64) -> u64 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Count-weighted mean of the keys, None if nothing was recorded
    pub fn mean(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let weighted: f64 = self
            .counts
            .iter()
            .map(|(k, c)| *k as f64 * *c as f64)
            .sum();
        Some(weighted / total as f64)
    }

    /// (key, count) pairs, keys ascending
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.counts.iter().map(|(k, c)| (*k, *c))
    }

    /// Logarithmic binning: bin key is the largest power of two not above the
    /// key, key 0 is dropped and each bin is normalised by its width.
    pub fn log_binned(&self) -> Vec<(u64, f64)> {
        let mut bins: BTreeMap<u64, u64> = BTreeMap::new();
        for (key, count) in self.iter().filter(|(k, _)| *k > 0) {
            let bin = 1u64 << (63 - key.leading_zeros());
            *bins.entry(bin).or_insert(0) += count;
        }
        bins.into_iter()
            .map(|(bin, count)| (bin, count as f64 / bin as f64))
            .collect()
    }

    /// One `key value` line per entry, keys ascending
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (key, count) in self.iter() {
            writeln!(writer, "{} {}", key, count)?;
        }
        Ok(())
    }
}
