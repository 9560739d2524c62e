//! Micromap usage histograms
//!
//! A histogram counts how many primitives reference a micromap of each
//! (format, subdivision level) pair. The acceleration-structure builder sizes
//! its scratch memory from these counts, so they must match the index buffer
//! exactly.

use serde::{Deserialize, Serialize};

use crate::OmmFormat;

/// Number of references to micromaps of one (format, level) pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageCount {
    pub count: u32,
    pub subdivision_level: u16,
    pub format: OmmFormat,
}

/// Collection of usage counts, at most one entry per (format, level)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageHistogram {
    counts: Vec<UsageCount>,
}

impl UsageHistogram {
    /// Create an empty histogram
    pub fn new() -> Self {
        Self { counts: Vec::new() }
    }

    /// Build a histogram from raw entries, merging duplicate buckets
    pub fn from_counts(counts: impl IntoIterator<Item = UsageCount>) -> Self {
        let mut histogram = Self::new();
        for entry in counts {
            histogram.add(entry.format, entry.subdivision_level, entry.count);
        }
        histogram
    }

    /// Add `count` references to the (format, level) bucket
    pub fn add(&mut self, format: OmmFormat, subdivision_level: u16, count: u32) {
        match self
            .counts
            .iter_mut()
            .find(|c| c.format == format && c.subdivision_level == subdivision_level)
        {
            Some(entry) => entry.count += count,
            None => self.counts.push(UsageCount {
                count,
                subdivision_level,
                format,
            }),
        }
    }

    /// Merge another histogram into this one
    ///
    /// Addition per bucket, so partial histograms can be merged in any order.
    pub fn merge(&mut self, other: &UsageHistogram) {
        for entry in &other.counts {
            self.add(entry.format, entry.subdivision_level, entry.count);
        }
    }

    /// Count for a bucket (zero if absent)
    pub fn count(&self, format: OmmFormat, subdivision_level: u16) -> u32 {
        self.counts
            .iter()
            .find(|c| c.format == format && c.subdivision_level == subdivision_level)
            .map_or(0, |c| c.count)
    }

    /// Sum over all buckets
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.count as u64).sum()
    }

    /// Raw entries in insertion order
    pub fn counts(&self) -> &[UsageCount] {
        &self.counts
    }

    /// Non-empty buckets sorted by (format, level)
    pub fn normalized(&self) -> Vec<UsageCount> {
        let mut sorted: Vec<UsageCount> = self.counts.iter().copied().filter(|c| c.count > 0).collect();
        sorted.sort_by_key(|c| (c.format, c.subdivision_level));
        sorted
    }

    /// Whether both histograms describe the same non-zero counts, ignoring order
    pub fn matches(&self, other: &UsageHistogram) -> bool {
        self.normalized() == other.normalized()
    }

    /// Check if the histogram has no entries
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
