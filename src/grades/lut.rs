//! Compressed sorted-sample lookup tables
//!
//! One `DivisionStatistics` accumulator is built per division/season pass:
//! every team's metric samples are appended with `accumulate`, then the
//! whole thing is frozen once with `finalize` and treated as immutable.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

/// Comparison tolerance for stored sample values. Storage and query paths
/// may disagree by floating-point noise around 1e-10; exact-match detection
/// has to survive that.
pub const VALUE_EPS: f64 = 1e-8;

/// Compressed LUT for one metric.
///
/// While building, each bucket holds pending raw values in arrival order.
/// After `finalize` each bucket is `[start_rank_offset, v1, v2, ...]` with
/// the values ascending and the offset equal to the count of samples in all
/// buckets with smaller keys. Concatenating buckets in key order yields the
/// full sorted population of `size` samples.
#[derive(Debug, Clone)]
pub struct MetricLut {
    /// Percentage-scale metric: bucket keys use `floor(value * 100)`
    pub is_pct: bool,
    /// Smallest sample seen
    pub min: f64,
    /// Total sample count
    pub size: usize,
    /// Bucket key -> bucket array
    pub lut: BTreeMap<i64, Vec<f64>>,
    finalized: bool,
}

impl MetricLut {
    pub fn new(is_pct: bool) -> Self {
        MetricLut {
            is_pct,
            min: f64::INFINITY,
            size: 0,
            lut: BTreeMap::new(),
            finalized: false,
        }
    }

    /// Bucket key for a value: `floor(value)`, scaled x100 first for
    /// percentage metrics
    pub fn bucket_key(&self, value: f64) -> i64 {
        let v = if self.is_pct { value * 100.0 } else { value };
        v.floor() as i64
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn push(&mut self, value: f64) {
        let key = self.bucket_key(value);
        self.lut.entry(key).or_default().push(value);
        self.size += 1;
        if value < self.min {
            self.min = value;
        }
    }

    fn freeze(&mut self) {
        let mut offset = 0usize;
        for bucket in self.lut.values_mut() {
            bucket.sort_by(f64::total_cmp);
            let count = bucket.len();
            bucket.insert(0, offset as f64);
            offset += count;
        }
        self.finalized = true;
    }
}

/// Per-metric sample population for one division/season.
///
/// This is the one deliberate piece of mutable shared state in the core:
/// the aggregation pass mutates it through `accumulate`, freezes it with
/// `finalize`, and from then on it only answers queries.
#[derive(Debug, Clone, Default)]
pub struct DivisionStatistics {
    metrics: HashMap<String, MetricLut>,
}

impl DivisionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample to a metric's pending population.
    ///
    /// Non-finite values are dropped; calls after `finalize` are ignored.
    pub fn accumulate(&mut self, metric: &str, value: f64, is_pct: bool) {
        if !value.is_finite() {
            debug!("dropping non-finite sample for {}", metric);
            return;
        }
        let lut = self
            .metrics
            .entry(metric.to_string())
            .or_insert_with(|| MetricLut::new(is_pct));
        if lut.is_finalized() {
            warn!("accumulate called on finalized LUT for {}", metric);
            return;
        }
        lut.push(value);
    }

    /// Sort every bucket and compute start-rank offsets. Runs once, after
    /// all `accumulate` calls for the pass.
    pub fn finalize(&mut self) {
        for (name, lut) in self.metrics.iter_mut() {
            if lut.is_finalized() {
                continue;
            }
            lut.freeze();
            debug!(
                "finalized LUT for {}: {} samples in {} buckets",
                name,
                lut.size,
                lut.lut.len()
            );
        }
    }

    pub fn metric(&self, name: &str) -> Option<&MetricLut> {
        self.metrics.get(name)
    }
}
