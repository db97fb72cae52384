//! Rank queries over finalized lookup tables

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use super::lut::{DivisionStatistics, MetricLut, VALUE_EPS};

/// f64 wrapper with a total order, for value-keyed maps
#[derive(Debug, Clone, Copy)]
pub struct OrdF64(pub f64);

impl PartialEq for OrdF64 {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One percentile query result. `value` is a 0..1 fraction where 1.0 is the
/// top of the population; `rank()` recovers the 1-based rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentile {
    pub value: f64,
    pub samples: usize,
}

impl Percentile {
    pub fn rank(&self) -> usize {
        (self.value * self.samples as f64).round() as usize
    }
}

/// Memo for repeated percentile queries against one frozen population,
/// keyed by metric name and the queried value's bit pattern.
#[derive(Debug, Default)]
pub struct QueryCache {
    hits: HashMap<(String, u64), Option<Percentile>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Binary search over a finalized bucket array.
///
/// `arr[0]` is the bucket's start-rank offset; `lo..=hi` is the searched
/// value range within the array. Returns `offset + p` where `p` is the
/// 0-based position of the last occurrence of `target` among ties, or the
/// insertion position when `target` is absent. Degenerate ranges return the
/// anchor `offset + lo - 1` without searching; targets outside the range
/// saturate to the smallest/largest rank in range.
pub fn binary_chop(arr: &[f64], target: f64, lo: usize, hi: usize) -> usize {
    let offset = arr[0] as usize;
    let anchor = offset + lo - 1;
    if lo >= hi {
        return anchor;
    }
    let window = &arr[lo..=hi];
    let below = window.partition_point(|&v| v < target - VALUE_EPS);
    let at_or_below = window.partition_point(|&v| v <= target + VALUE_EPS);
    let pos = if at_or_below > below {
        at_or_below - 1
    } else {
        below
    };
    anchor + pos
}

impl MetricLut {
    /// 1-based rank of `value` within the frozen population.
    ///
    /// Exact matches land on the last occurrence among ties; values between
    /// stored samples take the next higher stored rank; out-of-range values
    /// saturate to rank 1 or rank `size`.
    pub fn rank_of(&self, value: f64) -> usize {
        if self.size == 0 {
            return 0;
        }
        if value < self.min - VALUE_EPS {
            return 1;
        }
        let key = self.bucket_key(value);
        if let Some(bucket) = self.lut.get(&key) {
            let chop = binary_chop(bucket, value, 1, bucket.len() - 1);
            return (chop + 1).min(self.size);
        }
        // empty bucket: probe the next populated key upward; its offset is
        // exactly the count of samples below the queried value
        match self
            .lut
            .range((Bound::Excluded(key), Bound::Unbounded))
            .next()
        {
            Some((_, bucket)) => bucket[0] as usize + 1,
            None => self.size,
        }
    }
}

impl DivisionStatistics {
    /// Percentile of `value` within a metric's population. Unknown metric or
    /// empty population answers `None`; the caller treats that as ungraded.
    pub fn get_percentile(&self, metric: &str, value: f64) -> Option<Percentile> {
        let lut = self.metric(metric)?;
        if lut.size == 0 || !lut.is_finalized() {
            return None;
        }
        let rank = lut.rank_of(value);
        Some(Percentile {
            value: rank as f64 / lut.size as f64,
            samples: lut.size,
        })
    }

    /// `get_percentile` with a memo for repeated queries
    pub fn get_percentile_cached(
        &self,
        metric: &str,
        value: f64,
        cache: &mut QueryCache,
    ) -> Option<Percentile> {
        let key = (metric.to_string(), value.to_bits());
        if let Some(hit) = cache.hits.get(&key) {
            return *hit;
        }
        let result = self.get_percentile(metric, value);
        cache.hits.insert(key, result);
        result
    }

    /// Gap density between consecutive population values, used to place
    /// grade-boundary break points where the samples visibly thin out.
    ///
    /// Returns an ordered map of `upper_value -> (gap / range)` for every
    /// consecutive pair whose normalized gap is at least the uniform spacing
    /// `1 / (size - 1)`.
    pub fn spaces_between(&self, metric: &str) -> BTreeMap<OrdF64, f64> {
        let mut out = BTreeMap::new();
        let lut = match self.metric(metric) {
            Some(l) if l.is_finalized() && l.size >= 2 => l,
            _ => return out,
        };
        let values: Vec<f64> = lut
            .lut
            .values()
            .flat_map(|b| b[1..].iter().copied())
            .collect();
        let range = values[values.len() - 1] - values[0];
        if range <= 0.0 {
            return out;
        }
        let threshold = 1.0 / (lut.size - 1) as f64;
        for w in values.windows(2) {
            let frac = (w[1] - w[0]) / range;
            if frac >= threshold {
                out.insert(OrdF64(w[1]), frac);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_chop_contract() {
        let arr = [129.0, 0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(binary_chop(&arr, 5.0, 1, 6), 130);
        assert_eq!(binary_chop(&arr, 20.0, 1, 6), 131);
        assert_eq!(binary_chop(&arr, 22.0, 1, 6), 132);
        assert_eq!(binary_chop(&arr, 49.0, 1, 6), 134);
        // saturates high
        assert_eq!(binary_chop(&arr, 55.0, 1, 6), 135);
        // saturates low
        assert_eq!(binary_chop(&arr, -5.0, 1, 6), 129);
        // degenerate range ignores the target
        assert_eq!(binary_chop(&arr, 300.0, 3, 3), 131);
    }

    #[test]
    fn test_binary_chop_last_occurrence_among_ties() {
        let arr = [10.0, 1.0, 2.0, 2.0, 2.0, 3.0];
        // three ties at 2.0: positions 1..3, last occurrence is 3
        assert_eq!(binary_chop(&arr, 2.0, 1, 5), 13);
        assert_eq!(binary_chop(&arr, 2.5, 1, 5), 14);
    }

    /// 200-sample percentage-scale population. Ranks 1..=10 are hand-placed
    /// around 0.199-0.205 (with a tie at 0.199); the rest climb evenly.
    fn synthetic_pct_lut() -> DivisionStatistics {
        let mut values = vec![
            0.15, 0.18, 0.19, 0.198, 0.199, 0.199, 0.2, 0.204, 0.2048, 0.205,
        ];
        for i in 0..190 {
            values.push(0.21 + i as f64 * 0.004);
        }
        let mut div = DivisionStatistics::new();
        for v in values {
            div.accumulate("efg_pct", v, true);
        }
        div.finalize();
        div
    }

    #[test]
    fn test_percentile_saturation() {
        let div = synthetic_pct_lut();
        // below the minimum
        assert_eq!(div.get_percentile("efg_pct", 0.05).unwrap().rank(), 1);
        // above the maximum
        assert_eq!(div.get_percentile("efg_pct", 0.99).unwrap().rank(), 200);
    }

    #[test]
    fn test_percentile_exact_match_takes_last_tie() {
        let div = synthetic_pct_lut();
        let p = div.get_percentile("efg_pct", 0.199).unwrap();
        assert_eq!(p.samples, 200);
        assert_eq!(p.rank(), 6);
    }

    #[test]
    fn test_percentile_gap_values_take_next_rank() {
        let div = synthetic_pct_lut();
        assert_eq!(div.get_percentile("efg_pct", 0.1995).unwrap().rank(), 7);
        assert_eq!(div.get_percentile("efg_pct", 0.2035).unwrap().rank(), 8);
        assert_eq!(div.get_percentile("efg_pct", 0.20485).unwrap().rank(), 10);
    }

    #[test]
    fn test_percentile_empty_bucket_probe() {
        let div = synthetic_pct_lut();
        // bucket 17 is empty; ranks 1 (0.15) sit below, so 0.17 takes rank 2
        assert_eq!(div.get_percentile("efg_pct", 0.17).unwrap().rank(), 2);
    }

    #[test]
    fn test_percentile_unknown_metric() {
        let div = synthetic_pct_lut();
        assert!(div.get_percentile("nope", 0.5).is_none());
    }

    #[test]
    fn test_query_cache() {
        let div = synthetic_pct_lut();
        let mut cache = QueryCache::new();
        let a = div.get_percentile_cached("efg_pct", 0.199, &mut cache);
        let b = div.get_percentile_cached("efg_pct", 0.199, &mut cache);
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        assert_eq!(a.unwrap().rank(), 6);
    }

    /// 358-sample defensive-efficiency population over 89.0..111.8 with four
    /// deliberate thin spots below 92.6 and an even climb above. Returns the
    /// sorted sample values.
    fn def_eff_population() -> Vec<f64> {
        fn fill(values: &mut Vec<f64>, from: f64, to: f64, interior: usize) {
            values.push(from);
            let step = (to - from) / (interior + 1) as f64;
            for k in 1..=interior {
                values.push(from + k as f64 * step);
            }
        }
        let mut values = Vec::new();
        fill(&mut values, 89.0, 89.3357, 6);
        values.push(89.3357);
        // gap 0.0643 -> 0.28% of range
        fill(&mut values, 89.4, 90.9723, 30);
        values.push(90.9723);
        // gap 0.1277 -> 0.56%
        fill(&mut values, 91.1, 91.4531, 6);
        values.push(91.4531);
        // gap 0.4469 -> 1.96%
        values.push(91.9);
        // gap 0.7 -> 3.07%
        fill(&mut values, 92.6, 111.8, 307);
        values.push(111.8);
        values
    }

    fn def_eff_lut() -> DivisionStatistics {
        let mut div = DivisionStatistics::new();
        for v in def_eff_population() {
            div.accumulate("def_adj_ppp", v, false);
        }
        div.finalize();
        div
    }

    #[test]
    fn test_round_trip_is_dense_bijection() {
        let values = def_eff_population();
        assert_eq!(values.len(), 358);
        let div = def_eff_lut();

        for perturb in [0.0, 1e-10, -1e-10] {
            for (i, v) in values.iter().enumerate() {
                let p = div.get_percentile("def_adj_ppp", v + perturb).unwrap();
                assert_eq!(
                    p.rank(),
                    i + 1,
                    "value {} perturbed by {} missed its rank",
                    v,
                    perturb
                );
            }
        }
    }

    #[test]
    fn test_spaces_between_boundaries() {
        let div = def_eff_lut();
        let spaces = div.spaces_between("def_adj_ppp");
        assert_eq!(spaces.len(), 4);

        let entries: Vec<(f64, String)> = spaces
            .iter()
            .map(|(k, v)| (k.0, format!("{:.2}%", v * 100.0)))
            .collect();
        let expected = [
            (89.4, "0.28%"),
            (91.1, "0.56%"),
            (91.9, "1.96%"),
            (92.6, "3.07%"),
        ];
        for ((key, frac), (want_key, want_frac)) in entries.iter().zip(expected.iter()) {
            assert!((key - want_key).abs() < 1e-9, "key {} != {}", key, want_key);
            assert_eq!(frac, want_frac);
        }
    }

    #[test]
    fn test_spaces_between_unknown_metric_is_empty() {
        let div = def_eff_lut();
        assert!(div.spaces_between("off_adj_ppp").is_empty());
    }
}
