//! Keyed mean accumulation with per-column missing-value exclusion.
//!
//! Every aggregate in this crate reduces to "mean of the present values per
//! key", so the accumulator lives here once and stays easy to test. Keys are
//! collected into a `BTreeMap` so output ordering never depends on hash order.

use std::collections::BTreeMap;

/// Running mean over the values actually observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAcc {
    sum: f64,
    n: usize,
}

impl MeanAcc {
    pub fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    /// `None` until at least one value has been observed.
    pub fn mean(&self) -> Option<f64> {
        if self.n == 0 {
            None
        } else {
            Some(self.sum / self.n as f64)
        }
    }
}

/// Group optional values by key and return `(key, mean)` pairs in key order.
///
/// A `None` value still creates the group but contributes nothing to it;
/// groups that end up with no observed values are dropped entirely.
pub fn mean_by_key<K, I>(items: I) -> Vec<(K, f64)>
where
    K: Ord,
    I: IntoIterator<Item = (K, Option<f64>)>,
{
    let mut groups: BTreeMap<K, MeanAcc> = BTreeMap::new();
    for (key, value) in items {
        let acc = groups.entry(key).or_default();
        if let Some(v) = value {
            acc.push(v);
        }
    }
    groups
        .into_iter()
        .filter_map(|(key, acc)| acc.mean().map(|m| (key, m)))
        .collect()
}

/// Linear-interpolated quantile of the present values, `q` in `[0, 1]`.
///
/// Returns `None` for an empty input. Matches the interpolation the original
/// preprocessing used for its 99th-percentile outlier cut.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
}
