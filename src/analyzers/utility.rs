//! Bucketing primitives shared by every page aggregator.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use tracing::warn;

use crate::analyzers::types::Trendline;

/// Chart axis labels longer than this are cut and suffixed with `...`.
pub const MAX_LABEL_CHARS: usize = 15;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `part / total` as a percentage, 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Counts occurrences of each key. Iteration order of the result is
/// unspecified; callers sort explicitly.
pub fn count_by<K, I>(keys: I) -> HashMap<K, usize>
where
    K: Eq + Hash,
    I: IntoIterator<Item = K>,
{
    let mut counts = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Counts `items` by the key `key` extracts from each.
pub fn frequency<T, K, F>(items: &[T], key: F) -> HashMap<K, usize>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    count_by(items.iter().map(key))
}

/// Sorts a frequency map descending by count. Equal counts are ordered by
/// key ascending so the ranking is deterministic.
pub fn rank_desc<K>(counts: HashMap<K, usize>) -> Vec<(K, usize)>
where
    K: Ord,
{
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// [`rank_desc`] truncated to the first `n` entries.
pub fn top_n<K>(counts: HashMap<K, usize>, n: usize) -> Vec<(K, usize)>
where
    K: Ord,
{
    let mut ranked = rank_desc(counts);
    ranked.truncate(n);
    ranked
}

/// Sorts `(label, value)` pairs descending by value, label ascending on ties.
pub fn sort_desc_by_value(pairs: &mut [(String, f64)]) {
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}

/// One histogram bucket `[start, start + width)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub count: usize,
}

/// Upper bound on the buckets one histogram may span.
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

/// Bins `values` into buckets of `width`, starting at `floor(v / width) * width`.
///
/// Every bucket between the lowest and highest occupied one is emitted,
/// empty buckets included. Non-finite values are ignored. Empty input or a
/// non-positive width yields no bins. The range is capped at
/// [`MAX_HISTOGRAM_BINS`] buckets from the lowest; values past the cap are
/// dropped with a warning.
pub fn histogram(values: &[f64], width: f64) -> Vec<Bin> {
    if width.is_nan() || width <= 0.0 {
        return Vec::new();
    }

    let indices: Vec<i64> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| (v / width).floor() as i64)
        .collect();

    let (Some(lo), Some(hi)) = (indices.iter().min(), indices.iter().max()) else {
        return Vec::new();
    };
    let lo = *lo;
    let cap = lo.saturating_add(MAX_HISTOGRAM_BINS as i64 - 1);
    let hi = (*hi).min(cap);

    let dropped = indices.iter().filter(|idx| **idx > hi).count();
    if dropped > 0 {
        warn!(
            dropped,
            width,
            max_bins = MAX_HISTOGRAM_BINS,
            "Histogram outliers beyond the bucket cap ignored"
        );
    }

    let span = hi
        .checked_sub(lo)
        .and_then(|d| usize::try_from(d).ok())
        .map_or(1, |d| d + 1);
    let mut counts = vec![0usize; span];
    for idx in indices.iter().filter(|idx| **idx <= hi) {
        if let Some(slot) = idx
            .checked_sub(lo)
            .and_then(|d| usize::try_from(d).ok())
            .and_then(|d| counts.get_mut(d))
        {
            *slot += 1;
        }
    }

    (lo..=hi)
        .zip(counts)
        .map(|(idx, count)| Bin {
            start: idx as f64 * width,
            count,
        })
        .collect()
}

/// Running total of `values` in the order given.
pub fn running_total<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Divides each group's total by its count, omitting groups with no members.
pub fn average_groups<K: Ord>(totals: BTreeMap<K, (f64, usize)>) -> Vec<(K, f64)> {
    totals
        .into_iter()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(key, (total, count))| (key, total / count as f64))
        .collect()
}

/// Groups `(key, value)` pairs and averages each group. Output is ordered by key.
pub fn grouped_average<K, I>(pairs: I) -> Vec<(K, f64)>
where
    K: Ord,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut totals: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for (key, value) in pairs {
        let entry = totals.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    average_groups(totals)
}

/// Most frequent value; ties go to the value seen first.
pub fn mode_first_seen<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<(&str, usize)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for value in values {
        match position.get(value) {
            Some(&i) => seen[i].1 += 1,
            None => {
                position.insert(value, seen.len());
                seen.push((value, 1));
            }
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in seen {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}

/// Cuts a chart label to [`MAX_LABEL_CHARS`] characters plus `...`.
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() > MAX_LABEL_CHARS {
        let head: String = label.chars().take(MAX_LABEL_CHARS).collect();
        format!("{head}...")
    } else {
        label.to_string()
    }
}

/// Least-squares fit over index-aligned points, returned as the segment
/// spanning the observed x range. `None` with fewer than two points or when
/// all x values coincide.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<Trendline> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let nf = n as f64;

    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_xx: f64 = x.iter().map(|a| a * a).sum();

    let denom = nf * sum_xx - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return None;
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / nf;

    let min_x = x.iter().copied().fold(f64::INFINITY, f64::min);
    let max_x = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(Trendline {
        slope,
        intercept,
        start: [min_x, slope * min_x + intercept],
        end: [max_x, slope * max_x + intercept],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_top_n_breaks_ties_by_key() {
        let counts = count_by(["Naan", "Biryani", "Biryani", "Dal", "Naan", "Raita"]);
        let top = top_n(counts, 3);
        assert_eq!(top, vec![("Biryani", 2), ("Naan", 2), ("Dal", 1)]);
    }

    #[test]
    fn test_histogram_fills_gaps() {
        let bins = histogram(&[12.0, 14.0, 22.0], 5.0);
        let starts: Vec<f64> = bins.iter().map(|b| b.start).collect();
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(starts, vec![10.0, 15.0, 20.0]);
        assert_eq!(counts, vec![2, 0, 1]);
    }

    #[test]
    fn test_histogram_edge_inputs() {
        assert!(histogram(&[], 5.0).is_empty());
        assert!(histogram(&[3.0], 0.0).is_empty());

        let single = histogram(&[7.0], 5.0);
        assert_eq!(single, vec![Bin { start: 5.0, count: 1 }]);

        // exact multiple of the width gets its own bucket
        let bins = histogram(&[10.0, 20.0], 5.0);
        assert_eq!(bins.len(), 3);
        assert_eq!(bins[2], Bin { start: 20.0, count: 1 });
    }

    #[test]
    fn test_histogram_caps_extreme_outlier() {
        let bins = histogram(&[600.0, 1e300], 300.0);
        assert_eq!(bins.len(), MAX_HISTOGRAM_BINS);
        assert_eq!(bins[0], Bin { start: 600.0, count: 1 });
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 1);

        assert!(histogram(&[1.0], f64::NAN).is_empty());
    }

    #[test]
    fn test_running_total() {
        assert_eq!(running_total([2.0, 3.0, 5.0]), vec![2.0, 5.0, 10.0]);
        assert!(running_total(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_grouped_average_skips_empty_groups() {
        let mut totals = BTreeMap::new();
        totals.insert("a", (10.0, 2));
        totals.insert("b", (0.0, 0));
        assert_eq!(average_groups(totals), vec![("a", 5.0)]);

        let avg = grouped_average([("x", 1.0), ("y", 4.0), ("x", 3.0)]);
        assert_eq!(avg, vec![("x", 2.0), ("y", 4.0)]);
    }

    #[test]
    fn test_mode_prefers_first_seen_on_tie() {
        assert_eq!(
            mode_first_seen(["UPI", "Card", "Card", "UPI"]),
            Some("UPI".to_string())
        );
        assert_eq!(
            mode_first_seen(["UPI", "Card", "Card"]),
            Some("Card".to_string())
        );
        assert_eq!(mode_first_seen(std::iter::empty()), None);
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Meghana Foods"), "Meghana Foods");
        assert_eq!(truncate_label("123456789012345"), "123456789012345");
        assert_eq!(
            truncate_label("Empire Restaurant Koramangala"),
            "Empire Restaura..."
        );
        assert_eq!(truncate_label("Café Coffee Day Express"), "Café Coffee Day...");
    }

    #[test]
    fn test_linear_regression() {
        let fit = linear_regression(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!(fit.intercept.abs() < 1e-9);
        assert_eq!(fit.start[0], 1.0);
        assert_eq!(fit.end[0], 3.0);

        assert!(linear_regression(&[1.0], &[1.0]).is_none());
        assert!(linear_regression(&[2.0, 2.0], &[1.0, 5.0]).is_none());
    }
}
