use serde::{Deserialize, Serialize};
use simanbas_common::{Result, SimanbasError};

pub const DEFAULT_BIN_COUNT: usize = 10;
/// Upper bound on requested bins; keeps the count vector allocation sane.
pub const MAX_BIN_COUNT: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub range_start: f64,
    pub range_end: f64,
    pub label: String,
    pub count: u64,
}

/// Equal-width bins over `[min, max]`, tagged with the series name that
/// chart legends show next to each count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub series: String,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    /// Rows shaped `{ "name": label, <series>: count }` for bar-chart widgets.
    pub fn chart_rows(&self) -> Vec<serde_json::Value> {
        self.bins
            .iter()
            .map(|b| {
                let mut row = serde_json::Map::new();
                row.insert("name".into(), b.label.clone().into());
                row.insert(self.series.clone(), b.count.into());
                serde_json::Value::Object(row)
            })
            .collect()
    }
}

/// Bin counts arriving from config files or the command line are signed;
/// anything below one or above [`MAX_BIN_COUNT`] is rejected here.
pub fn validate_bin_count(requested: i64) -> Result<usize> {
    if requested <= 0 {
        return Err(SimanbasError::InvalidArgument(format!(
            "bin count must be positive, got {requested}"
        )));
    }
    match usize::try_from(requested) {
        Ok(bins) if bins <= MAX_BIN_COUNT => Ok(bins),
        _ => Err(too_many_bins(requested)),
    }
}

fn too_many_bins(requested: impl std::fmt::Display) -> SimanbasError {
    SimanbasError::InvalidArgument(format!(
        "bin count must be at most {MAX_BIN_COUNT}, got {requested}"
    ))
}

/// Bins a sample of finite values into `bins` equal-width intervals.
///
/// An empty sample gives an empty histogram. A sample whose values are all
/// equal collapses to one bin labelled with that value. Otherwise exactly
/// `bins` bins are returned; the last one is closed on the right so the
/// maximum is always counted.
///
/// A value is placed in bin `floor((v - min) / width)`. Edges are not
/// compared directly, so a value sitting on an inner edge can fall one bin
/// low when the division rounds down (`0.3` in `[0.1, 0.2, 0.3, 0.9]` with
/// four bins lands in the first bin).
pub fn build_histogram(values: &[f64], bins: usize, series: &str) -> Result<Histogram> {
    if bins == 0 {
        return Err(SimanbasError::InvalidArgument("bin count must be positive, got 0".into()));
    }
    if bins > MAX_BIN_COUNT {
        return Err(too_many_bins(bins));
    }
    let series = series.to_owned();
    if values.is_empty() {
        return Ok(Histogram { series, bins: Vec::new() });
    }
    // `+ 0.0` turns -0.0 into 0.0 so the result does not depend on sample order
    let min = values.iter().copied().fold(f64::INFINITY, f64::min) + 0.0;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 0.0;
    if max <= min {
        return Ok(Histogram {
            series,
            bins: vec![HistogramBin {
                range_start: min,
                range_end: max,
                label: format!("{min:.2}"),
                count: values.len() as u64,
            }],
        });
    }
    // halve everything when the range itself overflows f64
    let scale = if (max - min).is_finite() { 1.0 } else { 0.5 };
    let (lo, hi) = (min * scale, max * scale);
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0u64; bins];
    for &v in values {
        // float casts saturate: NaN (zero width) -> 0, inf -> usize::MAX
        let idx = if v >= max { bins - 1 } else { ((v * scale - lo) / width).floor() as usize };
        counts[idx.min(bins - 1)] += 1;
    }
    let edge = |i: usize| ((lo + i as f64 * width) / scale).clamp(min, max);
    let bins = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let range_start = edge(i);
            let range_end = edge(i + 1);
            HistogramBin {
                range_start,
                range_end,
                label: format!("{range_start:.2}-{range_end:.2}"),
                count,
            }
        })
        .collect();
    Ok(Histogram { series, bins })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(h: &Histogram) -> Vec<u64> {
        h.bins.iter().map(|b| b.count).collect()
    }

    #[test]
    fn empty_sample_has_no_bins() {
        let h = build_histogram(&[], 10, "P-Value").unwrap();
        assert!(h.is_empty());
        assert_eq!(h.series, "P-Value");
        assert_eq!(h.total(), 0);
        assert_eq!(h.max_count(), 0);
    }

    #[test]
    fn zero_variance_collapses() {
        let h = build_histogram(&[5.0, 5.0, 5.0], 10, "D-Index").unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(h.bins[0].count, 3);
        assert_eq!(h.bins[0].label, "5.00");
        assert_eq!(h.bins[0].range_start, 5.0);
        assert_eq!(h.bins[0].range_end, 5.0);
    }

    #[test]
    fn single_value_collapses() {
        let h = build_histogram(&[0.42], 4, "P-Value").unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(h.bins[0].label, "0.42");
    }

    #[test]
    fn concrete_four_bins() {
        let h = build_histogram(&[0.1, 0.2, 0.3, 0.9], 4, "P-Value").unwrap();
        // (0.3 - 0.1) / 0.2 == 0.9999999999999999, so 0.3 stays in bin 0
        assert_eq!(counts(&h), vec![3, 0, 0, 1]);
        let labels: Vec<&str> = h.bins.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["0.10-0.30", "0.30-0.50", "0.50-0.70", "0.70-0.90"]);
        assert!((h.bins[3].range_end - 0.9).abs() < 1e-12);
    }

    #[test]
    fn maximum_goes_to_last_bin() {
        let h = build_histogram(&[0.0, 1.0], 3, "x").unwrap();
        assert_eq!(counts(&h), vec![1, 0, 1]);
    }

    #[test]
    fn overflowing_range_still_bins() {
        let h = build_histogram(&[-1.0e308, 0.0, 1.0e308], 4, "x").unwrap();
        assert_eq!(counts(&h), vec![1, 0, 1, 1]);
        assert_eq!(h.bins[0].range_start, -1.0e308);
        assert_eq!(h.bins[3].range_end, 1.0e308);
        assert!(h.bins.iter().all(|b| b.range_start.is_finite() && b.range_end.is_finite()));

        let h = build_histogram(&[f64::MIN, f64::MAX], 3, "x").unwrap();
        assert_eq!(counts(&h), vec![1, 0, 1]);
        assert_eq!(h.bins[2].range_end, f64::MAX);
    }

    #[test]
    fn subnormal_range_keeps_max_last() {
        let tiny = f64::from_bits(15); // 15 ulps above zero
        let h = build_histogram(&[0.0, tiny], 10, "x").unwrap();
        assert_eq!(h.len(), 10);
        assert_eq!(h.bins[0].count, 1);
        assert_eq!(h.bins[9].count, 1);
    }

    #[test]
    fn bins_are_contiguous() {
        let h = build_histogram(&[-1.0, -0.25, 0.3, 0.8, 1.0], 5, "x").unwrap();
        assert_eq!(h.len(), 5);
        assert_eq!(h.bins[0].range_start, -1.0);
        for pair in h.bins.windows(2) {
            assert!((pair[0].range_end - pair[1].range_start).abs() < 1e-12);
        }
        assert_eq!(h.total(), 5);
    }

    #[test]
    fn negative_values_bin_from_min() {
        let h = build_histogram(&[-0.5, -0.5, 0.5], 2, "D-Index").unwrap();
        assert_eq!(counts(&h), vec![2, 1]);
        assert_eq!(h.bins[0].label, "-0.50-0.00");
    }

    #[test]
    fn zero_bins_is_invalid() {
        let err = build_histogram(&[1.0, 2.0], 0, "x").unwrap_err();
        assert!(matches!(err, SimanbasError::InvalidArgument(_)));
        // rejected before looking at the sample
        assert!(build_histogram(&[], 0, "x").is_err());
    }

    #[test]
    fn signed_bin_counts() {
        assert_eq!(validate_bin_count(10).unwrap(), 10);
        assert!(matches!(validate_bin_count(0), Err(SimanbasError::InvalidArgument(_))));
        assert!(matches!(validate_bin_count(-3), Err(SimanbasError::InvalidArgument(_))));
        assert_eq!(validate_bin_count(MAX_BIN_COUNT as i64).unwrap(), MAX_BIN_COUNT);
        assert!(matches!(validate_bin_count(MAX_BIN_COUNT as i64 + 1), Err(SimanbasError::InvalidArgument(_))));
        assert!(matches!(validate_bin_count(i64::MAX), Err(SimanbasError::InvalidArgument(_))));
    }

    #[test]
    fn oversized_bin_count_is_invalid() {
        let err = build_histogram(&[0.0, 1.0], usize::MAX, "x").unwrap_err();
        assert!(matches!(err, SimanbasError::InvalidArgument(_)));
        assert_eq!(build_histogram(&[0.0, 1.0], MAX_BIN_COUNT, "x").unwrap().len(), MAX_BIN_COUNT);
    }

    #[test]
    fn chart_rows_use_series_key() {
        let h = build_histogram(&[0.0, 1.0], 2, "P-Value").unwrap();
        let rows = h.chart_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "0.00-0.50");
        assert_eq!(rows[0]["P-Value"], 1);
        assert_eq!(rows[1]["P-Value"], 1);
    }

    #[test]
    fn repeated_calls_agree() {
        let sample = [0.12, 0.55, 0.31, 0.97, 0.55, 0.02];
        let a = build_histogram(&sample, 10, "x").unwrap();
        let b = build_histogram(&sample, 10, "x").unwrap();
        assert_eq!(a, b);
    }
}
