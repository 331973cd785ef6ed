use serde::{Deserialize, Serialize};
use simanbas_common::models::AnalysisResult;
use simanbas_common::{Result, SimanbasError};

use crate::histogram::{build_histogram, Histogram};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    DifficultyIndex,
    DiscriminationIndex,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::DifficultyIndex, Metric::DiscriminationIndex];

    /// Legend key, also used as the histogram's series name.
    pub fn series_name(self) -> &'static str {
        match self {
            Metric::DifficultyIndex => "P-Value",
            Metric::DiscriminationIndex => "D-Index",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::DifficultyIndex => "Difficulty distribution (P-Value)",
            Metric::DiscriminationIndex => "Discrimination distribution (D-Index)",
        }
    }

    pub fn value(self, record: &AnalysisResult) -> Option<f64> {
        match self {
            Metric::DifficultyIndex => record.difficulty_index_p_value,
            Metric::DiscriminationIndex => record.discrimination_index,
        }
    }
}

/// One metric across all records, with missing and non-finite values dropped.
pub fn extract_sample(records: &[AnalysisResult], metric: Metric) -> Vec<f64> {
    let mut sample = Vec::with_capacity(records.len());
    for record in records {
        match metric.value(record) {
            Some(v) if v.is_finite() => sample.push(v),
            Some(v) => {
                tracing::debug!(question = %record.question_id, value = v, "skipping non-finite {}", metric.series_name());
            }
            None => {}
        }
    }
    sample
}

/// `(p_value, d_index)` for every record that has both, for the quality map.
pub fn quality_points(records: &[AnalysisResult]) -> Vec<(f64, f64)> {
    records
        .iter()
        .filter_map(|r| match (r.difficulty_index_p_value, r.discrimination_index) {
            (Some(p), Some(d)) if p.is_finite() && d.is_finite() => Some((p, d)),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDistributions {
    pub difficulty: Histogram,
    pub discrimination: Histogram,
    pub record_count: usize,
}

impl MetricDistributions {
    /// Bins both metrics independently; the two binning passes share nothing.
    pub fn build(records: &[AnalysisResult], bins: usize) -> Result<Self> {
        let (difficulty, discrimination) = rayon::join(
            || bin_metric(records, Metric::DifficultyIndex, bins),
            || bin_metric(records, Metric::DiscriminationIndex, bins),
        );
        Ok(Self {
            difficulty: difficulty?,
            discrimination: discrimination?,
            record_count: records.len(),
        })
    }

    pub fn get(&self, metric: Metric) -> &Histogram {
        match metric {
            Metric::DifficultyIndex => &self.difficulty,
            Metric::DiscriminationIndex => &self.discrimination,
        }
    }
}

pub fn bin_metric(records: &[AnalysisResult], metric: Metric, bins: usize) -> Result<Histogram> {
    let sample = extract_sample(records, metric);
    tracing::debug!(metric = metric.series_name(), n = sample.len(), bins, "binning sample");
    build_histogram(&sample, bins, metric.series_name())
}

/// Reads a raw sample: a JSON array of numbers (nulls skipped), or numbers
/// separated by whitespace, commas or semicolons.
pub fn parse_sample(text: &str) -> Result<Vec<f64>> {
    let trimmed = text.trim();
    let values: Vec<f64> = if trimmed.starts_with('[') {
        let raw: Vec<Option<f64>> = serde_json::from_str(trimmed)?;
        raw.into_iter().flatten().collect()
    } else {
        trimmed
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|tok| !tok.is_empty())
            .map(|tok| {
                tok.parse::<f64>()
                    .map_err(|_| SimanbasError::InvalidArgument(format!("not a number: {tok}")))
            })
            .collect::<Result<_>>()?
    };
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(SimanbasError::InvalidArgument(format!("sample values must be finite, got {bad}")));
    }
    Ok(values)
}
