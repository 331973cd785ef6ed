use serde::{Deserialize, Serialize};
use simanbas_common::models::AnalysisResult;

pub const HARD_BELOW: f64 = 0.3;
pub const EASY_ABOVE: f64 = 0.7;
pub const EXCELLENT_FROM: f64 = 0.4;
pub const POOR_BELOW: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyBand {
    Hard,
    Moderate,
    Easy,
}

impl DifficultyBand {
    pub fn classify(p: f64) -> Self {
        if p < HARD_BELOW {
            Self::Hard
        } else if p > EASY_ABOVE {
            Self::Easy
        } else {
            Self::Moderate
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hard => "hard",
            Self::Moderate => "ideal",
            Self::Easy => "easy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscriminationBand {
    Poor,
    Good,
    Excellent,
}

impl DiscriminationBand {
    pub fn classify(d: f64) -> Self {
        if d >= EXCELLENT_FROM {
            Self::Excellent
        } else if d < POOR_BELOW {
            Self::Poor
        } else {
            Self::Good
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

/// Low discrimination flags a question for review.
pub fn needs_review(result: &AnalysisResult) -> bool {
    result.discrimination_index.is_some_and(|d| d < POOR_BELOW)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub total: usize,
    pub hard: usize,
    pub moderate: usize,
    pub easy: usize,
    pub missing_p_value: usize,
    pub poor: usize,
    pub good: usize,
    pub excellent: usize,
    pub missing_d_index: usize,
    pub needs_review: usize,
}

impl QualitySummary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut s = Self { total: results.len(), ..Self::default() };
        for r in results {
            match r.difficulty_index_p_value.map(DifficultyBand::classify) {
                Some(DifficultyBand::Hard) => s.hard += 1,
                Some(DifficultyBand::Moderate) => s.moderate += 1,
                Some(DifficultyBand::Easy) => s.easy += 1,
                None => s.missing_p_value += 1,
            }
            match r.discrimination_index.map(DiscriminationBand::classify) {
                Some(DiscriminationBand::Poor) => s.poor += 1,
                Some(DiscriminationBand::Good) => s.good += 1,
                Some(DiscriminationBand::Excellent) => s.excellent += 1,
                None => s.missing_d_index += 1,
            }
            if needs_review(r) {
                s.needs_review += 1;
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::fixtures::result;

    #[test]
    fn difficulty_thresholds() {
        assert_eq!(DifficultyBand::classify(0.29), DifficultyBand::Hard);
        assert_eq!(DifficultyBand::classify(0.3), DifficultyBand::Moderate);
        assert_eq!(DifficultyBand::classify(0.7), DifficultyBand::Moderate);
        assert_eq!(DifficultyBand::classify(0.71), DifficultyBand::Easy);
    }

    #[test]
    fn discrimination_thresholds() {
        assert_eq!(DiscriminationBand::classify(-0.3), DiscriminationBand::Poor);
        assert_eq!(DiscriminationBand::classify(0.19), DiscriminationBand::Poor);
        assert_eq!(DiscriminationBand::classify(0.2), DiscriminationBand::Good);
        assert_eq!(DiscriminationBand::classify(0.39), DiscriminationBand::Good);
        assert_eq!(DiscriminationBand::classify(0.4), DiscriminationBand::Excellent);
    }

    #[test]
    fn review_needs_a_d_index() {
        assert!(needs_review(&result(None, Some(0.1))));
        assert!(!needs_review(&result(Some(0.1), None)));
        assert!(!needs_review(&result(None, Some(0.2))));
    }

    #[test]
    fn summary_counts() {
        let rs = vec![
            result(Some(0.1), Some(0.5)),
            result(Some(0.5), Some(0.1)),
            result(Some(0.9), None),
            result(None, Some(0.25)),
        ];
        let s = QualitySummary::from_results(&rs);
        assert_eq!(s.total, 4);
        assert_eq!((s.hard, s.moderate, s.easy, s.missing_p_value), (1, 1, 1, 1));
        assert_eq!((s.poor, s.good, s.excellent, s.missing_d_index), (1, 1, 1, 1));
        assert_eq!(s.needs_review, 1);
    }
}
