//! # Score Calculator
//!
//! Maps raw per-criterion scores to a final score on a 0-10 scale.
//!
//! Each raw value is clamped into `[0, max_score]` before summing, so an
//! out-of-range input is silently corrected rather than rejected. The sum is
//! normalized by the total of the maxima. An empty table scores 0.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::CriterionDefinition;

/// Minimum final score for approval.
pub const APPROVAL_THRESHOLD: f64 = 6.0;

/// Upper bound of the score scale.
pub const SCORE_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    /// Full precision; round only for display.
    pub final_score: f64,
    pub approved: bool,
    pub total_score: f64,
    pub total_max_score: f64,
}

impl ScoreOutcome {
    /// One decimal place, as printed on the form.
    pub fn display(&self) -> String {
        display_score(self.final_score)
    }
}

/// Clamp a raw score into the criterion's range. NaN counts as zero.
pub fn clamp_score(raw: f64, max_score: f64) -> f64 {
    if raw.is_nan() || raw < 0.0 {
        0.0
    } else if raw > max_score {
        max_score
    } else {
        raw
    }
}

/// Compute the outcome with an arbitrary lookup from criterion id to raw
/// score. Missing criteria count as zero.
pub fn compute_with<F>(criteria: &[CriterionDefinition], lookup: F) -> ScoreOutcome
where
    F: Fn(&str) -> Option<f64>,
{
    let mut total_score = 0.0;
    let mut total_max_score = 0.0;

    for criterion in criteria {
        let raw = lookup(criterion.id).unwrap_or(0.0);
        total_score += clamp_score(raw, criterion.max_score);
        total_max_score += criterion.max_score;
    }

    let final_score = if total_max_score > 0.0 {
        (total_score / total_max_score) * SCORE_SCALE
    } else {
        0.0
    };

    ScoreOutcome {
        final_score,
        approved: final_score >= APPROVAL_THRESHOLD,
        total_score,
        total_max_score,
    }
}

pub fn compute(criteria: &[CriterionDefinition], scores: &BTreeMap<String, f64>) -> ScoreOutcome {
    compute_with(criteria, |id| scores.get(id).copied())
}

pub fn display_score(score: f64) -> String {
    format!("{:.1}", score)
}

/// Compact rendering for table cells: `4`, `2.5`, `0.25`.
pub fn format_points(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
