//! Completion-time prediction from comparable historical tasks.
//!
//! Comparable tasks are chosen by an explicit fallback ladder:
//!
//! 1. same priority, if at least `min_sample_size` match
//! 2. at least one shared tag, if at least `min_sample_size` match
//! 3. the whole completed history
//!
//! The estimate is the recency-weighted mean of the selected actual times,
//! with weights halving every `recency_half_life_days` before the newest
//! sample. Confidence grows with sample size, shrinks with the coefficient
//! of variation, and is scaled down for the looser tiers.
//!
//! With no usable history the task's own estimate is returned, unless an
//! advisory estimate is supplied, which then takes its place.

use serde::{Deserialize, Serialize};

use super::primitives::{task_problem, valid_tasks, Validated};
use crate::config::PredictionConfig;
use crate::error::ConfigError;
use crate::model::{AdvisoryHint, Task};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Samples with a coefficient of variation above this are reported as noisy.
const HIGH_VARIANCE_CV: f64 = 0.5;

const ADVISORY_FACTOR: &str = "advisory estimate";

/// Which rung of the similarity ladder produced the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityTier {
    PriorityMatch,
    TagOverlap,
    FullHistory,
    /// No completed history at all; the task's own estimate is returned
    NoHistory,
}

impl SimilarityTier {
    pub fn factor(&self) -> &'static str {
        match self {
            SimilarityTier::PriorityMatch => "priority match",
            SimilarityTier::TagOverlap => "tag overlap",
            SimilarityTier::FullHistory => "full history",
            SimilarityTier::NoHistory => "own estimate",
        }
    }
}

/// Estimated duration of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Minutes
    pub estimated_time: f64,
    /// 0-1
    pub confidence: f64,
    /// Signals used for this prediction, in the order applied
    pub factors: Vec<String>,
    pub sample_size: usize,
    pub tier: SimilarityTier,
}

/// Confidence from sample size and coefficient of variation, before tier
/// weighting.
///
/// Non-decreasing in `sample_size` for a fixed `cv`, and always in [0, 1].
pub fn confidence_score(sample_size: usize, cv: f64, sample_scale: f64) -> f64 {
    if sample_size == 0 {
        return 0.0;
    }
    let n = sample_size as f64;
    let size_factor = n / (n + sample_scale.max(0.0));
    let spread_factor = 1.0 / (1.0 + cv.max(0.0));
    (size_factor * spread_factor).clamp(0.0, 1.0)
}

/// Population coefficient of variation; 0 for an empty or all-zero sample.
fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// Usable advisory estimate: present, finite and not negative.
fn advisory_estimate(advisory: Option<&AdvisoryHint>) -> Option<f64> {
    let minutes = advisory?.estimated_time?;
    if minutes.is_finite() && minutes >= 0.0 {
        Some(minutes)
    } else {
        tracing::warn!(minutes, "ignoring unusable advisory estimate");
        None
    }
}

/// Predictor for task completion time.
#[derive(Debug, Clone, Default)]
pub struct CompletionPredictor {
    config: PredictionConfig,
}

impl CompletionPredictor {
    /// Create a predictor, rejecting an invalid config.
    pub fn new(config: PredictionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn predict(&self, task: &Task, history: &[Task]) -> Validated<Prediction> {
        self.predict_with_advice(task, history, None)
    }

    /// Predict, falling back to the advisory estimate when no history applies.
    pub fn predict_with_advice(
        &self,
        task: &Task,
        history: &[Task],
        advisory: Option<&AdvisoryHint>,
    ) -> Validated<Prediction> {
        let (history, mut warnings) = valid_tasks(history);

        let own_estimate = match task_problem(task) {
            Some(problem) => {
                tracing::warn!(task_id = %task.id, %problem, "target task is malformed");
                warnings.push(problem);
                0.0
            }
            None => task.estimated_time,
        };

        let candidates: Vec<(&Task, f64)> = history
            .into_iter()
            .filter(|t| t.is_completed() && t.id != task.id)
            .filter_map(|t| t.actual_time.map(|actual| (t, actual)))
            .collect();

        let (tier, sample) = self.select(task, candidates);
        if sample.is_empty() {
            let (estimated_time, factor) = match advisory_estimate(advisory) {
                Some(minutes) => (minutes, ADVISORY_FACTOR),
                None => (own_estimate, SimilarityTier::NoHistory.factor()),
            };
            tracing::debug!(task_id = %task.id, factor, "no completed history");
            return Validated::new(
                Prediction {
                    estimated_time,
                    confidence: 0.0,
                    factors: vec![factor.to_string()],
                    sample_size: 0,
                    tier: SimilarityTier::NoHistory,
                },
                warnings,
            );
        }

        let mut factors = vec![tier.factor().to_string()];

        let newest = sample
            .iter()
            .map(|(t, _)| t.updated_at)
            .max()
            .unwrap_or(task.updated_at);
        let weighted: Vec<(f64, f64)> = sample
            .iter()
            .map(|(t, actual)| {
                let age_days = (newest - t.updated_at).num_milliseconds() as f64 / MS_PER_DAY;
                let weight = (-age_days / self.config.recency_half_life_days).exp2();
                (weight, *actual)
            })
            .collect();
        if weighted.iter().any(|(w, _)| *w < 1.0) {
            factors.push("recency weighting".to_string());
        }

        let weight_sum: f64 = weighted.iter().map(|(w, _)| w).sum();
        let estimated_time = if weight_sum > 0.0 {
            weighted.iter().map(|(w, a)| w * a).sum::<f64>() / weight_sum
        } else {
            own_estimate
        };

        let actuals: Vec<f64> = sample.iter().map(|(_, a)| *a).collect();
        let cv = coefficient_of_variation(&actuals);
        if sample.len() < self.config.min_sample_size {
            factors.push("small sample".to_string());
        }
        if cv > HIGH_VARIANCE_CV {
            factors.push("high variance".to_string());
        }

        let confidence = (confidence_score(sample.len(), cv, self.config.confidence_sample_scale)
            * self.tier_weight(tier))
        .clamp(0.0, 1.0);

        tracing::debug!(
            task_id = %task.id,
            tier = tier.factor(),
            samples = sample.len(),
            estimated_time,
            confidence,
            "predicted completion time"
        );

        Validated::new(
            Prediction {
                estimated_time,
                confidence,
                factors,
                sample_size: sample.len(),
                tier,
            },
            warnings,
        )
    }

    /// Walk the similarity ladder.
    fn select<'a>(
        &self,
        task: &Task,
        candidates: Vec<(&'a Task, f64)>,
    ) -> (SimilarityTier, Vec<(&'a Task, f64)>) {
        let min = self.config.min_sample_size;

        let same_priority: Vec<(&Task, f64)> = candidates
            .iter()
            .copied()
            .filter(|(t, _)| t.priority == task.priority)
            .collect();
        if same_priority.len() >= min {
            return (SimilarityTier::PriorityMatch, same_priority);
        }

        if !task.tags.is_empty() {
            let overlapping: Vec<(&Task, f64)> = candidates
                .iter()
                .copied()
                .filter(|(t, _)| t.shared_tags(task) > 0)
                .collect();
            if overlapping.len() >= min {
                return (SimilarityTier::TagOverlap, overlapping);
            }
        }

        if candidates.is_empty() {
            (SimilarityTier::NoHistory, candidates)
        } else {
            (SimilarityTier::FullHistory, candidates)
        }
    }

    fn tier_weight(&self, tier: SimilarityTier) -> f64 {
        match tier {
            SimilarityTier::PriorityMatch => 1.0,
            SimilarityTier::TagOverlap => self.config.tag_overlap_weight,
            SimilarityTier::FullHistory => self.config.full_history_weight,
            SimilarityTier::NoHistory => 0.0,
        }
    }
}
