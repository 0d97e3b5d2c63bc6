//! Productivity metrics for one task/time-entry snapshot.
//!
//! The productivity score is throughput (completed tasks per logged hour)
//! multiplied by a configurable scale and clamped into 0-100. Break time is
//! measured per user: only gaps shorter than the same-session threshold
//! between one user's consecutive entries count as breaks.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::primitives::{ms_to_minutes, rate, sum_duration_ms, valid_entries, valid_tasks, Validated};
use crate::config::ProductivityConfig;
use crate::error::ConfigError;
use crate::model::{Task, TimeEntry};

/// Productivity snapshot derived from tasks and time entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductivityMetrics {
    /// Number of completed tasks
    pub tasks_completed: usize,
    /// Logged minutes on completed tasks per completed task
    pub average_completion_time: f64,
    /// Throughput score (0-100)
    pub productivity_score: f64,
    /// Total logged minutes
    pub focus_time: f64,
    /// Minutes of short in-session gaps between a user's entries
    pub break_time: f64,
    /// Mean of min(1, estimated / actual) over completed tasks (0-1)
    pub efficiency: f64,
}

impl ProductivityMetrics {
    /// Ratio of break minutes to focus minutes; 0 without focus time.
    pub fn break_ratio(&self) -> f64 {
        if self.focus_time > 0.0 {
            self.break_time / self.focus_time
        } else {
            0.0
        }
    }
}

/// Calculator for [`ProductivityMetrics`].
#[derive(Debug, Clone)]
pub struct ProductivityCalculator {
    config: ProductivityConfig,
}

impl Default for ProductivityCalculator {
    fn default() -> Self {
        Self {
            config: ProductivityConfig::default(),
        }
    }
}

impl ProductivityCalculator {
    /// Create a calculator, rejecting an invalid config.
    pub fn new(config: ProductivityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProductivityConfig {
        &self.config
    }

    /// Compute metrics, excluding malformed records.
    pub fn compute(&self, tasks: &[Task], entries: &[TimeEntry]) -> Validated<ProductivityMetrics> {
        let (tasks, mut warnings) = valid_tasks(tasks);
        let (entries, entry_warnings) = valid_entries(entries);
        warnings.extend(entry_warnings);

        Validated::new(self.compute_checked(&tasks, &entries), warnings)
    }

    /// Compute metrics over records that already passed validation.
    pub(crate) fn compute_checked(&self, tasks: &[&Task], entries: &[&TimeEntry]) -> ProductivityMetrics {
        let completed: HashSet<&str> = tasks
            .iter()
            .filter(|t| t.is_completed())
            .map(|t| t.id.as_str())
            .collect();
        let tasks_completed = completed.len();

        let focus_ms = sum_duration_ms(entries.iter().copied());
        let completed_ms = sum_duration_ms(
            entries
                .iter()
                .copied()
                .filter(|e| completed.contains(e.task_id.as_str())),
        );

        let average_completion_time = if tasks_completed > 0 {
            ms_to_minutes(completed_ms) / tasks_completed as f64
        } else {
            0.0
        };

        let focus_time = ms_to_minutes(focus_ms);
        let metrics = ProductivityMetrics {
            tasks_completed,
            average_completion_time,
            productivity_score: self.score(tasks_completed, focus_time),
            focus_time,
            break_time: ms_to_minutes(self.break_ms(entries)),
            efficiency: efficiency(tasks),
        };

        tracing::debug!(
            tasks = tasks.len(),
            entries = entries.len(),
            completed = metrics.tasks_completed,
            score = metrics.productivity_score,
            "computed productivity metrics"
        );
        metrics
    }

    /// Scaled throughput clamped into 0-100; 0 with no logged time.
    pub fn score(&self, tasks_completed: usize, focus_minutes: f64) -> f64 {
        (rate(tasks_completed, focus_minutes) * self.config.score_scale).clamp(0.0, 100.0)
    }

    fn break_ms(&self, entries: &[&TimeEntry]) -> i64 {
        let threshold_ms = i64::from(self.config.session_gap_minutes) * 60_000;

        let mut by_user: BTreeMap<&str, Vec<&TimeEntry>> = BTreeMap::new();
        for entry in entries {
            by_user.entry(entry.user_id.as_str()).or_default().push(entry);
        }

        let mut total: i64 = 0;
        for (_, mut user_entries) in by_user {
            user_entries.sort_by(|a, b| {
                (a.start_time, a.end_time, &a.id).cmp(&(b.start_time, b.end_time, &b.id))
            });

            let mut iter = user_entries.into_iter();
            let Some(first) = iter.next() else { continue };
            let mut session_end = first.end_time;
            for entry in iter {
                let gap = (entry.start_time - session_end).num_milliseconds();
                if gap > 0 && gap < threshold_ms {
                    total = total.saturating_add(gap);
                }
                session_end = session_end.max(entry.end_time);
            }
        }
        total
    }
}

/// Mean of min(1, estimated / actual) over completed tasks with both values.
///
/// Tasks without an actual time or with a zero estimate are skipped rather
/// than counted as perfectly efficient.
fn efficiency(tasks: &[&Task]) -> f64 {
    let ratios: Vec<f64> = tasks
        .iter()
        .filter(|t| t.is_completed() && t.estimated_time > 0.0)
        .filter_map(|t| t.actual_time.map(|actual| (t.estimated_time, actual)))
        .map(|(estimated, actual)| {
            if actual > 0.0 {
                (estimated / actual).min(1.0)
            } else {
                1.0
            }
        })
        .collect();

    if ratios.is_empty() {
        return 0.0;
    }
    ratios.iter().sum::<f64>() / ratios.len() as f64
}
