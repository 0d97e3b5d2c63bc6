//! Behavioral insights for a single user.
//!
//! Peak hours come from tracked time bucketed by local hour-of-day,
//! preferred task types from tag frequencies on completed tasks, and the
//! improvement suggestions from a rule table over the computed metrics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::primitives::{
    hour_buckets_ms, ms_to_minutes, rank_hours, sum_duration_ms, valid_entries, valid_tasks,
    Validated,
};
use super::productivity::{ProductivityCalculator, ProductivityMetrics};
use super::rules::{append_unique, apply_rules, Rule};
use crate::config::{InsightConfig, ProductivityConfig};
use crate::error::ConfigError;
use crate::model::{AdvisoryHint, Task, TimeEntry, UserPreferences};

/// How often a tag appears on completed tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFrequency {
    pub tag: String,
    pub count: usize,
}

/// Insight profile of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInsights {
    /// Local hours (0-23), most tracked time first
    pub peak_productivity_hours: Vec<u32>,
    /// Tags of completed tasks, most frequent first
    pub preferred_task_types: Vec<TagFrequency>,
    /// Mean logged minutes per task with tracked time
    pub average_task_duration: f64,
    /// Completed tasks as a percentage of all tasks (0-100)
    pub completion_rate: f64,
    pub improvement_suggestions: Vec<String>,
}

/// Everything an insight rule may look at.
#[derive(Debug)]
pub struct InsightContext<'a> {
    pub metrics: &'a ProductivityMetrics,
    pub total_tasks: usize,
    pub completion_rate: f64,
    pub peak_hours: &'a [u32],
    /// Mean length of a tracked entry in minutes
    pub average_session: f64,
    pub preferences: &'a UserPreferences,
    pub config: &'a InsightConfig,
}

/// Default suggestion table.
pub fn insight_rules<'a>() -> Vec<Rule<InsightContext<'a>>> {
    vec![
        Rule::new(
            "more_breaks",
            |ctx: &InsightContext<'a>| {
                ctx.metrics.focus_time > 0.0 && ctx.metrics.break_ratio() < ctx.config.min_break_ratio
            },
            |ctx: &InsightContext<'a>| {
                format!(
                    "Take regular breaks: {:.0} min of breaks against {:.0} min of focus leaves little room to recover.",
                    ctx.metrics.break_time, ctx.metrics.focus_time
                )
            },
        ),
        Rule::new(
            "split_large_tasks",
            |ctx: &InsightContext<'a>| {
                ctx.total_tasks > 0 && ctx.completion_rate < ctx.config.low_completion_rate
            },
            |ctx: &InsightContext<'a>| {
                format!(
                    "Break large tasks into smaller, manageable chunks; only {:.0}% of your tasks are completed.",
                    ctx.completion_rate
                )
            },
        ),
        Rule::new(
            "use_peak_hours",
            |ctx: &InsightContext<'a>| !ctx.peak_hours.is_empty(),
            |ctx: &InsightContext<'a>| {
                format!(
                    "Schedule your most important tasks around {:02}:00, your most productive hour.",
                    ctx.peak_hours[0]
                )
            },
        ),
        Rule::new(
            "peak_outside_work_hours",
            |ctx: &InsightContext<'a>| {
                ctx.peak_hours
                    .iter()
                    .any(|h| !ctx.preferences.is_working_hour(*h))
            },
            |ctx: &InsightContext<'a>| {
                let outside: Vec<String> = ctx
                    .peak_hours
                    .iter()
                    .filter(|h| !ctx.preferences.is_working_hour(**h))
                    .map(|h| format!("{h:02}:00"))
                    .collect();
                format!(
                    "Your productive hours include {} outside your working day; consider adjusting your schedule.",
                    outside.join(", ")
                )
            },
        ),
        Rule::new(
            "shorter_sessions",
            |ctx: &InsightContext<'a>| {
                ctx.average_session
                    > f64::from(ctx.preferences.focus_minutes) * ctx.config.long_session_factor
            },
            |ctx: &InsightContext<'a>| {
                format!(
                    "Your sessions average {:.0} min, well past your {} min focus block; split work into shorter focus blocks.",
                    ctx.average_session, ctx.preferences.focus_minutes
                )
            },
        ),
        Rule::new(
            "pad_estimates",
            |ctx: &InsightContext<'a>| {
                ctx.metrics.efficiency > 0.0 && ctx.metrics.efficiency < ctx.config.low_efficiency
            },
            |ctx: &InsightContext<'a>| {
                format!(
                    "Tasks run longer than estimated (efficiency {:.0}%); pad estimates or break work down further.",
                    ctx.metrics.efficiency * 100.0
                )
            },
        ),
    ]
}

/// Generator for [`UserInsights`].
#[derive(Debug, Clone)]
pub struct InsightGenerator {
    config: InsightConfig,
    productivity: ProductivityCalculator,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self {
            config: InsightConfig::default(),
            productivity: ProductivityCalculator::default(),
        }
    }
}

impl InsightGenerator {
    /// Create a generator, rejecting an invalid config.
    pub fn new(config: InsightConfig, productivity: ProductivityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            productivity: ProductivityCalculator::new(productivity)?,
        })
    }

    pub fn generate(
        &self,
        tasks: &[Task],
        entries: &[TimeEntry],
        preferences: &UserPreferences,
    ) -> Validated<UserInsights> {
        self.generate_with_advice(tasks, entries, preferences, None)
    }

    /// Generate insights, appending advisory suggestions after the rule output.
    pub fn generate_with_advice(
        &self,
        tasks: &[Task],
        entries: &[TimeEntry],
        preferences: &UserPreferences,
        advisory: Option<&AdvisoryHint>,
    ) -> Validated<UserInsights> {
        let (tasks, mut warnings) = valid_tasks(tasks);
        let (entries, entry_warnings) = valid_entries(entries);
        warnings.extend(entry_warnings);
        let (preferences, preference_warnings) = preferences.sanitized();
        warnings.extend(preference_warnings);

        let metrics = self.productivity.compute_checked(&tasks, &entries);
        Validated::new(
            self.generate_checked(&tasks, &entries, &metrics, &preferences, advisory),
            warnings,
        )
    }

    pub(crate) fn generate_checked(
        &self,
        tasks: &[&Task],
        entries: &[&TimeEntry],
        metrics: &ProductivityMetrics,
        preferences: &UserPreferences,
        advisory: Option<&AdvisoryHint>,
    ) -> UserInsights {
        let buckets = hour_buckets_ms(entries.iter().copied(), self.config.utc_offset_minutes);
        let peak_hours = rank_hours(&buckets, self.config.peak_hours);

        let completion_rate = completion_rate(tasks);
        let average_session = if entries.is_empty() {
            0.0
        } else {
            metrics.focus_time / entries.len() as f64
        };

        let ctx = InsightContext {
            metrics,
            total_tasks: tasks.len(),
            completion_rate,
            peak_hours: &peak_hours,
            average_session,
            preferences,
            config: &self.config,
        };
        let mut suggestions = apply_rules(&insight_rules(), &ctx);
        if let Some(hint) = advisory {
            append_unique(&mut suggestions, hint.suggestions.iter().cloned());
        }

        tracing::debug!(
            peak_hours = ?peak_hours,
            completion_rate,
            suggestions = suggestions.len(),
            "generated user insights"
        );

        UserInsights {
            preferred_task_types: self.preferred_types(tasks),
            average_task_duration: average_task_duration(entries),
            peak_productivity_hours: peak_hours,
            completion_rate,
            improvement_suggestions: suggestions,
        }
    }

    fn preferred_types(&self, tasks: &[&Task]) -> Vec<TagFrequency> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for task in tasks.iter().filter(|t| t.is_completed()) {
            for tag in &task.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        // Alphabetical from the BTreeMap; stable sort keeps it for ties.
        let mut ranked: Vec<TagFrequency> = counts
            .into_iter()
            .map(|(tag, count)| TagFrequency {
                tag: tag.to_string(),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(self.config.max_preferred_types);
        ranked
    }
}

/// Completed tasks as a percentage of all tasks; 0 for an empty list.
pub fn completion_rate(tasks: &[&Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let completed = tasks.iter().filter(|t| t.is_completed()).count();
    completed as f64 / tasks.len() as f64 * 100.0
}

fn average_task_duration(entries: &[&TimeEntry]) -> f64 {
    let mut per_task: BTreeMap<&str, Vec<&TimeEntry>> = BTreeMap::new();
    for entry in entries {
        per_task.entry(entry.task_id.as_str()).or_default().push(entry);
    }
    if per_task.is_empty() {
        return 0.0;
    }
    let total: f64 = per_task
        .values()
        .map(|task_entries| ms_to_minutes(sum_duration_ms(task_entries.iter().copied())))
        .sum();
    total / per_task.len() as f64
}
