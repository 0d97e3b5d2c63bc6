//! Team-level aggregation.
//!
//! Team productivity is the mean of each member's productivity score as
//! computed by [`ProductivityCalculator`], rescaled to 0-1. Task distribution
//! is each member's share of completed tasks by assignee; completed work with
//! no assignee, or assigned outside the member list, is reported separately
//! as `unassigned_share`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::primitives::{ms_to_minutes, valid_entries, valid_tasks, Validated};
use super::productivity::{ProductivityCalculator, ProductivityMetrics};
use super::recommendations::team_recommendations;
use crate::config::{ProductivityConfig, RecommendationConfig, TeamConfig};
use crate::error::ConfigError;
use crate::model::{Task, TimeEntry};

/// Productivity of one team member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProductivity {
    pub member: String,
    pub metrics: ProductivityMetrics,
}

/// Team analytics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamAnalytics {
    /// Mean member productivity score rescaled to 0-1
    pub team_productivity: f64,
    /// Share of tracked tasks worked on by more than one user (0-1)
    pub collaboration_score: f64,
    /// Member -> share of completed tasks
    pub task_distribution: BTreeMap<String, f64>,
    /// Share of completed tasks not assigned to a listed member
    pub unassigned_share: f64,
    /// Ids of tasks whose logged time reached the bottleneck multiple of
    /// their estimate, worst overrun first
    pub bottleneck_tasks: Vec<String>,
    pub members: Vec<MemberProductivity>,
    pub recommendations: Vec<String>,
}

/// Aggregator for [`TeamAnalytics`].
#[derive(Debug, Clone)]
pub struct TeamAggregator {
    config: TeamConfig,
    productivity: ProductivityCalculator,
    recommendations: RecommendationConfig,
}

impl Default for TeamAggregator {
    fn default() -> Self {
        Self {
            config: TeamConfig::default(),
            productivity: ProductivityCalculator::default(),
            recommendations: RecommendationConfig::default(),
        }
    }
}

impl TeamAggregator {
    /// Create an aggregator, rejecting an invalid config.
    pub fn new(
        config: TeamConfig,
        productivity: ProductivityConfig,
        recommendations: RecommendationConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        recommendations.validate()?;
        Ok(Self {
            config,
            productivity: ProductivityCalculator::new(productivity)?,
            recommendations,
        })
    }

    pub fn aggregate(
        &self,
        tasks: &[Task],
        entries: &[TimeEntry],
        members: &[String],
    ) -> Validated<TeamAnalytics> {
        let (tasks, mut warnings) = valid_tasks(tasks);
        let (entries, entry_warnings) = valid_entries(entries);
        warnings.extend(entry_warnings);

        Validated::new(self.aggregate_checked(&tasks, &entries, members), warnings)
    }

    pub(crate) fn aggregate_checked(
        &self,
        tasks: &[&Task],
        entries: &[&TimeEntry],
        members: &[String],
    ) -> TeamAnalytics {
        let members: BTreeSet<&str> = members.iter().map(String::as_str).collect();

        let member_metrics = self.member_metrics(tasks, entries, &members);
        let team_productivity = if member_metrics.is_empty() {
            0.0
        } else {
            member_metrics
                .iter()
                .map(|m| m.metrics.productivity_score)
                .sum::<f64>()
                / member_metrics.len() as f64
                / 100.0
        };

        let (task_distribution, unassigned_share) = distribution(tasks, &members);

        let mut analytics = TeamAnalytics {
            team_productivity,
            collaboration_score: collaboration_score(tasks, entries),
            task_distribution,
            unassigned_share,
            bottleneck_tasks: self.bottlenecks(tasks, entries),
            members: member_metrics,
            recommendations: Vec::new(),
        };
        analytics.recommendations = team_recommendations(&analytics, &self.recommendations);

        tracing::debug!(
            members = members.len(),
            tasks = tasks.len(),
            bottlenecks = analytics.bottleneck_tasks.len(),
            team_productivity = analytics.team_productivity,
            "aggregated team analytics"
        );
        analytics
    }

    fn member_metrics(
        &self,
        tasks: &[&Task],
        entries: &[&TimeEntry],
        members: &BTreeSet<&str>,
    ) -> Vec<MemberProductivity> {
        members
            .iter()
            .map(|member| {
                let own_tasks: Vec<&Task> = tasks
                    .iter()
                    .copied()
                    .filter(|t| t.assignee.as_deref() == Some(*member))
                    .collect();
                let own_entries: Vec<&TimeEntry> = entries
                    .iter()
                    .copied()
                    .filter(|e| e.user_id == *member)
                    .collect();
                MemberProductivity {
                    member: member.to_string(),
                    metrics: self.productivity.compute_checked(&own_tasks, &own_entries),
                }
            })
            .collect()
    }

    fn bottlenecks(&self, tasks: &[&Task], entries: &[&TimeEntry]) -> Vec<String> {
        let mut logged_ms: HashMap<&str, i64> = HashMap::new();
        for entry in entries {
            let logged = logged_ms.entry(entry.task_id.as_str()).or_insert(0);
            *logged = logged.saturating_add(entry.duration_ms());
        }

        let mut overruns: Vec<(&str, f64)> = tasks
            .iter()
            .filter(|t| t.estimated_time > 0.0)
            .filter_map(|t| {
                let logged = ms_to_minutes(*logged_ms.get(t.id.as_str())?);
                let ratio = logged / t.estimated_time;
                (ratio >= self.config.bottleneck_multiplier).then_some((t.id.as_str(), ratio))
            })
            .collect();

        overruns.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        overruns.into_iter().map(|(id, _)| id.to_string()).collect()
    }
}

/// Member shares of completed tasks plus the unassigned share.
///
/// All shares sum to 1 when any task is completed, else everything is 0.
fn distribution(tasks: &[&Task], members: &BTreeSet<&str>) -> (BTreeMap<String, f64>, f64) {
    let mut counts: BTreeMap<String, usize> =
        members.iter().map(|m| (m.to_string(), 0)).collect();
    let mut unassigned = 0usize;
    let mut completed = 0usize;

    for task in tasks.iter().filter(|t| t.is_completed()) {
        completed += 1;
        match task.assignee.as_deref() {
            Some(member) if members.contains(member) => {
                if let Some(count) = counts.get_mut(member) {
                    *count += 1;
                }
            }
            _ => unassigned += 1,
        }
    }

    if completed == 0 {
        let zeros = counts.into_keys().map(|m| (m, 0.0)).collect();
        return (zeros, 0.0);
    }

    let total = completed as f64;
    let shares = counts
        .into_iter()
        .map(|(member, count)| (member, count as f64 / total))
        .collect();
    (shares, unassigned as f64 / total)
}

/// Share of tracked team tasks with entries from more than one user.
fn collaboration_score(tasks: &[&Task], entries: &[&TimeEntry]) -> f64 {
    let task_ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

    let mut contributors: HashMap<&str, HashSet<&str>> = HashMap::new();
    for entry in entries {
        if task_ids.contains(entry.task_id.as_str()) {
            contributors
                .entry(entry.task_id.as_str())
                .or_default()
                .insert(entry.user_id.as_str());
        }
    }

    if contributors.is_empty() {
        return 0.0;
    }
    let shared = contributors.values().filter(|users| users.len() > 1).count();
    shared as f64 / contributors.len() as f64
}
