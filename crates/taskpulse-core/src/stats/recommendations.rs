//! Categorized recommendations from metrics, insights and team analytics.
//!
//! Three rule tables (personal, team, system) are evaluated in order. Output
//! depends only on the inputs and thresholds, so identical snapshots always
//! produce identical advice.

use serde::{Deserialize, Serialize};

use super::insights::UserInsights;
use super::productivity::ProductivityMetrics;
use super::rules::{append_unique, apply_rules, Rule};
use super::team::TeamAnalytics;
use crate::config::{InsightConfig, RecommendationConfig};
use crate::error::ConfigError;
use crate::model::AdvisoryHint;

/// Recommendations grouped by audience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub personal: Vec<String>,
    pub team: Vec<String>,
    pub system: Vec<String>,
}

#[derive(Debug)]
pub struct PersonalContext<'a> {
    pub metrics: &'a ProductivityMetrics,
    pub insights: &'a UserInsights,
    pub advisory: Option<&'a AdvisoryHint>,
    pub config: &'a RecommendationConfig,
    /// Break, completion and efficiency thresholds shared with insights
    pub thresholds: &'a InsightConfig,
}

#[derive(Debug)]
pub struct TeamContext<'a> {
    pub analytics: &'a TeamAnalytics,
    pub config: &'a RecommendationConfig,
}

impl TeamContext<'_> {
    fn has_team(&self) -> bool {
        !self.analytics.task_distribution.is_empty()
    }
}

#[derive(Debug)]
pub struct SystemContext<'a> {
    pub metrics: &'a ProductivityMetrics,
    pub insights: &'a UserInsights,
    pub team: &'a TeamAnalytics,
    pub thresholds: &'a InsightConfig,
}

pub fn personal_rules<'a>() -> Vec<Rule<PersonalContext<'a>>> {
    vec![
        Rule::new(
            "low_productivity",
            |ctx: &PersonalContext<'a>| {
                ctx.metrics.focus_time > 0.0
                    && ctx.metrics.productivity_score < ctx.config.low_productivity_score
            },
            |ctx: &PersonalContext<'a>| {
                format!(
                    "Focus on high-priority tasks during peak hours; your productivity score is {:.0}/100.",
                    ctx.metrics.productivity_score
                )
            },
        ),
        Rule::new(
            "take_breaks",
            |ctx: &PersonalContext<'a>| {
                ctx.metrics.focus_time > 0.0 && ctx.metrics.break_ratio() < ctx.thresholds.min_break_ratio
            },
            |_: &PersonalContext<'a>| "Take regular breaks to maintain productivity.".to_string(),
        ),
        Rule::new(
            "finish_open_tasks",
            |ctx: &PersonalContext<'a>| {
                (ctx.metrics.focus_time > 0.0 || ctx.insights.completion_rate > 0.0)
                    && ctx.insights.completion_rate < ctx.thresholds.low_completion_rate
            },
            |ctx: &PersonalContext<'a>| {
                format!(
                    "Break complex tasks into smaller chunks; your completion rate is {:.0}%.",
                    ctx.insights.completion_rate
                )
            },
        ),
        Rule::new(
            "protect_peak_hours",
            |ctx: &PersonalContext<'a>| !ctx.insights.peak_productivity_hours.is_empty(),
            |ctx: &PersonalContext<'a>| {
                let hour = ctx.insights.peak_productivity_hours[0];
                format!(
                    "Protect {:02}:00-{:02}:00 for deep work on high-priority tasks.",
                    hour,
                    (hour + 1) % 24
                )
            },
        ),
        Rule::new(
            "advisory_priority",
            |ctx: &PersonalContext<'a>| ctx.advisory.and_then(|a| a.priority).is_some(),
            |ctx: &PersonalContext<'a>| {
                let priority = ctx
                    .advisory
                    .and_then(|a| a.priority)
                    .map(|p| p.as_str())
                    .unwrap_or_default();
                format!("The task analyzer rates the current task as {priority} priority; plan your day around it.")
            },
        ),
    ]
}

pub fn team_rules<'a>() -> Vec<Rule<TeamContext<'a>>> {
    vec![
        Rule::new(
            "review_bottlenecks",
            |ctx: &TeamContext<'a>| !ctx.analytics.bottleneck_tasks.is_empty(),
            |ctx: &TeamContext<'a>| {
                format!(
                    "Review {} bottleneck task(s) running well past their estimates: {}.",
                    ctx.analytics.bottleneck_tasks.len(),
                    ctx.analytics.bottleneck_tasks.join(", ")
                )
            },
        ),
        Rule::new(
            "encourage_collaboration",
            |ctx: &TeamContext<'a>| {
                ctx.has_team()
                    && ctx.analytics.task_distribution.len() > 1
                    && ctx.analytics.collaboration_score < ctx.config.low_collaboration
            },
            |ctx: &TeamContext<'a>| {
                format!(
                    "Improve communication between team members; only {:.0}% of tracked tasks involve more than one contributor.",
                    ctx.analytics.collaboration_score * 100.0
                )
            },
        ),
        Rule::new(
            "rebalance_workload",
            |ctx: &TeamContext<'a>| {
                share_spread(ctx.analytics).is_some_and(|(_, spread)| spread > ctx.config.imbalance_threshold)
            },
            |ctx: &TeamContext<'a>| {
                let (top, _) = share_spread(ctx.analytics).unwrap_or_default();
                let share = ctx.analytics.task_distribution.get(&top).copied().unwrap_or(0.0);
                format!(
                    "Redistribute workload to balance team capacity; {} handles {:.0}% of completed work.",
                    top,
                    share * 100.0
                )
            },
        ),
        Rule::new(
            "assign_owners",
            |ctx: &TeamContext<'a>| ctx.analytics.unassigned_share > ctx.config.max_unassigned_share,
            |ctx: &TeamContext<'a>| {
                format!(
                    "Assign owners to the {:.0}% of completed work that has no team assignee.",
                    ctx.analytics.unassigned_share * 100.0
                )
            },
        ),
        Rule::new(
            "team_throughput",
            |ctx: &TeamContext<'a>| {
                ctx.analytics.members.iter().any(|m| m.metrics.focus_time > 0.0)
                    && ctx.analytics.team_productivity < ctx.config.low_team_productivity
            },
            |ctx: &TeamContext<'a>| {
                format!(
                    "Implement a clearer task prioritization system; team productivity is {:.0}% of target.",
                    ctx.analytics.team_productivity * 100.0
                )
            },
        ),
    ]
}

pub fn system_rules<'a>() -> Vec<Rule<SystemContext<'a>>> {
    vec![
        Rule::new(
            "recalibrate_estimates",
            |ctx: &SystemContext<'a>| {
                ctx.metrics.efficiency > 0.0 && ctx.metrics.efficiency < ctx.thresholds.low_efficiency
            },
            |_: &SystemContext<'a>| {
                "Recalibrate default task estimates; tracked work runs longer than planned.".to_string()
            },
        ),
        Rule::new(
            "enable_tracking",
            |ctx: &SystemContext<'a>| ctx.metrics.tasks_completed > 0 && ctx.metrics.focus_time == 0.0,
            |_: &SystemContext<'a>| {
                "Enable time tracking; tasks are being completed without any logged time.".to_string()
            },
        ),
        Rule::new(
            "flag_bottlenecks_early",
            |ctx: &SystemContext<'a>| !ctx.team.bottleneck_tasks.is_empty(),
            |_: &SystemContext<'a>| {
                "Flag tasks automatically once logged time passes their estimate so blockers surface early.".to_string()
            },
        ),
        Rule::new(
            "suggest_preferred_work",
            |ctx: &SystemContext<'a>| !ctx.insights.preferred_task_types.is_empty(),
            |ctx: &SystemContext<'a>| {
                format!(
                    "Surface '{}' tasks first in suggestions; it is the most frequently completed task type.",
                    ctx.insights.preferred_task_types[0].tag
                )
            },
        ),
    ]
}

/// Member with the largest share and the largest-minus-smallest spread.
///
/// `None` for fewer than two members or no completed work.
fn share_spread(analytics: &TeamAnalytics) -> Option<(String, f64)> {
    if analytics.task_distribution.len() < 2 {
        return None;
    }
    let mut top: Option<(&String, f64)> = None;
    let mut low = f64::INFINITY;
    for (member, share) in &analytics.task_distribution {
        if top.map_or(true, |(_, best)| *share > best) {
            top = Some((member, *share));
        }
        low = low.min(*share);
    }
    let (member, high) = top?;
    if high <= 0.0 {
        return None;
    }
    Some((member.clone(), high - low))
}

/// Composer for [`Recommendations`].
#[derive(Debug, Clone, Default)]
pub struct RecommendationComposer {
    config: RecommendationConfig,
    thresholds: InsightConfig,
}

impl RecommendationComposer {
    /// Create a composer, rejecting an invalid config.
    ///
    /// Personal and system rules read their break, completion and efficiency
    /// thresholds from `insights`, the same values the insight rules use.
    pub fn new(config: RecommendationConfig, insights: InsightConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        insights.validate()?;
        Ok(Self {
            config,
            thresholds: insights,
        })
    }

    pub fn compose(
        &self,
        metrics: &ProductivityMetrics,
        insights: &UserInsights,
        team: &TeamAnalytics,
    ) -> Recommendations {
        self.compose_with_advice(metrics, insights, team, None)
    }

    /// Compose recommendations, appending advisory suggestions to `personal`.
    pub fn compose_with_advice(
        &self,
        metrics: &ProductivityMetrics,
        insights: &UserInsights,
        team: &TeamAnalytics,
        advisory: Option<&AdvisoryHint>,
    ) -> Recommendations {
        let personal_ctx = PersonalContext {
            metrics,
            insights,
            advisory,
            config: &self.config,
            thresholds: &self.thresholds,
        };
        let mut personal = apply_rules(&personal_rules(), &personal_ctx);
        if let Some(hint) = advisory {
            append_unique(&mut personal, hint.suggestions.iter().cloned());
        }

        let system_ctx = SystemContext {
            metrics,
            insights,
            team,
            thresholds: &self.thresholds,
        };

        Recommendations {
            personal,
            team: self.team(team),
            system: apply_rules(&system_rules(), &system_ctx),
        }
    }

    /// Team recommendations alone.
    pub fn team(&self, analytics: &TeamAnalytics) -> Vec<String> {
        team_recommendations(analytics, &self.config)
    }
}

/// Team rule output for `analytics` under `config`.
pub fn team_recommendations(analytics: &TeamAnalytics, config: &RecommendationConfig) -> Vec<String> {
    let ctx = TeamContext { analytics, config };
    apply_rules(&team_rules(), &ctx)
}
