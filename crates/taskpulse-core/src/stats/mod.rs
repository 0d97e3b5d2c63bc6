//! Statistics module for taskpulse
//!
//! This module provides the analytics behind the engine: metric primitives,
//! per-user productivity metrics and insights, team aggregation, completion
//! time prediction, and rule-based recommendations.

mod insights;
mod prediction;
mod primitives;
mod productivity;
mod recommendations;
pub mod rules;
mod team;

pub use primitives::{
    bucket_by_hour, busiest_hour, quietest_hour, rank_hours, rate, total_duration,
    valid_entries, valid_tasks, Validated,
};

pub use productivity::{ProductivityCalculator, ProductivityMetrics};

pub use insights::{
    completion_rate, insight_rules, InsightContext, InsightGenerator, TagFrequency, UserInsights,
};

pub use team::{MemberProductivity, TeamAggregator, TeamAnalytics};

pub use prediction::{confidence_score, CompletionPredictor, Prediction, SimilarityTier};

pub use recommendations::{
    personal_rules, system_rules, team_recommendations, team_rules, PersonalContext,
    RecommendationComposer, Recommendations, SystemContext, TeamContext,
};
