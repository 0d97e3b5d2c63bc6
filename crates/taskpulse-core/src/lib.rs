//! # Taskpulse Core Library
//!
//! This library provides the analytics engine behind taskpulse: productivity
//! metrics, behavioral insights, team aggregation, completion time prediction,
//! and recommendations, computed from snapshots of tasks and time entries.
//! The `taskpulse` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Model**: Tasks, time entries, preferences and the snapshot bundling them
//! - **Stats**: Pure calculators over borrowed records; malformed records are
//!   excluded and reported as warnings next to the result
//! - **Config**: TOML-based engine configuration, validated eagerly
//! - **Engine**: Facade wiring the calculators together, including parallel
//!   batch analysis across users
//!
//! ## Key Components
//!
//! - [`AnalyticsEngine`]: Entry point for every analysis
//! - [`EngineConfig`]: Thresholds and weights for all calculators
//! - [`Validated`]: A result plus the records excluded to compute it

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod stats;

pub use config::{
    EngineConfig, InsightConfig, PredictionConfig, ProductivityConfig, RecommendationConfig,
    TeamConfig,
};
pub use engine::{AnalyticsEngine, AnalyticsReport, UserReport, UserSnapshotJob};
pub use error::{ConfigError, CoreError, Result, ValidationWarning};
pub use model::{AdvisoryHint, Priority, Snapshot, Task, TaskStatus, TimeEntry, UserPreferences};
pub use stats::{
    CompletionPredictor, InsightGenerator, Prediction, ProductivityCalculator,
    ProductivityMetrics, RecommendationComposer, Recommendations, SimilarityTier,
    TeamAggregator, TeamAnalytics, UserInsights, Validated,
};
