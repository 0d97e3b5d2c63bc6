//! Analytics engine facade.
//!
//! [`AnalyticsEngine`] holds one validated [`EngineConfig`] and the
//! calculators built from it. It is stateless between calls, so a single
//! instance can be shared across threads.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{ConfigError, CoreError, ValidationWarning};
use crate::model::{AdvisoryHint, Snapshot, Task, TimeEntry, UserPreferences};
use crate::stats::{
    valid_entries, valid_tasks, CompletionPredictor, InsightGenerator, Prediction,
    ProductivityCalculator, ProductivityMetrics, RecommendationComposer, Recommendations,
    TeamAggregator, TeamAnalytics, UserInsights, Validated,
};

/// Everything the engine derives from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub metrics: ProductivityMetrics,
    pub insights: UserInsights,
    /// Present only when the snapshot lists team members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamAnalytics>,
    pub recommendations: Recommendations,
    #[serde(default)]
    pub warnings: Vec<ValidationWarning>,
}

/// One user's input to [`AnalyticsEngine::analyze_batch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshotJob {
    pub user_id: String,
    pub snapshot: Snapshot,
    /// Replaces the engine config for this job only
    #[serde(default)]
    pub config: Option<EngineConfig>,
}

/// One user's batch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserReport {
    pub user_id: String,
    #[serde(flatten)]
    pub report: AnalyticsReport,
}

#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: EngineConfig,
    productivity: ProductivityCalculator,
    insights: InsightGenerator,
    team: TeamAggregator,
    predictor: CompletionPredictor,
    composer: RecommendationComposer,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            productivity: ProductivityCalculator::default(),
            insights: InsightGenerator::default(),
            team: TeamAggregator::default(),
            predictor: CompletionPredictor::default(),
            composer: RecommendationComposer::default(),
        }
    }
}

impl AnalyticsEngine {
    /// Build an engine, rejecting an invalid config before any computation.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            productivity: ProductivityCalculator::new(config.productivity.clone())?,
            insights: InsightGenerator::new(config.insights.clone(), config.productivity.clone())?,
            team: TeamAggregator::new(
                config.team.clone(),
                config.productivity.clone(),
                config.recommendations.clone(),
            )?,
            predictor: CompletionPredictor::new(config.prediction.clone())?,
            composer: RecommendationComposer::new(
                config.recommendations.clone(),
                config.insights.clone(),
            )?,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compute_metrics(
        &self,
        tasks: &[Task],
        entries: &[TimeEntry],
    ) -> Validated<ProductivityMetrics> {
        self.productivity.compute(tasks, entries)
    }

    pub fn generate_insights(
        &self,
        tasks: &[Task],
        entries: &[TimeEntry],
        preferences: &UserPreferences,
        advisory: Option<&AdvisoryHint>,
    ) -> Validated<UserInsights> {
        self.insights
            .generate_with_advice(tasks, entries, preferences, advisory)
    }

    pub fn aggregate_team(
        &self,
        tasks: &[Task],
        entries: &[TimeEntry],
        members: &[String],
    ) -> Validated<TeamAnalytics> {
        self.team.aggregate(tasks, entries, members)
    }

    /// Predict `task` from completed tasks in `history`.
    ///
    /// The advisory estimate is used only when no comparable history exists.
    pub fn predict(
        &self,
        task: &Task,
        history: &[Task],
        advisory: Option<&AdvisoryHint>,
    ) -> Validated<Prediction> {
        self.predictor.predict_with_advice(task, history, advisory)
    }

    /// Compose recommendations. Without team analytics only personal and
    /// system advice is produced.
    pub fn recommend(
        &self,
        metrics: &ProductivityMetrics,
        insights: &UserInsights,
        team: Option<&TeamAnalytics>,
        advisory: Option<&AdvisoryHint>,
    ) -> Recommendations {
        let no_team = TeamAnalytics::default();
        self.composer
            .compose_with_advice(metrics, insights, team.unwrap_or(&no_team), advisory)
    }

    /// Run every analysis over a snapshot.
    ///
    /// Records are validated once; each warning appears a single time in the
    /// report.
    pub fn report(&self, snapshot: &Snapshot) -> AnalyticsReport {
        let (tasks, mut warnings) = valid_tasks(&snapshot.tasks);
        let (entries, entry_warnings) = valid_entries(&snapshot.time_entries);
        warnings.extend(entry_warnings);
        let (preferences, preference_warnings) = snapshot.preferences.sanitized();
        warnings.extend(preference_warnings);

        let advisory = snapshot.advisory.as_ref();
        let metrics = self.productivity.compute_checked(&tasks, &entries);
        let insights = self.insights.generate_checked(
            &tasks,
            &entries,
            &metrics,
            &preferences,
            advisory,
        );
        let team = if snapshot.members.is_empty() {
            None
        } else {
            Some(self.team.aggregate_checked(&tasks, &entries, &snapshot.members))
        };
        let recommendations = self.recommend(&metrics, &insights, team.as_ref(), advisory);

        tracing::debug!(
            tasks = tasks.len(),
            entries = entries.len(),
            warnings = warnings.len(),
            team = team.is_some(),
            "built analytics report"
        );

        AnalyticsReport {
            metrics,
            insights,
            team,
            recommendations,
            warnings,
        }
    }

    /// Analyze many users in parallel.
    ///
    /// Results come back in job order. A job whose config override is
    /// invalid fails in its own slot only.
    pub fn analyze_batch(&self, jobs: &[UserSnapshotJob]) -> Vec<Result<UserReport, CoreError>> {
        use rayon::prelude::*;

        jobs.par_iter().map(|job| self.analyze_job(job)).collect()
    }

    fn analyze_job(&self, job: &UserSnapshotJob) -> Result<UserReport, CoreError> {
        let report = match &job.config {
            Some(config) => {
                let engine = AnalyticsEngine::new(config.clone()).map_err(|e| {
                    tracing::warn!(user_id = %job.user_id, error = %e, "rejected job config");
                    CoreError::Member {
                        user_id: job.user_id.clone(),
                        source: Box::new(CoreError::Config(e)),
                    }
                })?;
                engine.report(&job.snapshot)
            }
            None => self.report(&job.snapshot),
        };
        Ok(UserReport {
            user_id: job.user_id.clone(),
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskStatus};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn snapshot(user: &str) -> Snapshot {
        let done = Task::new("t1", Priority::High, TaskStatus::Todo, 60.0, at(8, 0))
            .with_assignee(user)
            .completed_with(55.0, at(11, 0));
        let open = Task::new("t2", Priority::Low, TaskStatus::InProgress, 30.0, at(8, 0))
            .with_assignee(user);
        Snapshot {
            tasks: vec![done, open],
            time_entries: vec![
                TimeEntry::spanning("e1", "t1", user, at(9, 0), 55),
                TimeEntry::spanning("e2", "t2", user, at(10, 0), 20),
            ],
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.team.bottleneck_multiplier = 0.0;
        assert!(matches!(
            AnalyticsEngine::new(config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_report_matches_individual_operations() {
        let engine = AnalyticsEngine::default();
        let snap = snapshot("ana");
        let report = engine.report(&snap);

        let metrics = engine.compute_metrics(&snap.tasks, &snap.time_entries);
        assert_eq!(report.metrics, metrics.value);
        let insights =
            engine.generate_insights(&snap.tasks, &snap.time_entries, &snap.preferences, None);
        assert_eq!(report.insights, insights.value);
        assert!(report.team.is_none());
        assert!(report.recommendations.team.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_report_includes_team_when_members_listed() {
        let engine = AnalyticsEngine::default();
        let mut snap = snapshot("ana");
        snap.members = vec!["ana".to_string(), "ben".to_string()];
        let team = engine.report(&snap).team.expect("team analytics");
        assert_eq!(team.members.len(), 2);
        assert_eq!(team.task_distribution["ana"], 1.0);
    }

    #[test]
    fn test_report_lists_each_warning_once() {
        let engine = AnalyticsEngine::default();
        let mut snap = snapshot("ana");
        snap.members = vec!["ana".to_string()];
        let mut bad = TimeEntry::spanning("bad", "t1", "ana", at(12, 0), 10);
        std::mem::swap(&mut bad.start_time, &mut bad.end_time);
        snap.time_entries.push(bad);

        let report = engine.report(&snap);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.metrics.focus_time, 75.0);
    }

    #[test]
    fn test_insight_and_system_advice_share_efficiency_threshold() {
        let mut config = EngineConfig::default();
        config.insights.low_efficiency = 0.95;
        let engine = AnalyticsEngine::new(config).unwrap();

        let task = Task::new("t1", Priority::Medium, TaskStatus::Todo, 60.0, at(8, 0))
            .completed_with(66.0, at(11, 0));
        let snap = Snapshot {
            tasks: vec![task],
            time_entries: vec![TimeEntry::spanning("e1", "t1", "ana", at(9, 0), 66)],
            ..Snapshot::default()
        };
        let report = engine.report(&snap);

        assert!(report.metrics.efficiency < 0.95);
        assert!(report.insights.improvement_suggestions.iter().any(|s| s.contains("pad estimates")));
        assert!(report.recommendations.system.iter().any(|s| s.starts_with("Recalibrate")));

        let relaxed = AnalyticsEngine::default().report(&snap);
        assert!(!relaxed.insights.improvement_suggestions.iter().any(|s| s.contains("pad estimates")));
        assert!(!relaxed.recommendations.system.iter().any(|s| s.starts_with("Recalibrate")));
    }

    #[test]
    fn test_report_warns_about_invalid_preferences() {
        let engine = AnalyticsEngine::default();
        let mut snap = snapshot("ana");
        let baseline = engine.report(&snap);
        snap.preferences.work_end_hour = 30;

        let report = engine.report(&snap);
        assert!(matches!(
            report.warnings.as_slice(),
            [ValidationWarning::InvalidPreference { field, value: 30 }] if field == "work_end_hour"
        ));
        assert_eq!(report.insights, baseline.insights);
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_bad_config() {
        let engine = AnalyticsEngine::default();
        let mut bad_config = EngineConfig::default();
        bad_config.prediction.min_sample_size = 0;

        let jobs = vec![
            UserSnapshotJob {
                user_id: "ana".to_string(),
                snapshot: snapshot("ana"),
                config: None,
            },
            UserSnapshotJob {
                user_id: "ben".to_string(),
                snapshot: snapshot("ben"),
                config: Some(bad_config),
            },
            UserSnapshotJob {
                user_id: "cy".to_string(),
                snapshot: snapshot("cy"),
                config: None,
            },
        ];

        let results = engine.analyze_batch(&jobs);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().user_id, "ana");
        match &results[1] {
            Err(CoreError::Member { user_id, .. }) => assert_eq!(user_id, "ben"),
            other => panic!("expected member error, got {other:?}"),
        }
        assert_eq!(results[2].as_ref().unwrap().user_id, "cy");
        assert_eq!(
            results[0].as_ref().unwrap().report,
            results[2].as_ref().unwrap().report
        );
    }

    #[test]
    fn test_batch_applies_config_override() {
        let engine = AnalyticsEngine::default();
        let mut config = EngineConfig::default();
        config.productivity.score_scale = 20.0;

        let jobs = vec![UserSnapshotJob {
            user_id: "ana".to_string(),
            snapshot: snapshot("ana"),
            config: Some(config),
        }];
        let base = engine.report(&snapshot("ana")).metrics.productivity_score;
        let results = engine.analyze_batch(&jobs);
        let report = &results[0].as_ref().unwrap().report;
        assert!((report.metrics.productivity_score - (base * 2.0).min(100.0)).abs() < 1e-9);
    }
}
