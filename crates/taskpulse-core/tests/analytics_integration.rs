//! Integration tests for the analytics engine.
//!
//! Drives the public API end to end: snapshot JSON in, metrics, insights,
//! team analytics, predictions and recommendations out.

use chrono::{DateTime, Duration, TimeZone, Utc};
use taskpulse_core::{
    AdvisoryHint, AnalyticsEngine, EngineConfig, Priority, SimilarityTier, Snapshot, Task, TaskStatus,
    TimeEntry, UserSnapshotJob, ValidationWarning,
};

fn day(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, h, 0, 0).unwrap()
}

#[test]
fn test_three_completed_tasks_scenario() {
    let engine = AnalyticsEngine::default();
    let tasks: Vec<Task> = [30.0, 60.0, 90.0]
        .iter()
        .enumerate()
        .map(|(i, actual)| {
            Task::new(format!("t{i}"), Priority::Medium, TaskStatus::Todo, *actual, day(2, 7))
                .completed_with(*actual, day(2, 18))
        })
        .collect();
    let entries = vec![
        TimeEntry::spanning("e0", "t0", "ana", day(2, 9), 30),
        TimeEntry::spanning("e1", "t1", "ana", day(2, 10), 60),
        TimeEntry::spanning("e2", "t2", "ana", day(2, 12), 90),
    ];

    let metrics = engine.compute_metrics(&tasks, &entries);
    assert!(metrics.is_clean());
    assert_eq!(metrics.value.tasks_completed, 3);
    assert_eq!(metrics.value.average_completion_time, 60.0);
    assert_eq!(metrics.value.focus_time, 180.0);
    assert!((metrics.value.productivity_score - 10.0).abs() < 1e-9);
    assert_eq!(metrics.value.efficiency, 1.0);
}

#[test]
fn test_empty_snapshot_yields_zero_defaults() {
    let engine = AnalyticsEngine::default();
    let report = engine.report(&Snapshot::default());

    assert_eq!(report.metrics.tasks_completed, 0);
    assert_eq!(report.metrics.productivity_score, 0.0);
    assert_eq!(report.metrics.focus_time, 0.0);
    assert_eq!(report.metrics.break_time, 0.0);
    assert_eq!(report.metrics.efficiency, 0.0);
    assert!(report.insights.peak_productivity_hours.is_empty());
    assert_eq!(report.insights.completion_rate, 0.0);
    assert!(report.team.is_none());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_high_priority_prediction_scenario() {
    let engine = AnalyticsEngine::default();
    let history: Vec<Task> = [40.0, 50.0, 60.0, 70.0, 80.0]
        .iter()
        .enumerate()
        .map(|(i, actual)| {
            let created = day(1, 8) + Duration::days(i as i64);
            Task::new(format!("h{i}"), Priority::High, TaskStatus::Todo, 60.0, created)
                .completed_with(*actual, created + Duration::hours(4))
        })
        .collect();
    let target = Task::new("new", Priority::High, TaskStatus::Todo, 45.0, day(10, 8));

    let prediction = engine.predict(&target, &history, None).value;
    assert!(prediction.estimated_time >= 40.0 && prediction.estimated_time <= 80.0);
    assert!(prediction.confidence > 0.0);
    assert!(prediction.factors.iter().any(|f| f == "priority match"));
    assert_eq!(prediction.tier, SimilarityTier::PriorityMatch);
    assert_eq!(prediction.sample_size, 5);
}

#[test]
fn test_prediction_uses_advisory_estimate_without_history() {
    let engine = AnalyticsEngine::default();
    let target = Task::new("new", Priority::Urgent, TaskStatus::Todo, 45.0, day(10, 8));
    let advisory = AdvisoryHint {
        estimated_time: Some(90.0),
        ..AdvisoryHint::default()
    };

    let prediction = engine.predict(&target, &[], Some(&advisory)).value;
    assert_eq!(prediction.estimated_time, 90.0);
    assert_eq!(prediction.tier, SimilarityTier::NoHistory);
    assert_eq!(prediction.factors, vec!["advisory estimate".to_string()]);

    let without = engine.predict(&target, &[], None).value;
    assert_eq!(without.estimated_time, 45.0);
}

#[test]
fn test_snapshot_json_with_malformed_records() {
    let json = r#"{
        "tasks": [
            {"id": "a", "priority": "high", "status": "completed", "assignee": "ana",
             "estimated_time": 60, "actual_time": 90, "tags": ["backend"],
             "created_at": "2026-03-02T08:00:00Z", "updated_at": "2026-03-02T12:00:00Z"},
            {"id": "b", "priority": "low", "status": "todo", "assignee": "ben",
             "estimated_time": -5,
             "created_at": "2026-03-02T08:00:00Z", "updated_at": "2026-03-02T08:00:00Z"}
        ],
        "time_entries": [
            {"id": "e1", "task_id": "a", "user_id": "ana",
             "start_time": "2026-03-02T09:00:00Z", "end_time": "2026-03-02T10:30:00Z"},
            {"id": "e2", "task_id": "a", "user_id": "ana",
             "start_time": "2026-03-02T11:00:00Z", "end_time": "2026-03-02T10:00:00Z"}
        ],
        "members": ["ana", "ben"]
    }"#;
    let snapshot: Snapshot = serde_json::from_str(json).unwrap();
    let report = AnalyticsEngine::default().report(&snapshot);

    assert_eq!(report.warnings.len(), 2);
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, ValidationWarning::NegativeEstimate { task_id, .. } if task_id == "b")));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, ValidationWarning::InvertedTimeEntry { entry_id, .. } if entry_id == "e2")));

    assert_eq!(report.metrics.focus_time, 90.0);
    assert_eq!(report.insights.peak_productivity_hours, vec![9, 10]);
    assert_eq!(report.insights.preferred_task_types[0].tag, "backend");

    let team = report.team.expect("team analytics");
    assert_eq!(team.task_distribution["ana"], 1.0);
    assert_eq!(team.task_distribution["ben"], 0.0);
    assert_eq!(team.bottleneck_tasks, vec!["a".to_string()]);
}

#[test]
fn test_team_collaboration_and_bottlenecks() {
    let engine = AnalyticsEngine::default();
    let tasks = vec![
        Task::new("shared", Priority::High, TaskStatus::Todo, 60.0, day(2, 7))
            .with_assignee("ana")
            .completed_with(120.0, day(2, 17)),
        Task::new("solo", Priority::Low, TaskStatus::Todo, 30.0, day(2, 7))
            .with_assignee("ben")
            .completed_with(30.0, day(2, 17)),
    ];
    let entries = vec![
        TimeEntry::spanning("e1", "shared", "ana", day(2, 9), 60),
        TimeEntry::spanning("e2", "shared", "ben", day(2, 10), 60),
        TimeEntry::spanning("e3", "solo", "ben", day(2, 13), 30),
    ];
    let members = vec!["ana".to_string(), "ben".to_string()];

    let team = engine.aggregate_team(&tasks, &entries, &members).value;
    assert_eq!(team.collaboration_score, 0.5);
    assert_eq!(team.bottleneck_tasks, vec!["shared".to_string()]);
    assert_eq!(team.task_distribution["ana"], 0.5);
    assert_eq!(team.task_distribution["ben"], 0.5);
    assert_eq!(team.unassigned_share, 0.0);
    assert!(team.team_productivity > 0.0 && team.team_productivity <= 1.0);
}

#[test]
fn test_batch_matches_sequential_reports() {
    let engine = AnalyticsEngine::default();
    let jobs: Vec<UserSnapshotJob> = (0..8)
        .map(|i| {
            let user = format!("user{i}");
            let task = Task::new(format!("t{i}"), Priority::Medium, TaskStatus::Todo, 30.0, day(2, 7))
                .completed_with(30.0 + i as f64, day(2, 18));
            let entry = TimeEntry::spanning(format!("e{i}"), format!("t{i}"), user.as_str(), day(2, 9), 30 + i);
            UserSnapshotJob {
                user_id: user,
                snapshot: Snapshot {
                    tasks: vec![task],
                    time_entries: vec![entry],
                    ..Snapshot::default()
                },
                config: None,
            }
        })
        .collect();

    let results = engine.analyze_batch(&jobs);
    for (job, result) in jobs.iter().zip(&results) {
        let report = result.as_ref().unwrap();
        assert_eq!(report.user_id, job.user_id);
        assert_eq!(report.report, engine.report(&job.snapshot));
    }
}

#[test]
fn test_engine_from_toml_config() {
    let config = EngineConfig::from_toml_str(
        r#"
[team]
bottleneck_multiplier = 3.0
"#,
    )
    .unwrap();
    let engine = AnalyticsEngine::new(config).unwrap();
    assert_eq!(engine.config().team.bottleneck_multiplier, 3.0);

    let tasks = vec![Task::new("t", Priority::Medium, TaskStatus::Todo, 60.0, day(2, 7))];
    let entries = vec![TimeEntry::spanning("e", "t", "ana", day(2, 9), 120)];
    let team = engine
        .aggregate_team(&tasks, &entries, &["ana".to_string()])
        .value;
    assert!(team.bottleneck_tasks.is_empty());
}
