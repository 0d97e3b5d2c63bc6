//! Property tests over synthetic tasks and time entries.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;
use taskpulse_core::stats::{confidence_score, CompletionPredictor};
use taskpulse_core::{
    AnalyticsEngine, Priority, Task, TaskStatus, TimeEntry, UserPreferences,
};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
}

/// (start offset in minutes, duration in minutes)
fn spans() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0_i64..10_000, 0_i64..600), 0..24)
}

fn entries_from(spans: &[(i64, i64)]) -> Vec<TimeEntry> {
    spans
        .iter()
        .enumerate()
        .map(|(i, (offset, minutes))| {
            TimeEntry::spanning(
                format!("e{i}"),
                format!("t{}", i % 3),
                "ana",
                base() + Duration::minutes(*offset),
                *minutes,
            )
        })
        .collect()
}

/// `pairs` pairs of completed tasks at `mean * (1 - spread)` and
/// `mean * (1 + spread)`, so the coefficient of variation is always `spread`.
fn spread_history(pairs: usize, mean: f64, spread: f64, priority: Priority) -> Vec<Task> {
    (0..pairs * 2)
        .map(|i| {
            let actual = if i % 2 == 0 { mean * (1.0 - spread) } else { mean * (1.0 + spread) };
            let created = base() + Duration::days(i as i64);
            Task::new(format!("h{i}"), priority, TaskStatus::Todo, mean, created)
                .completed_with(actual, created + Duration::hours(2))
        })
        .collect()
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn test_focus_time_is_exact_sum_of_durations(spans in spans()) {
        let entries = entries_from(&spans);
        let metrics = AnalyticsEngine::default().compute_metrics(&[], &entries).value;
        let expected: i64 = spans.iter().map(|(_, minutes)| minutes).sum();
        prop_assert!(metrics.focus_time >= 0.0);
        prop_assert_eq!(metrics.focus_time, expected as f64);
    }

    #[test]
    fn test_productivity_score_stays_in_range(spans in spans(), completed in 0_usize..50) {
        let entries = entries_from(&spans);
        let tasks: Vec<Task> = (0..completed)
            .map(|i| {
                Task::new(format!("t{i}"), Priority::Medium, TaskStatus::Todo, 10.0, base())
                    .completed_with(10.0, base() + Duration::hours(1))
            })
            .collect();
        let metrics = AnalyticsEngine::default().compute_metrics(&tasks, &entries).value;
        prop_assert!((0.0..=100.0).contains(&metrics.productivity_score));
        if metrics.focus_time == 0.0 {
            prop_assert_eq!(metrics.productivity_score, 0.0);
        }
    }

    #[test]
    fn test_confidence_never_drops_with_more_samples(n in 0_usize..500, cv in 0.0_f64..5.0, scale in 0.0_f64..50.0) {
        let smaller = confidence_score(n, cv, scale);
        let larger = confidence_score(n + 1, cv, scale);
        prop_assert!(larger >= smaller);
        prop_assert!((0.0..=1.0).contains(&larger));
    }

    #[test]
    fn test_prediction_confidence_grows_with_history(
        pairs in 1_usize..40,
        mean in 10.0_f64..500.0,
        spread in 0.0_f64..0.9,
        priority in prop::sample::select(vec![Priority::Low, Priority::Medium, Priority::High, Priority::Urgent]),
    ) {
        let predictor = CompletionPredictor::default();
        let target = Task::new("target", priority, TaskStatus::Todo, mean, base());

        let smaller = predictor.predict(&target, &spread_history(pairs, mean, spread, priority)).value;
        let larger = predictor.predict(&target, &spread_history(pairs + 1, mean, spread, priority)).value;
        prop_assert_eq!(larger.sample_size, smaller.sample_size + 2);
        prop_assert!(larger.confidence >= smaller.confidence);
        prop_assert!((0.0..=1.0).contains(&larger.confidence));
    }

    #[test]
    fn test_distribution_shares_sum_to_one(assignees in prop::collection::vec(0_usize..4, 1..40)) {
        let members: Vec<String> = (0..4).map(|m| format!("m{m}")).collect();
        let tasks: Vec<Task> = assignees
            .iter()
            .enumerate()
            .map(|(i, m)| {
                Task::new(format!("t{i}"), Priority::Low, TaskStatus::Todo, 5.0, base())
                    .with_assignee(members[*m].as_str())
                    .completed_with(5.0, base() + Duration::hours(1))
            })
            .collect();
        let team = AnalyticsEngine::default().aggregate_team(&tasks, &[], &members).value;
        let total: f64 = team.task_distribution.values().sum::<f64>() + team.unassigned_share;
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert_eq!(team.unassigned_share, 0.0);
    }

    #[test]
    fn test_peak_hours_are_stable(spans in spans()) {
        let entries = entries_from(&spans);
        let engine = AnalyticsEngine::default();
        let prefs = UserPreferences::default();
        let first = engine.generate_insights(&[], &entries, &prefs, None).value;
        let mut reversed = entries.clone();
        reversed.reverse();
        let second = engine.generate_insights(&[], &reversed, &prefs, None).value;
        prop_assert_eq!(&first.peak_productivity_hours, &second.peak_productivity_hours);
        prop_assert!(first.peak_productivity_hours.len() <= 6);
    }
}
