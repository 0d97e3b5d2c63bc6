//! Input record types consumed by the analytics engine.
//!
//! Tasks and time entries are owned by the caller; the engine only reads
//! them. All types serialize to plain JSON so snapshots can be exported from
//! a task store and replayed through the CLI.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationWarning;

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

/// A task as supplied by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Member responsible for the task; drives team task distribution
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Category labels; order is irrelevant
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Estimated duration in minutes
    pub estimated_time: f64,
    /// Actual duration in minutes, present once the task is completed
    #[serde(default)]
    pub actual_time: Option<f64>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a task with no tags, assignee or actual time.
    pub fn new(
        id: impl Into<String>,
        priority: Priority,
        status: TaskStatus,
        estimated_time: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            priority,
            status,
            assignee: None,
            due_date: None,
            tags: BTreeSet::new(),
            estimated_time,
            actual_time: None,
            dependencies: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Record the actual duration and bump `updated_at` to the completion time.
    pub fn completed_with(mut self, actual_time: f64, completed_at: DateTime<Utc>) -> Self {
        self.status = TaskStatus::Completed;
        self.actual_time = Some(actual_time);
        self.updated_at = completed_at;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Number of tags shared with another task.
    pub fn shared_tags(&self, other: &Task) -> usize {
        self.tags.intersection(&other.tags).count()
    }
}

/// A tracked interval of work on one task by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl TimeEntry {
    pub fn new(
        id: impl Into<String>,
        task_id: impl Into<String>,
        user_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            task_id: task_id.into(),
            user_id: user_id.into(),
            start_time,
            end_time,
            description: None,
            tags: BTreeSet::new(),
        }
    }

    /// Entry spanning `minutes` from `start_time`.
    pub fn spanning(
        id: impl Into<String>,
        task_id: impl Into<String>,
        user_id: impl Into<String>,
        start_time: DateTime<Utc>,
        minutes: i64,
    ) -> Self {
        Self::new(id, task_id, user_id, start_time, start_time + Duration::minutes(minutes))
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Duration in milliseconds; negative for an inverted entry.
    pub fn duration_ms(&self) -> i64 {
        self.duration().num_milliseconds()
    }

    pub fn is_inverted(&self) -> bool {
        self.end_time < self.start_time
    }
}

/// Working preferences of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// First working hour of the day (0-23, local time)
    #[serde(default = "default_work_start")]
    pub work_start_hour: u32,
    /// Hour at which the working day ends (0-24, exclusive)
    #[serde(default = "default_work_end")]
    pub work_end_hour: u32,
    /// Preferred length of a focus block in minutes
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    /// Preferred break length in minutes
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

fn default_work_start() -> u32 {
    9
}
fn default_work_end() -> u32 {
    17
}
fn default_focus_minutes() -> u32 {
    50
}
fn default_break_minutes() -> u32 {
    10
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            work_start_hour: default_work_start(),
            work_end_hour: default_work_end(),
            focus_minutes: default_focus_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

impl UserPreferences {
    /// Whether a local hour falls inside the working day.
    ///
    /// A window with `work_end_hour < work_start_hour` wraps past midnight.
    /// Equal start and end hours mean the whole day is working time.
    pub fn is_working_hour(&self, hour: u32) -> bool {
        match self.work_start_hour.cmp(&self.work_end_hour) {
            Ordering::Less => hour >= self.work_start_hour && hour < self.work_end_hour,
            Ordering::Equal => true,
            Ordering::Greater => hour >= self.work_start_hour || hour < self.work_end_hour,
        }
    }

    /// Copy with out-of-range fields reset to their defaults.
    ///
    /// Start hours above 23, end hours above 24 and a zero focus block are
    /// out of range; each one yields a warning.
    pub fn sanitized(&self) -> (UserPreferences, Vec<ValidationWarning>) {
        let mut clean = self.clone();
        let mut warnings = Vec::new();
        let mut reset = |field: &str, value: u32, slot: &mut u32, default: u32| {
            tracing::warn!(field, value, "resetting out-of-range preference");
            warnings.push(ValidationWarning::InvalidPreference {
                field: field.to_string(),
                value,
            });
            *slot = default;
        };

        if self.work_start_hour > 23 {
            reset("work_start_hour", self.work_start_hour, &mut clean.work_start_hour, default_work_start());
        }
        if self.work_end_hour > 24 {
            reset("work_end_hour", self.work_end_hour, &mut clean.work_end_hour, default_work_end());
        }
        if self.focus_minutes == 0 {
            reset("focus_minutes", self.focus_minutes, &mut clean.focus_minutes, default_focus_minutes());
        }
        (clean, warnings)
    }
}

/// Output of the external task analyzer, if one ran.
///
/// Purely advisory: the engine produces complete results without it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryHint {
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub estimated_time: Option<f64>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// A point-in-time bundle of records for one user or team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    /// Team members; empty for a single-user snapshot
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub advisory: Option<AdvisoryHint>,
}
