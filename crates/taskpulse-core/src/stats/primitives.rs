//! Numeric building blocks shared by every calculator.
//!
//! Durations are summed in integer milliseconds and converted to minutes
//! once, so a total is exactly the sum of its entries. Malformed records are
//! filtered out here and reported as [`ValidationWarning`]s.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ValidationWarning;
use crate::model::{Task, TimeEntry};

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// A computed value plus the records that were excluded to compute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validated<T> {
    pub value: T,
    #[serde(default)]
    pub warnings: Vec<ValidationWarning>,
}

impl<T> Validated<T> {
    pub fn new(value: T, warnings: Vec<ValidationWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Vec::new())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validated<U> {
        Validated {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Keep well-formed time entries, first occurrence of each id wins.
pub fn valid_entries(entries: &[TimeEntry]) -> (Vec<&TimeEntry>, Vec<ValidationWarning>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(entries.len());
    let mut warnings = Vec::new();

    for entry in entries {
        if entry.is_inverted() {
            tracing::warn!(entry_id = %entry.id, "excluding time entry that ends before it starts");
            warnings.push(ValidationWarning::InvertedTimeEntry {
                entry_id: entry.id.clone(),
                start: entry.start_time,
                end: entry.end_time,
            });
            continue;
        }
        if !seen.insert(entry.id.as_str()) {
            tracing::warn!(entry_id = %entry.id, "excluding duplicate time entry");
            warnings.push(ValidationWarning::DuplicateTimeEntry {
                entry_id: entry.id.clone(),
            });
            continue;
        }
        kept.push(entry);
    }

    (kept, warnings)
}

pub(crate) fn task_problem(task: &Task) -> Option<ValidationWarning> {
    if !task.estimated_time.is_finite() {
        return Some(ValidationWarning::NonFiniteEstimate {
            task_id: task.id.clone(),
            field: "estimated_time".to_string(),
        });
    }
    if task.estimated_time < 0.0 {
        return Some(ValidationWarning::NegativeEstimate {
            task_id: task.id.clone(),
            minutes: task.estimated_time,
        });
    }
    match task.actual_time {
        Some(actual) if !actual.is_finite() => {
            return Some(ValidationWarning::NonFiniteEstimate {
                task_id: task.id.clone(),
                field: "actual_time".to_string(),
            });
        }
        Some(actual) if actual < 0.0 => {
            return Some(ValidationWarning::NegativeActualTime {
                task_id: task.id.clone(),
                minutes: actual,
            });
        }
        _ => {}
    }
    if task.updated_at < task.created_at {
        return Some(ValidationWarning::TimestampsOutOfOrder {
            task_id: task.id.clone(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        });
    }
    None
}

/// Keep well-formed tasks, first occurrence of each id wins.
pub fn valid_tasks(tasks: &[Task]) -> (Vec<&Task>, Vec<ValidationWarning>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(tasks.len());
    let mut warnings = Vec::new();

    for task in tasks {
        if let Some(problem) = task_problem(task) {
            tracing::warn!(task_id = %task.id, %problem, "excluding malformed task");
            warnings.push(problem);
            continue;
        }
        if !seen.insert(task.id.as_str()) {
            tracing::warn!(task_id = %task.id, "excluding duplicate task");
            warnings.push(ValidationWarning::DuplicateTask {
                task_id: task.id.clone(),
            });
            continue;
        }
        kept.push(task);
    }

    (kept, warnings)
}

pub(crate) fn ms_to_minutes(ms: i64) -> f64 {
    ms as f64 / MS_PER_MINUTE as f64
}

/// Sum of durations of already-validated entries, in milliseconds.
///
/// Saturates at `i64::MAX` instead of overflowing.
pub(crate) fn sum_duration_ms<'a, I>(entries: I) -> i64
where
    I: IntoIterator<Item = &'a TimeEntry>,
{
    let mut total: i64 = 0;
    for entry in entries {
        let next = total.saturating_add(entry.duration_ms().max(0));
        if next == i64::MAX && total != i64::MAX {
            tracing::warn!(entry_id = %entry.id, "tracked time total saturated");
        }
        total = next;
    }
    total
}

/// Total tracked minutes over the well-formed entries.
pub fn total_duration(entries: &[TimeEntry]) -> Validated<f64> {
    let (kept, warnings) = valid_entries(entries);
    Validated::new(ms_to_minutes(sum_duration_ms(kept)), warnings)
}

/// Items per hour; 0 when no time was spent.
pub fn rate(count: usize, duration_minutes: f64) -> f64 {
    if !duration_minutes.is_finite() || duration_minutes <= 0.0 {
        return 0.0;
    }
    count as f64 / (duration_minutes / 60.0)
}

/// Milliseconds per local hour-of-day, splitting entries at hour boundaries.
///
/// Whole days of an entry add one hour to every bucket at once, so the walk
/// over the remainder touches at most 25 hours regardless of entry length.
pub(crate) fn hour_buckets_ms<'a, I>(entries: I, utc_offset_minutes: i32) -> BTreeMap<u32, i64>
where
    I: IntoIterator<Item = &'a TimeEntry>,
{
    let offset_ms = i64::from(utc_offset_minutes) * MS_PER_MINUTE;
    let mut buckets: BTreeMap<u32, i64> = BTreeMap::new();

    for entry in entries {
        let mut cursor = entry.start_time.timestamp_millis() + offset_ms;
        let end = entry.end_time.timestamp_millis() + offset_ms;

        let whole_days = (end - cursor).max(0) / MS_PER_DAY;
        if whole_days > 0 {
            let per_hour = whole_days.saturating_mul(MS_PER_HOUR);
            for hour in 0..24 {
                let slot = buckets.entry(hour).or_insert(0);
                *slot = slot.saturating_add(per_hour);
            }
            cursor += whole_days * MS_PER_DAY;
        }

        while cursor < end {
            let hour_index = cursor.div_euclid(MS_PER_HOUR);
            let segment_end = ((hour_index + 1) * MS_PER_HOUR).min(end);
            let hour = hour_index.rem_euclid(24) as u32;
            let slot = buckets.entry(hour).or_insert(0);
            *slot = slot.saturating_add(segment_end - cursor);
            cursor = segment_end;
        }
    }

    buckets
}

/// Tracked minutes per local hour-of-day (0-23).
///
/// Hours with no tracked time are absent from the map.
pub fn bucket_by_hour(entries: &[TimeEntry], utc_offset_minutes: i32) -> Validated<BTreeMap<u32, f64>> {
    let (kept, warnings) = valid_entries(entries);
    let buckets = hour_buckets_ms(kept, utc_offset_minutes)
        .into_iter()
        .map(|(hour, ms)| (hour, ms_to_minutes(ms)))
        .collect();
    Validated::new(buckets, warnings)
}

/// Hours ordered by tracked time, descending; ties go to the earlier hour.
pub fn rank_hours<V: PartialOrd + Copy>(buckets: &BTreeMap<u32, V>, k: usize) -> Vec<u32> {
    let mut ranked: Vec<(u32, V)> = buckets.iter().map(|(h, v)| (*h, *v)).collect();
    // BTreeMap yields hours ascending and the sort is stable.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().take(k).map(|(hour, _)| hour).collect()
}

/// Bucket with the most tracked time.
pub fn busiest_hour(buckets: &BTreeMap<u32, f64>) -> Option<(u32, f64)> {
    rank_hours(buckets, 1).first().map(|h| (*h, buckets[h]))
}

/// Non-empty bucket with the least tracked time; ties go to the earlier hour.
pub fn quietest_hour(buckets: &BTreeMap<u32, f64>) -> Option<(u32, f64)> {
    buckets
        .iter()
        .filter(|(_, minutes)| **minutes > 0.0)
        .fold(None, |best: Option<(u32, f64)>, (hour, minutes)| match best {
            Some((_, m)) if m <= *minutes => best,
            _ => Some((*hour, *minutes)),
        })
}
