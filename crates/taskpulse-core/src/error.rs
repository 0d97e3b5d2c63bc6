//! Core error types for taskpulse-core.
//!
//! Two kinds of failure exist in the engine:
//!
//! - [`ConfigError`] and [`CoreError`] are real errors. They are returned
//!   eagerly when a configuration is invalid or when I/O around the engine
//!   (loading a config file, parsing a snapshot) fails.
//! - [`ValidationWarning`] is not fatal. A malformed record is excluded from
//!   the aggregates and described by a warning returned next to the result.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for taskpulse-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A single member of a batch failed; the rest of the batch is unaffected
    #[error("Analysis failed for '{user_id}': {source}")]
    Member {
        user_id: String,
        #[source]
        source: Box<CoreError>,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// A record excluded from a calculation.
///
/// Warnings accumulate alongside a metric instead of aborting it.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// Time entry ends before it starts
    #[error("Time entry '{entry_id}' ends ({end}) before it starts ({start})")]
    InvertedTimeEntry {
        entry_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Time entry id seen more than once in the snapshot
    #[error("Duplicate time entry '{entry_id}' ignored")]
    DuplicateTimeEntry { entry_id: String },

    /// Task with a negative estimate
    #[error("Task '{task_id}' has negative estimated time ({minutes} min)")]
    NegativeEstimate { task_id: String, minutes: f64 },

    /// Task with NaN or infinite estimate/actual time
    #[error("Task '{task_id}' has a non-finite {field}")]
    NonFiniteEstimate { task_id: String, field: String },

    /// Task with a negative actual time
    #[error("Task '{task_id}' has negative actual time ({minutes} min)")]
    NegativeActualTime { task_id: String, minutes: f64 },

    /// Task updated before it was created
    #[error("Task '{task_id}' was updated ({updated_at}) before it was created ({created_at})")]
    TimestampsOutOfOrder {
        task_id: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },

    /// Task id seen more than once in the snapshot
    #[error("Duplicate task '{task_id}' ignored")]
    DuplicateTask { task_id: String },

    /// Preference outside its range, replaced by the default
    #[error("Preference '{field}' is out of range ({value}); using the default")]
    InvalidPreference { field: String, value: u32 },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message_names_key() {
        let err = ConfigError::invalid("team.bottleneck_multiplier", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'team.bottleneck_multiplier': must be positive"
        );
    }

    #[test]
    fn test_member_error_wraps_source() {
        let err = CoreError::Member {
            user_id: "alice".to_string(),
            source: Box::new(CoreError::Config(ConfigError::ParseFailed("bad".into()))),
        };
        assert!(err.to_string().starts_with("Analysis failed for 'alice'"));
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = ValidationWarning::DuplicateTask {
            task_id: "t1".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "duplicate_task");
        assert_eq!(json["task_id"], "t1");
    }
}
