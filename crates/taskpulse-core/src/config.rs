//! TOML-based engine configuration.
//!
//! Every tunable of the engine lives here:
//! - Productivity score scaling and the same-session gap for breaks
//! - Insight ranking sizes, local-time offset and suggestion thresholds
//! - Team bottleneck multiplier
//! - Prediction sample sizes, recency decay and confidence shaping
//! - Recommendation thresholds
//!
//! A config is plain data. It is validated eagerly by [`EngineConfig::validate`]
//! and by every calculator constructor; nothing mutates it after that.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Productivity calculator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityConfig {
    /// Multiplier turning tasks-per-hour into the 0-100 score
    #[serde(default = "default_score_scale")]
    pub score_scale: f64,
    /// Largest gap between two entries of one user still counted as a break
    #[serde(default = "default_session_gap")]
    pub session_gap_minutes: u32,
}

/// Insight generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightConfig {
    /// Number of peak hours reported
    #[serde(default = "default_peak_hours")]
    pub peak_hours: usize,
    /// Number of preferred task types reported
    #[serde(default = "default_max_preferred_types")]
    pub max_preferred_types: usize,
    /// Offset of the user's local time from UTC, in minutes
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Below this break/focus ratio a break suggestion fires
    #[serde(default = "default_min_break_ratio")]
    pub min_break_ratio: f64,
    /// Completion rate (0-100) under which task splitting is suggested
    #[serde(default = "default_low_completion_rate")]
    pub low_completion_rate: f64,
    /// Efficiency (0-1) under which estimate padding is suggested
    #[serde(default = "default_low_efficiency")]
    pub low_efficiency: f64,
    /// Sessions longer than this multiple of the focus block are flagged
    #[serde(default = "default_long_session_factor")]
    pub long_session_factor: f64,
}

/// Team aggregator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Logged time at or above this multiple of the estimate marks a bottleneck
    #[serde(default = "default_bottleneck_multiplier")]
    pub bottleneck_multiplier: f64,
}

/// Completion predictor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Samples a similarity tier needs before it is accepted
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,
    /// Age at which a historical sample weighs half as much as the newest
    #[serde(default = "default_half_life_days")]
    pub recency_half_life_days: f64,
    /// Sample count at which the size component of confidence reaches 0.5
    #[serde(default = "default_confidence_sample_scale")]
    pub confidence_sample_scale: f64,
    /// Confidence multiplier when falling back to tag overlap
    #[serde(default = "default_tag_overlap_weight")]
    pub tag_overlap_weight: f64,
    /// Confidence multiplier when falling back to the full history
    #[serde(default = "default_full_history_weight")]
    pub full_history_weight: f64,
}

/// Recommendation composer thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_low_productivity_score")]
    pub low_productivity_score: f64,
    #[serde(default = "default_low_collaboration")]
    pub low_collaboration: f64,
    /// Spread between largest and smallest member share flagged as imbalance
    #[serde(default = "default_imbalance_threshold")]
    pub imbalance_threshold: f64,
    #[serde(default = "default_max_unassigned_share")]
    pub max_unassigned_share: f64,
    #[serde(default = "default_low_team_productivity")]
    pub low_team_productivity: f64,
}

/// Engine configuration.
///
/// Serialized to/from TOML; every field has a default so partial files load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub productivity: ProductivityConfig,
    #[serde(default)]
    pub insights: InsightConfig,
    #[serde(default)]
    pub team: TeamConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub recommendations: RecommendationConfig,
}

// Default functions
fn default_score_scale() -> f64 {
    10.0
}
fn default_session_gap() -> u32 {
    30
}
fn default_peak_hours() -> usize {
    6
}
fn default_max_preferred_types() -> usize {
    5
}
fn default_min_break_ratio() -> f64 {
    0.1
}
fn default_low_completion_rate() -> f64 {
    50.0
}
fn default_low_efficiency() -> f64 {
    0.7
}
fn default_long_session_factor() -> f64 {
    1.5
}
fn default_bottleneck_multiplier() -> f64 {
    1.5
}
fn default_min_sample_size() -> usize {
    3
}
fn default_half_life_days() -> f64 {
    30.0
}
fn default_confidence_sample_scale() -> f64 {
    5.0
}
fn default_tag_overlap_weight() -> f64 {
    0.85
}
fn default_full_history_weight() -> f64 {
    0.7
}
fn default_low_productivity_score() -> f64 {
    20.0
}
fn default_low_collaboration() -> f64 {
    0.2
}
fn default_imbalance_threshold() -> f64 {
    0.5
}
fn default_max_unassigned_share() -> f64 {
    0.2
}
fn default_low_team_productivity() -> f64 {
    0.2
}

impl Default for ProductivityConfig {
    fn default() -> Self {
        Self {
            score_scale: default_score_scale(),
            session_gap_minutes: default_session_gap(),
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            peak_hours: default_peak_hours(),
            max_preferred_types: default_max_preferred_types(),
            utc_offset_minutes: 0,
            min_break_ratio: default_min_break_ratio(),
            low_completion_rate: default_low_completion_rate(),
            low_efficiency: default_low_efficiency(),
            long_session_factor: default_long_session_factor(),
        }
    }
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            bottleneck_multiplier: default_bottleneck_multiplier(),
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            min_sample_size: default_min_sample_size(),
            recency_half_life_days: default_half_life_days(),
            confidence_sample_scale: default_confidence_sample_scale(),
            tag_overlap_weight: default_tag_overlap_weight(),
            full_history_weight: default_full_history_weight(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            low_productivity_score: default_low_productivity_score(),
            low_collaboration: default_low_collaboration(),
            imbalance_threshold: default_imbalance_threshold(),
            max_unassigned_share: default_max_unassigned_share(),
            low_team_productivity: default_low_team_productivity(),
        }
    }
}

/// Largest offset from UTC in use anywhere (UTC+14).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

fn check_positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::invalid(key, format!("must be a positive number, got {value}")));
    }
    Ok(())
}

fn check_non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid(key, format!("must be zero or positive, got {value}")));
    }
    Ok(())
}

fn check_unit(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid(key, format!("must be within [0, 1], got {value}")));
    }
    Ok(())
}

fn check_percent(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::invalid(key, format!("must be within [0, 100], got {value}")));
    }
    Ok(())
}

impl ProductivityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("productivity.score_scale", self.score_scale)
    }
}

impl InsightConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peak_hours == 0 || self.peak_hours > 24 {
            return Err(ConfigError::invalid(
                "insights.peak_hours",
                format!("must be between 1 and 24, got {}", self.peak_hours),
            ));
        }
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::invalid(
                "insights.utc_offset_minutes",
                format!(
                    "must be within +/-{MAX_UTC_OFFSET_MINUTES}, got {}",
                    self.utc_offset_minutes
                ),
            ));
        }
        check_non_negative("insights.min_break_ratio", self.min_break_ratio)?;
        check_percent("insights.low_completion_rate", self.low_completion_rate)?;
        check_unit("insights.low_efficiency", self.low_efficiency)?;
        check_positive("insights.long_session_factor", self.long_session_factor)
    }
}

impl TeamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("team.bottleneck_multiplier", self.bottleneck_multiplier)
    }
}

impl PredictionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_sample_size == 0 {
            return Err(ConfigError::invalid(
                "prediction.min_sample_size",
                "must be at least 1",
            ));
        }
        check_positive("prediction.recency_half_life_days", self.recency_half_life_days)?;
        check_positive("prediction.confidence_sample_scale", self.confidence_sample_scale)?;
        check_unit("prediction.tag_overlap_weight", self.tag_overlap_weight)?;
        check_unit("prediction.full_history_weight", self.full_history_weight)
    }
}

impl RecommendationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_percent("recommendations.low_productivity_score", self.low_productivity_score)?;
        check_unit("recommendations.low_collaboration", self.low_collaboration)?;
        check_unit("recommendations.imbalance_threshold", self.imbalance_threshold)?;
        check_unit("recommendations.max_unassigned_share", self.max_unassigned_share)?;
        check_unit("recommendations.low_team_productivity", self.low_team_productivity)
    }
}

impl EngineConfig {
    /// Check every section, failing on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.productivity.validate()?;
        self.insights.validate()?;
        self.team.validate()?;
        self.prediction.validate()?;
        self.recommendations.validate()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds an
    /// invalid value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a numeric value by dot-separated key and re-validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not parse as a
    /// number of the right kind, or the resulting config is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::invalid(key, "unknown config key");
        let (section, field) = key.split_once('.').ok_or_else(unknown)?;

        let mut json = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let slot = json
            .get_mut(section)
            .and_then(|s| s.as_object_mut())
            .and_then(|s| s.get_mut(field))
            .ok_or_else(unknown)?;

        let parsed = if slot.is_u64() || slot.is_i64() {
            value.parse::<i64>().ok().map(serde_json::Value::from)
        } else {
            value
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
        };
        *slot = parsed.ok_or_else(|| {
            ConfigError::invalid(key, format!("cannot parse '{value}' as a number"))
        })?;

        let updated: EngineConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.productivity.score_scale, 10.0);
        assert_eq!(cfg.insights.peak_hours, 6);
        assert_eq!(cfg.team.bottleneck_multiplier, 1.5);
        assert_eq!(cfg.prediction.min_sample_size, 3);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg = EngineConfig::from_toml_str("[team]\nbottleneck_multiplier = 2.0\n").unwrap();
        assert_eq!(cfg.team.bottleneck_multiplier, 2.0);
        assert_eq!(cfg.productivity, ProductivityConfig::default());
    }

    #[test]
    fn test_negative_multiplier_rejected() {
        let err = EngineConfig::from_toml_str("[team]\nbottleneck_multiplier = -1.0\n")
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "team.bottleneck_multiplier"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_offset_out_of_range_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.insights.utc_offset_minutes = 15 * 60;
        assert!(cfg.validate().is_err());
        cfg.insights.utc_offset_minutes = -9 * 60;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_peak_hours_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.insights.peak_hours = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = EngineConfig::from_toml_str("[team\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }

    #[test]
    fn test_toml_roundtrip_preserves_values() {
        let mut cfg = EngineConfig::default();
        cfg.prediction.recency_half_life_days = 14.0;
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn test_get_by_dotted_key() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.get("team.bottleneck_multiplier").as_deref(), Some("1.5"));
        assert_eq!(cfg.get("prediction.min_sample_size").as_deref(), Some("3"));
        assert_eq!(cfg.get("team.nope"), None);
    }

    #[test]
    fn test_set_by_dotted_key_validates() {
        let mut cfg = EngineConfig::default();
        cfg.set("team.bottleneck_multiplier", "2.5").unwrap();
        assert_eq!(cfg.team.bottleneck_multiplier, 2.5);

        cfg.set("prediction.min_sample_size", "4").unwrap();
        assert_eq!(cfg.prediction.min_sample_size, 4);

        assert!(cfg.set("team.bottleneck_multiplier", "0").is_err());
        assert_eq!(cfg.team.bottleneck_multiplier, 2.5);
        assert!(cfg.set("team.unknown", "1").is_err());
        assert!(cfg.set("prediction.min_sample_size", "abc").is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        let mut cfg = EngineConfig::default();
        cfg.insights.utc_offset_minutes = 120;
        cfg.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed { .. }));
    }
}
