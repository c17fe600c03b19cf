//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields the stock behaviour. Hosts pass overrides as JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How scroll progress maps to a transition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePolicy {
    /// Fully shown between `start` and `exit`, nothing in between.
    Discrete,
    /// Eased ramp from `start` to `settle`, decay from `exit` to 1.
    #[default]
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutConfig {
    /// Section element ids to track, in document order.
    pub sections: Vec<String>,
    pub policy: StagePolicy,
    pub start: f64,
    pub settle: f64,
    pub exit: f64,
    /// Progress past which content is relocated into the overlay.
    pub commit: f64,
    /// Delay before an exiting overlay is hidden, matching its CSS transition.
    pub hide_delay_ms: u64,
    /// Section height in viewport heights.
    pub scroll_height_multiplier: f64,
    /// Lifetime of the fullscreen entrance animation class.
    pub fullscreen_enter_ms: u64,
    /// Delay before an animated section finishes leaving fullscreen.
    pub fullscreen_exit_ms: u64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            sections: vec!["compare".to_string(), "find".to_string()],
            policy: StagePolicy::Continuous,
            start: 0.10,
            settle: 0.75,
            exit: 0.90,
            commit: 0.35,
            hide_delay_ms: 400,
            scroll_height_multiplier: 2.5,
            fullscreen_enter_ms: 500,
            fullscreen_exit_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub play_interval_ms: u64,
    pub map_transition_ms: u64,
    pub dot_transition_ms: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            play_interval_ms: 100,
            map_transition_ms: 500,
            dot_transition_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailConfig {
    pub api_base: String,
    pub cache_key_prefix: String,
    pub cache_ttl_ms: u64,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3000/api/data".to_string(),
            cache_key_prefix: "borough_data_cache".to_string(),
            cache_ttl_ms: 5 * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub breakout: BreakoutConfig,
    pub timeline: TimelineConfig,
    pub detail: DetailConfig,
}

impl ExplorerConfig {
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.breakout;
        let ordered = 0.0 <= b.start && b.start < b.settle && b.settle <= b.exit && b.exit < 1.0;
        if !ordered {
            return Err(ConfigError::Invalid(format!(
                "breakout thresholds must satisfy 0 <= start < settle <= exit < 1 \
                 (start={}, settle={}, exit={})",
                b.start, b.settle, b.exit
            )));
        }
        if !(b.start..b.exit).contains(&b.commit) {
            return Err(ConfigError::Invalid(format!(
                "commit threshold {} must lie in [start, exit)",
                b.commit
            )));
        }
        if self.timeline.play_interval_ms == 0 {
            return Err(ConfigError::Invalid("play interval must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ExplorerConfig::from_json(b"{}").unwrap();
        assert_eq!(config, ExplorerConfig::default());
        assert_eq!(config.breakout.sections, vec!["compare", "find"]);
        assert_eq!(config.detail.cache_ttl_ms, 300_000);
    }

    #[test]
    fn partial_override() {
        let config =
            ExplorerConfig::from_json(br#"{"breakout":{"policy":"discrete","commit":0.2}}"#)
                .unwrap();
        assert_eq!(config.breakout.policy, StagePolicy::Discrete);
        assert_eq!(config.breakout.commit, 0.2);
        assert_eq!(config.breakout.exit, 0.90);
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let err = ExplorerConfig::from_json(br#"{"breakout":{"start":0.8,"settle":0.5}}"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
        let err = ExplorerConfig::from_json(br#"{"breakout":{"commit":0.95}}"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }
}
