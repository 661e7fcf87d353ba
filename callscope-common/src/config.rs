//! Session reconstruction configuration
//!
//! [`SessionOptions`] holds the resolved timing thresholds the engine runs
//! with. Callers and config files supply [`OptionOverrides`], raw numbers that
//! may be missing or non-finite; those fall back to the defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::time::TimeMs;

/// Default maximum silence inside one session.
pub const DEFAULT_TIME_WINDOW_MS: TimeMs = 30_000;
/// Default delay allowed between an RRC Connection Request and its NAS call control.
pub const DEFAULT_RRC_NAS_FOLLOW_MS: TimeMs = 5_000;
/// Default shortest attempt that counts as a real setup attempt.
pub const DEFAULT_MIN_VALID_ATTEMPT_MS: TimeMs = 2_000;
/// Default longest unconnected attempt before it is considered incomplete.
pub const DEFAULT_MAX_SETUP_WINDOW_MS: TimeMs = 30_000;

/// Resolved thresholds for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    /// A gap larger than this ends the active session
    pub time_window_ms: TimeMs,
    /// Window for RRC Connection Request followed by NAS call control
    pub rrc_nas_follow_ms: TimeMs,
    /// Unconnected attempts shorter than this are ignored
    pub min_valid_attempt_ms: TimeMs,
    /// Unconnected attempts longer than this are incomplete
    pub max_setup_window_ms: TimeMs,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            time_window_ms: DEFAULT_TIME_WINDOW_MS,
            rrc_nas_follow_ms: DEFAULT_RRC_NAS_FOLLOW_MS,
            min_valid_attempt_ms: DEFAULT_MIN_VALID_ATTEMPT_MS,
            max_setup_window_ms: DEFAULT_MAX_SETUP_WINDOW_MS,
        }
    }
}

impl SessionOptions {
    /// Resolves raw overrides, keeping defaults for missing or non-finite values.
    pub fn from_overrides(overrides: &OptionOverrides) -> Self {
        let defaults = Self::default();
        Self {
            time_window_ms: finite_or(
                "time_window_ms",
                overrides.time_window_ms,
                defaults.time_window_ms,
            ),
            rrc_nas_follow_ms: finite_or(
                "rrc_nas_follow_ms",
                overrides.rrc_nas_follow_ms,
                defaults.rrc_nas_follow_ms,
            ),
            min_valid_attempt_ms: finite_or(
                "min_valid_attempt_ms",
                overrides.min_valid_attempt_ms,
                defaults.min_valid_attempt_ms,
            ),
            max_setup_window_ms: finite_or(
                "max_setup_window_ms",
                overrides.max_setup_window_ms,
                defaults.max_setup_window_ms,
            ),
        }
    }

    /// Rejects negative thresholds.
    pub fn validate(&self) -> Result<(), Error> {
        let fields = [
            ("time_window_ms", self.time_window_ms),
            ("rrc_nas_follow_ms", self.rrc_nas_follow_ms),
            ("min_valid_attempt_ms", self.min_valid_attempt_ms),
            ("max_setup_window_ms", self.max_setup_window_ms),
        ];
        for (name, value) in fields {
            if value < 0 {
                return Err(Error::Config(format!("{name} must not be negative (got {value})")));
            }
        }
        Ok(())
    }
}

fn finite_or(name: &str, value: Option<f64>, default: TimeMs) -> TimeMs {
    match value {
        Some(v) if v.is_finite() => v.round() as TimeMs,
        Some(v) => {
            tracing::warn!(option = name, value = %v, default, "non-finite option, using default");
            default
        }
        None => default,
    }
}

/// Raw, possibly partial option values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionOverrides {
    /// Override for [`SessionOptions::time_window_ms`]
    #[serde(alias = "timeWindowMs", skip_serializing_if = "Option::is_none")]
    pub time_window_ms: Option<f64>,
    /// Override for [`SessionOptions::rrc_nas_follow_ms`]
    #[serde(alias = "rrcNasFollowMs", skip_serializing_if = "Option::is_none")]
    pub rrc_nas_follow_ms: Option<f64>,
    /// Override for [`SessionOptions::min_valid_attempt_ms`]
    #[serde(alias = "minValidAttemptMs", skip_serializing_if = "Option::is_none")]
    pub min_valid_attempt_ms: Option<f64>,
    /// Override for [`SessionOptions::max_setup_window_ms`]
    #[serde(alias = "maxSetupWindowMs", skip_serializing_if = "Option::is_none")]
    pub max_setup_window_ms: Option<f64>,
}

impl OptionOverrides {
    /// Overlays `other` on top of `self`; values set in `other` win.
    pub fn merged_with(self, other: &OptionOverrides) -> Self {
        Self {
            time_window_ms: other.time_window_ms.or(self.time_window_ms),
            rrc_nas_follow_ms: other.rrc_nas_follow_ms.or(self.rrc_nas_follow_ms),
            min_valid_attempt_ms: other.min_valid_attempt_ms.or(self.min_valid_attempt_ms),
            max_setup_window_ms: other.max_setup_window_ms.or(self.max_setup_window_ms),
        }
    }
}

/// Top-level configuration file.
///
/// ```yaml
/// log_level: debug
/// session:
///   time_window_ms: 45000
///   min_valid_attempt_ms: 1500
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallscopeConfig {
    /// Log level or filter string (`info`, `info,callscope_session=trace`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Session threshold overrides
    pub session: OptionOverrides,
}

impl CallscopeConfig {
    /// Parses a configuration from a YAML string.
    ///
    /// # Example
    /// ```
    /// use callscope_common::CallscopeConfig;
    ///
    /// let config = CallscopeConfig::from_yaml("session:\n  time_window_ms: 45000\n").unwrap();
    /// assert_eq!(config.session_options().unwrap().time_window_ms, 45_000);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serializes the configuration to a YAML string.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Resolves and validates the session thresholds.
    pub fn session_options(&self) -> Result<SessionOptions, Error> {
        let options = SessionOptions::from_overrides(&self.session);
        options.validate()?;
        Ok(options)
    }
}
