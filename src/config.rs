//! Configuration stored in ~/.coachdesk/config.json
//!
//! A missing file is not an error: every field has a default, so a fresh
//! install runs with `Config::default()` until the user writes one. A file
//! that exists but fails to parse or validate is a hard error, never a
//! silent fallback.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Day thresholds for time-derived lead status: a lead is `new` while its
/// anchor is younger than `new_within_days`, `warm` while younger than
/// `warm_within_days`, `cold` after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusThresholds {
    #[serde(default = "default_new_within_days")]
    pub new_within_days: i64,
    #[serde(default = "default_warm_within_days")]
    pub warm_within_days: i64,
}

fn default_new_within_days() -> i64 {
    7
}

fn default_warm_within_days() -> i64 {
    30
}

impl Default for StatusThresholds {
    fn default() -> Self {
        StatusThresholds {
            new_within_days: default_new_within_days(),
            warm_within_days: default_warm_within_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub status_thresholds: StatusThresholds,
    /// IANA zone used when a request carries no timezone of its own.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_page_size() -> i64 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Config {
            status_thresholds: StatusThresholds::default(),
            default_timezone: default_timezone(),
            default_page_size: default_page_size(),
        }
    }
}

/// Get the canonical config file path (~/.coachdesk/config.json)
pub fn config_path() -> Result<PathBuf, CoreError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CoreError::Config("Could not find home directory".to_string()))?;
    Ok(home.join(".coachdesk").join("config.json"))
}

impl Config {
    /// Load from the canonical path. Missing file yields defaults.
    pub fn load() -> Result<Config, CoreError> {
        Self::load_from(&config_path()?)
    }

    /// Load from an explicit path. Missing file yields defaults; a file
    /// that parses but fails validation is an error.
    pub fn load_from(path: &Path) -> Result<Config, CoreError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CoreError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let t = &self.status_thresholds;
        if t.new_within_days < 1 {
            return Err(CoreError::Config(format!(
                "newWithinDays must be at least 1, got {}",
                t.new_within_days
            )));
        }
        if t.warm_within_days <= t.new_within_days {
            return Err(CoreError::Config(format!(
                "warmWithinDays ({}) must exceed newWithinDays ({})",
                t.warm_within_days, t.new_within_days
            )));
        }
        if self.default_page_size < 1 {
            return Err(CoreError::Config(format!(
                "defaultPageSize must be at least 1, got {}",
                self.default_page_size
            )));
        }
        // Checked up front so a bad zone surfaces at load, not per request.
        if self.default_timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(CoreError::Config(format!(
                "defaultTimezone is not a known IANA zone: {}",
                self.default_timezone
            )));
        }
        Ok(())
    }

    /// Write to an explicit path, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::Config(format!("Failed to create config dir: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| CoreError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Write to the canonical path.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&config_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.status_thresholds.new_within_days, 7);
        assert_eq!(config.status_thresholds.warm_within_days, 30);
        assert_eq!(config.default_timezone, "UTC");
        assert_eq!(config.default_page_size, 20);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"defaultTimezone": "America/New_York"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_timezone, "America/New_York");
        assert_eq!(config.status_thresholds.new_within_days, 7);
        assert_eq!(config.default_page_size, 20);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_thresholds_must_be_ordered() {
        let config = Config {
            status_thresholds: StatusThresholds {
                new_within_days: 30,
                warm_within_days: 7,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            status_thresholds: StatusThresholds {
                new_within_days: 0,
                warm_within_days: 30,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_default_timezone_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"defaultTimezone": "Mars/Olympus"}"#).unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.status_thresholds.new_within_days = 3;
        config.default_page_size = 50;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.status_thresholds.new_within_days, 3);
        assert_eq!(loaded.default_page_size, 50);
    }
}
