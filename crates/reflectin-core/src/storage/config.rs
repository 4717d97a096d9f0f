//! TOML-based application configuration.
//!
//! Stores:
//! - Reminder tuning (quiet period, sentiment thresholds, extra delays)
//! - Reminder notification text
//! - Chat backend location
//!
//! Configuration is stored at `~/.config/reflectin/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Inactivity reminder configuration.
///
/// Thresholds are inclusive: a score at or below `low_threshold` gets the
/// negative extra delay, a score at or above `high_threshold` the positive one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    #[serde(default = "default_negative_extra_secs")]
    pub negative_extra_secs: u64,
    #[serde(default = "default_positive_extra_secs")]
    pub positive_extra_secs: u64,
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f64,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_body")]
    pub body: String,
}

/// Chat backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/reflectin/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_base_delay_secs() -> u64 {
    15
}
fn default_negative_extra_secs() -> u64 {
    15
}
fn default_positive_extra_secs() -> u64 {
    60
}
fn default_low_threshold() -> f64 {
    4.0
}
fn default_high_threshold() -> f64 {
    7.0
}
fn default_title() -> String {
    "ReflectIn Reminder".into()
}
fn default_body() -> String {
    "ReflectIn would love to know: How are you feeling now?".into()
}
fn default_base_url() -> String {
    "http://127.0.0.1:8000".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_delay_secs: default_base_delay_secs(),
            negative_extra_secs: default_negative_extra_secs(),
            positive_extra_secs: default_positive_extra_secs(),
            low_threshold: default_low_threshold(),
            high_threshold: default_high_threshold(),
            title: default_title(),
            body: default_body(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
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

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => return Err(ConfigError::UnknownKey(key.to_string())),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Location of the config file for the current environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or fails validation.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Reject settings the reminder policy or backend client cannot use.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reminder;
        if !r.low_threshold.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "reminder.low_threshold".into(),
                message: "must be a finite number".into(),
            });
        }
        if !r.high_threshold.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "reminder.high_threshold".into(),
                message: "must be a finite number".into(),
            });
        }
        if r.low_threshold >= r.high_threshold {
            return Err(ConfigError::InvalidValue {
                key: "reminder.low_threshold".into(),
                message: format!(
                    "must be below reminder.high_threshold ({} >= {})",
                    r.low_threshold, r.high_threshold
                ),
            });
        }
        if let Err(e) = url::Url::parse(&self.backend.base_url) {
            return Err(ConfigError::InvalidValue {
                key: "backend.base_url".into(),
                message: e.to_string(),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config fails validation. `self` is left untouched
    /// on error.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }
}
