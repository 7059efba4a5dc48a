//! TOML-based application configuration.
//!
//! Stores:
//! - Scoring settings (the respect level a reset returns to)
//! - Message selection settings (fixed seed, override catalog)
//! - Defaults for newly registered users
//!
//! Configuration is stored at `~/.config/taskmaster/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::messages::{MessageCatalog, MessageSelector, Personality};
use crate::respect::RespectLevel;

/// Respect level restored by a progress reset unless configured otherwise.
///
/// Clients disagree here: the Android app and backend store reset to 50, the
/// web client to 100. 50 matches the level new users start at; set
/// `scoring.reset_baseline = 100` for the web behavior.
pub const DEFAULT_RESET_BASELINE: u8 = 50;

/// Scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_reset_baseline")]
    pub reset_baseline: u8,
}

/// Message selection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Fixed RNG seed for reproducible messages (None = random)
    #[serde(default)]
    pub seed: Option<u64>,
    /// Path to a TOML catalog replacing the built-in messages
    #[serde(default)]
    pub catalog_path: Option<String>,
}

/// Defaults for new users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub default_personality: Personality,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/taskmaster/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
    #[serde(default)]
    pub user: UserConfig,
}

fn default_reset_baseline() -> u8 {
    DEFAULT_RESET_BASELINE
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reset_baseline: default_reset_baseline(),
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
        let unknown = || invalid("unknown config key".to_string());

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(invalid("config key is empty".to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                // Optional fields serialize as null, so their type comes from the value.
                let new_value = match existing {
                    _ if value == "none" => serde_json::Value::Null,
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(format!("cannot parse '{value}': {e}")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Null => {
                        if value.is_empty() {
                            serde_json::Value::Null
                        } else if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            serde_json::Value::String(value.into())
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location in the data directory.
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

    /// Load from `path`, writing defaults there if the file is missing.
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

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check values serde alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reset_baseline()?;
        Ok(())
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

    /// Set a config value by key without saving. Returns error if key is
    /// unknown or the result is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// The configured reset baseline as a respect level.
    pub fn reset_baseline(&self) -> Result<RespectLevel, ConfigError> {
        RespectLevel::new(self.scoring.reset_baseline.into()).map_err(|e| {
            ConfigError::InvalidValue {
                key: "scoring.reset_baseline".to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Load the override catalog if one is configured, else the built-in one.
    pub fn message_catalog(&self) -> Result<MessageCatalog, CoreError> {
        match &self.messages.catalog_path {
            Some(path) => MessageCatalog::load(Path::new(path)),
            None => Ok(MessageCatalog::builtin()),
        }
    }

    /// Build the selector described by the `messages` section.
    pub fn message_selector(&self) -> Result<MessageSelector, CoreError> {
        Ok(MessageSelector::from_seed_option(
            self.message_catalog()?,
            self.messages.seed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.scoring.reset_baseline, DEFAULT_RESET_BASELINE);
        assert_eq!(parsed.user.default_personality, Personality::Balanced);
        assert_eq!(parsed.messages.seed, None);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.scoring.reset_baseline, 50);
    }

    #[test]
    fn test_get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scoring.reset_baseline").as_deref(), Some("50"));
        assert_eq!(cfg.get("user.default_personality").as_deref(), Some("balanced"));
        assert_eq!(cfg.get("messages.seed").as_deref(), Some("null"));
        assert!(cfg.get("scoring.missing_key").is_none());
    }

    #[test]
    fn test_apply_updates_number_and_enum() {
        let mut cfg = Config::default();
        cfg.apply("scoring.reset_baseline", "100").unwrap();
        cfg.apply("user.default_personality", "savage").unwrap();
        cfg.apply("messages.seed", "1234").unwrap();
        assert_eq!(cfg.scoring.reset_baseline, 100);
        assert_eq!(cfg.user.default_personality, Personality::Savage);
        assert_eq!(cfg.messages.seed, Some(1234));

        cfg.apply("messages.seed", "none").unwrap();
        assert_eq!(cfg.messages.seed, None);
    }

    #[test]
    fn test_apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(cfg.apply("scoring.nonexistent_key", "1").is_err());
        assert!(cfg.apply("", "1").is_err());
    }

    #[test]
    fn test_apply_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.apply("scoring.reset_baseline", "lots").is_err());
        assert!(cfg.apply("scoring.reset_baseline", "101").is_err());
        assert!(cfg.apply("user.default_personality", "grumpy").is_err());
        assert_eq!(cfg.scoring.reset_baseline, DEFAULT_RESET_BASELINE);
    }

    #[test]
    fn test_load_from_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.scoring.reset_baseline, DEFAULT_RESET_BASELINE);
        assert!(path.exists());
    }

    #[test]
    fn test_load_from_rejects_out_of_range_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scoring]\nreset_baseline = 150\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_catalog_path_is_loaded_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.toml");
        std::fs::write(
            &path,
            "[high]\nsupportive=[\"a\"]\nbalanced=[\"b\"]\nsavage=[\"c\"]\n\
             [medium]\nsupportive=[\"d\"]\nbalanced=[\"e\"]\nsavage=[\"f\"]\n\
             [low]\nsupportive=[\"g\"]\nbalanced=[]\nsavage=[\"i\"]\n",
        )
        .unwrap();
        let mut cfg = Config::default();
        cfg.messages.catalog_path = Some(path.display().to_string());
        assert!(cfg.message_catalog().is_err());
    }
}
