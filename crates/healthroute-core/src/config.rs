//! Runtime configuration and logging setup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::labs::{Classifier, ReferenceTable};
use crate::models::Sex;

pub const DB_PATH_VAR: &str = "HEALTHROUTE_DB_PATH";
pub const DEFAULT_SEX_VAR: &str = "HEALTHROUTE_DEFAULT_SEX";
pub const UNKNOWN_AS_NORMAL_VAR: &str = "HEALTHROUTE_UNKNOWN_AS_NORMAL";

const DEFAULT_DB_PATH: &str = "healthroute.db";
const DEFAULT_LOG_FILTER: &str = "healthroute=info";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings shared by the CLI and embedders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// Sex used for stored reference-range lookups
    pub default_sex: Sex,
    /// Classify nutrients without any range as normal instead of unknown
    pub unknown_as_normal: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            default_sex: Sex::Any,
            unknown_as_normal: false,
        }
    }
}

impl CoreConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a key lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup(DB_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let default_sex = match lookup(DEFAULT_SEX_VAR) {
            Some(value) => Sex::from_str(&value).ok_or_else(|| invalid(DEFAULT_SEX_VAR, &value))?,
            None => defaults.default_sex,
        };

        let unknown_as_normal = match lookup(UNKNOWN_AS_NORMAL_VAR) {
            Some(value) => parse_bool(&value).ok_or_else(|| invalid(UNKNOWN_AS_NORMAL_VAR, &value))?,
            None => defaults.unknown_as_normal,
        };

        Ok(Self {
            db_path,
            default_sex,
            unknown_as_normal,
        })
    }

    /// Classifier configured with these settings and a stored-range table.
    pub fn classifier(&self, table: ReferenceTable) -> Classifier {
        Classifier::new()
            .with_table(table)
            .with_sex(self.default_sex)
            .unknown_as_normal(self.unknown_as_normal)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to
/// JSON lines. Returns false if a subscriber was already installed.
pub fn init_logging() -> bool {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if json_logs {
        builder.with_target(false).json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.db_path, PathBuf::from("healthroute.db"));
    }

    #[test]
    fn test_overrides() {
        let config = CoreConfig::from_lookup(lookup(&[
            (DB_PATH_VAR, "/tmp/hr.db"),
            (DEFAULT_SEX_VAR, "Female"),
            (UNKNOWN_AS_NORMAL_VAR, "true"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/hr.db"));
        assert_eq!(config.default_sex, Sex::Female);
        assert!(config.unknown_as_normal);
    }

    #[test]
    fn test_invalid_values() {
        let err = CoreConfig::from_lookup(lookup(&[(DEFAULT_SEX_VAR, "robot")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == DEFAULT_SEX_VAR));
        assert!(CoreConfig::from_lookup(lookup(&[(UNKNOWN_AS_NORMAL_VAR, "maybe")])).is_err());
    }

    #[test]
    fn test_classifier_follows_policy() {
        let config = CoreConfig {
            unknown_as_normal: true,
            ..CoreConfig::default()
        };
        let classification = config
            .classifier(ReferenceTable::new())
            .classify("Selenium", 1.0, None);
        assert_eq!(classification.status, crate::models::NutrientStatus::Normal);
    }
}
