pub mod tracing;

use std::env;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment (development and test both count as local)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else if app_env.eq_ignore_ascii_case("test") {
            Environment::Test
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Environment::Test)
    }

    /// Local environments never talk to real recipients.
    pub fn is_local(&self) -> bool {
        !self.is_production()
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load and parse environment variable or return error
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Value of the first variable in `keys` that is set.
pub fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| env::var(key).ok())
}

/// Boolean flag from the first set variable in `keys`, `default` when none is set.
///
/// See [`parse_flag`] for accepted spellings.
pub fn env_flag(keys: &[&str], default: bool) -> bool {
    env_first(keys).map_or(default, |value| parse_flag(&value))
}

/// Comma separated list from the first set variable in `keys`.
pub fn env_list(keys: &[&str]) -> Vec<String> {
    env_first(keys).map(|value| parse_list(&value)).unwrap_or_default()
}

/// Loose boolean cast: after trimming, `0`, `f`, `false`, `off` (any case) and
/// the empty string are false, anything else is true.
///
/// Same falsy words as Rails' boolean cast, but Rails neither trims nor folds
/// case, so `" FALSE "` is true there and false here.
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    !["0", "f", "false", "off"]
        .iter()
        .any(|falsy| value.eq_ignore_ascii_case(falsy))
}

/// Splits on commas, trims every entry and drops the empty ones.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
