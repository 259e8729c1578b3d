//! Runtime settings.
//!
//! A proxy forwards every command-line argument to its child, so settings are
//! taken from the environment only.

use std::env;

use tracing::warn;

use crate::reader::StrategyChoice;

pub const LOG_ENV: &str = "EXEC_STUB_LOG";
pub const READER_ENV: &str = "EXEC_STUB_READER";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_filter: String,
    pub reader: StrategyChoice,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            reader: StrategyChoice::Auto,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_ENV).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }
        // Unparseable values are reported by `warn_unknown_reader` once
        // logging is up.
        if let Some(Ok(choice)) = lookup(READER_ENV).map(|value| value.parse::<StrategyChoice>()) {
            config.reader = choice;
        }
        config
    }
}

/// Logs a warning if `EXEC_STUB_READER` holds a value that was ignored.
pub fn warn_unknown_reader() {
    if let Ok(value) = env::var(READER_ENV) {
        if let Err(reason) = value.parse::<StrategyChoice>() {
            warn!("{reason}; falling back to automatic choice");
        }
    }
}
