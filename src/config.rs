use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::state::{RoundIdPolicy, DEFAULT_ROUNDS_PER_GAME};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidRounds { key: &'static str, value: String },

    #[error("{key}: {reason}")]
    InvalidPolicy { key: &'static str, reason: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding `job_listings.json` and `job_deliverables/`
    pub data_dir: PathBuf,

    pub rounds_per_game: usize,
    pub round_id_policy: RoundIdPolicy,

    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            rounds_per_game: DEFAULT_ROUNDS_PER_GAME,
            round_id_policy: RoundIdPolicy::Strict,
            log_filter: "geoguess_state=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let rounds_per_game = match lookup("GEOGUESS_ROUNDS_PER_GAME") {
            Some(value) => match value.trim().parse::<usize>().ok() {
                Some(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidRounds {
                        key: "GEOGUESS_ROUNDS_PER_GAME",
                        value,
                    })
                }
            },
            None => defaults.rounds_per_game,
        };

        let round_id_policy = match lookup("GEOGUESS_ROUND_ID_POLICY") {
            Some(value) => value.parse::<RoundIdPolicy>().map_err(|reason| ConfigError::InvalidPolicy {
                key: "GEOGUESS_ROUND_ID_POLICY",
                reason,
            })?,
            None => defaults.round_id_policy,
        };

        Ok(Self {
            data_dir: lookup("GEOGUESS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            rounds_per_game,
            round_id_policy,
            log_filter: lookup("GEOGUESS_LOG").unwrap_or(defaults.log_filter),
        })
    }
}
