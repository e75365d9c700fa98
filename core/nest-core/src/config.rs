//! Configuration loading and saving utilities.
//!
//! Handles:
//! - Expiry policy for routine completion (calendar-day vs testing interval)
//! - App configuration persisted at `~/.nestnote/config.json`

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{NestError, Result};
use crate::storage::StorageConfig;

/// Default testing interval for completion expiry.
pub const DEFAULT_TESTING_INTERVAL_MINUTES: u32 = 5;

/// How long a completed routine action stays completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExpiryMode {
    /// Valid through the rest of the local calendar day it was made on.
    #[default]
    Production,
    /// Valid for a fixed number of minutes after completion.
    Testing { interval_minutes: u32 },
}

impl ExpiryMode {
    pub fn testing() -> Self {
        ExpiryMode::Testing {
            interval_minutes: DEFAULT_TESTING_INTERVAL_MINUTES,
        }
    }
}

/// Expiry policy handed to the completion store at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpiryPolicy {
    pub mode: ExpiryMode,
}

impl ExpiryPolicy {
    pub fn production() -> Self {
        Self {
            mode: ExpiryMode::Production,
        }
    }

    pub fn testing(interval_minutes: u32) -> Self {
        Self {
            mode: ExpiryMode::Testing { interval_minutes },
        }
    }

    /// Returns true if a completion recorded at `completed_at` has expired by `now`.
    ///
    /// Testing: expired once `now > completed_at + interval` (strictly after).
    /// A deadline past the representable range never expires.
    /// Production: expired once the local date of `now` is after the local
    /// date of `completed_at`, i.e. at the next local midnight.
    pub fn is_expired(
        &self,
        completed_at: DateTime<Utc>,
        now: DateTime<Utc>,
        clock: &dyn Clock,
    ) -> bool {
        match self.mode {
            ExpiryMode::Testing { interval_minutes } => {
                let interval = Duration::seconds(i64::from(interval_minutes) * 60);
                completed_at
                    .checked_add_signed(interval)
                    .is_some_and(|deadline| now > deadline)
            }
            ExpiryMode::Production => clock.local_date(now) > clock.local_date(completed_at),
        }
    }
}

impl From<ExpiryMode> for ExpiryPolicy {
    fn from(mode: ExpiryMode) -> Self {
        Self { mode }
    }
}

/// App configuration. Unknown or missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NestConfig {
    #[serde(default)]
    pub expiry: ExpiryMode,
}

impl NestConfig {
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::from(self.expiry)
    }
}

/// Loads the app configuration, returning defaults if the file is missing or corrupt.
pub fn load_config_with_storage(storage: &StorageConfig) -> NestConfig {
    let path = storage.config_file();
    let content = match fs_err::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return NestConfig::default(),
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Malformed config, using defaults");
            NestConfig::default()
        }
    }
}

/// Saves the app configuration to disk.
pub fn save_config_with_storage(storage: &StorageConfig, config: &NestConfig) -> Result<()> {
    storage.ensure_root()?;
    let path = storage.config_file();
    let content = serde_json::to_string_pretty(config).map_err(|source| NestError::Json {
        context: "serializing config".to_string(),
        source,
    })?;
    fs_err::write(&path, content).map_err(|source| NestError::Io {
        context: format!("writing {}", path.display()),
        source,
    })
}
