use std::{path::PathBuf, time::Duration};

use tracing::warn;

pub const DEFAULT_SECRETS_FILE: &str = "secrets.txt";
pub const DEFAULT_PREFERENCES_FILE: &str = "preferences.json";
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

pub const SECRETS_FILE_ENV: &str = "TOTPWATCH_SECRETS_FILE";
pub const PREFERENCES_FILE_ENV: &str = "TOTPWATCH_PREFERENCES_FILE";
pub const TICK_MS_ENV: &str = "TOTPWATCH_TICK_MS";

/// Where a session reads its files from and how often the host should tick it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub secrets_path: PathBuf,
    pub preferences_path: PathBuf,
    /// Suggested cadence for the host's tick driver.
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secrets_path: PathBuf::from(DEFAULT_SECRETS_FILE),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_FILE),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl SessionConfig {
    /// Defaults with any `TOTPWATCH_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(SECRETS_FILE_ENV) {
            config.secrets_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(PREFERENCES_FILE_ENV) {
            config.preferences_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(TICK_MS_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.tick_interval = Duration::from_millis(ms),
                _ => warn!(value = %raw, "ignoring invalid {TICK_MS_ENV}"),
            }
        }

        config
    }

    pub fn with_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_path = path.into();
        self
    }

    pub fn with_preferences_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preferences_path = path.into();
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}
