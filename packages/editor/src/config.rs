use std::env;
use std::time::Duration;

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Debounce between the first unsaved edit and the automatic save
    pub autosave_delay: Duration,
    /// Maximum undo levels (0 = unlimited)
    pub history_limit: usize,
    /// Timeout for requests made by [`crate::HttpBackend`]
    pub request_timeout: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            history_limit: 0,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EditorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(secs) = lookup("PAGESMITH_AUTOSAVE_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.autosave_delay = Duration::from_secs(secs),
                Err(_) => tracing::warn!(
                    value = %secs,
                    "Invalid PAGESMITH_AUTOSAVE_SECS, using default {}s",
                    config.autosave_delay.as_secs()
                ),
            }
        }

        if let Some(limit) = lookup("PAGESMITH_HISTORY_LIMIT") {
            match limit.parse::<usize>() {
                Ok(limit) => config.history_limit = limit,
                Err(_) => tracing::warn!(
                    value = %limit,
                    "Invalid PAGESMITH_HISTORY_LIMIT, keeping unlimited history"
                ),
            }
        }

        if let Some(secs) = lookup("PAGESMITH_REQUEST_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %secs,
                    "Invalid PAGESMITH_REQUEST_TIMEOUT_SECS, using default {}s",
                    config.request_timeout.as_secs()
                ),
            }
        }

        config
    }
}
