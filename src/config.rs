use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Medintake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dialogue backend used when `MEDINTAKE_BACKEND_URL` is unset.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Per-request timeout for the dialogue backend (LLM-backed, can be slow).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Delay before an automatic "continue" is sent.
pub const DEFAULT_CONTINUATION_DELAY_MS: u64 = 1500;

/// Completed exchanges after which a diagnosis is forced.
pub const DEFAULT_EXCHANGE_LIMIT: u32 = 5;

/// First assistant message of every consultation.
pub const GREETING: &str = "Hello! I am your medical assistant. How can I help you today?";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medintake=info"
}

/// Runtime configuration for a consultation client.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeConfig {
    /// Base URL of the dialogue backend, without trailing slash.
    pub backend_url: String,
    pub request_timeout: Duration,
    /// How long an auto-continuation waits before firing.
    pub continuation_delay: Duration,
    /// Forced-diagnosis ceiling on completed exchanges.
    pub exchange_limit: u32,
    pub greeting: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            continuation_delay: Duration::from_millis(DEFAULT_CONTINUATION_DELAY_MS),
            exchange_limit: DEFAULT_EXCHANGE_LIMIT,
            greeting: GREETING.to_string(),
        }
    }
}

impl IntakeConfig {
    /// Build a config from `MEDINTAKE_*` environment variables.
    ///
    /// Unset variables use the defaults; unparsable ones are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads through an arbitrary lookup (testable).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("MEDINTAKE_BACKEND_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.backend_url = url.to_string();
            }
        }

        if let Some(raw) = lookup("MEDINTAKE_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "Ignoring invalid MEDINTAKE_TIMEOUT_SECS"),
            }
        }

        if let Some(raw) = lookup("MEDINTAKE_EXCHANGE_LIMIT") {
            match raw.trim().parse::<u32>() {
                Ok(limit) if limit > 0 => config.exchange_limit = limit,
                _ => tracing::warn!(value = %raw, "Ignoring invalid MEDINTAKE_EXCHANGE_LIMIT"),
            }
        }

        config
    }
}
