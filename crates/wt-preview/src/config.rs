use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use wt_core::PollSchedule;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const SUBMIT_PATH: &str = "/generate-style-preview";
const STATUS_PATH: &str = "/generate-style-preview/status";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("invalid poll schedule: {0}")]
    Schedule(String),
}

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Base URL of the functions host; endpoint paths are appended.
    pub api_url: String,
    pub api_key: String,
    /// Signed-in user's token. Falls back to the API key for bearer auth.
    pub access_token: Option<String>,
    pub schedule: PollSchedule,
    /// Per-HTTP-call timeout, distinct from the poll budget.
    pub request_timeout: Duration,
    pub abort_on_not_found: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            access_token: None,
            schedule: PollSchedule::default(),
            request_timeout: Duration::from_secs(30),
            abort_on_not_found: false,
        }
    }
}

impl PreviewConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("loaded environment from {}", path.display());
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let schedule = PollSchedule {
            max_attempts: parse_or(&get, "WONDERTONE_POLL_MAX_ATTEMPTS", defaults.schedule.max_attempts, "a positive integer")?,
            initial_delay_ms: parse_or(&get, "WONDERTONE_POLL_INITIAL_DELAY_MS", defaults.schedule.initial_delay_ms, "milliseconds")?,
            backoff_increment_ms: parse_or(&get, "WONDERTONE_POLL_BACKOFF_INCREMENT_MS", defaults.schedule.backoff_increment_ms, "milliseconds")?,
            max_delay_ms: parse_or(&get, "WONDERTONE_POLL_MAX_DELAY_MS", defaults.schedule.max_delay_ms, "milliseconds")?,
        };
        schedule.validate().map_err(ConfigError::Schedule)?;

        let timeout_secs: u64 = parse_or(
            &get,
            "WONDERTONE_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
            "seconds",
        )?;

        Ok(Self {
            api_url: get("WONDERTONE_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_key: get("WONDERTONE_API_KEY").unwrap_or_default(),
            access_token: get("WONDERTONE_ACCESS_TOKEN"),
            schedule,
            request_timeout: Duration::from_secs(timeout_secs),
            abort_on_not_found: parse_or(&get, "WONDERTONE_ABORT_ON_NOT_FOUND", defaults.abort_on_not_found, "true or false")?,
        })
    }

    pub fn submit_url(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), SUBMIT_PATH)
    }

    pub fn status_url(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), STATUS_PATH)
    }

    pub fn bearer_token(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value, expected }),
    }
}
