use crate::error::{Result, SlackAppenderError};
use crate::event::Severity;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_WORKER_THREADS: usize = 2;
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5000;
pub const DEFAULT_PROFILE_VARIABLE: &str = "APP_PROFILES_ACTIVE";

/// Targets whose events are never forwarded. The HTTP stack logs while
/// delivering, so forwarding its events would feed back into the appender.
pub const DEFAULT_IGNORED_TARGETS: &[&str] = &[
    "slack_appender",
    "reqwest",
    "hyper",
    "hyper_util",
    "h2",
    "rustls",
    "tokio",
    "runtime",
    "tower",
];

/// Construction parameters as supplied by the host configuration.
///
/// Key names follow the host's camelCase configuration surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppenderConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_connect_timeout_ms", rename = "connectionTimeoutInMillis")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_secs", rename = "readTimeoutInSecond")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_write_timeout_secs", rename = "writeTimeoutInSecond")]
    pub write_timeout_secs: u64,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub minimum_level: Option<String>,
    #[serde(default = "default_profile_variable")]
    pub profile_variable: String,
    #[serde(default = "default_ignored_targets")]
    pub ignored_targets: Vec<String>,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default)]
    pub max_in_flight: Option<usize>,
    #[serde(default = "default_shutdown_grace_ms", rename = "shutdownGraceInMillis")]
    pub shutdown_grace_ms: u64,
}

/// Immutable delivery settings shared by every dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub url: String,
    pub channel: String,
    pub username: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for AppenderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            channel: String::new(),
            username: String::new(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT_SECS,
            pattern: None,
            minimum_level: None,
            profile_variable: default_profile_variable(),
            ignored_targets: default_ignored_targets(),
            worker_threads: DEFAULT_WORKER_THREADS,
            max_in_flight: None,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}

impl AppenderConfig {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        channel: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            channel: channel.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    /// Check required fields and produce the shared dispatch settings.
    pub fn dispatch_config(&self) -> Result<DispatchConfig> {
        require("name", &self.name)?;
        require("url", &self.url)?;
        require("channel", &self.channel)?;
        require("username", &self.username)?;

        let url = self.url.trim();
        let parsed = reqwest::Url::parse(url).map_err(|e| SlackAppenderError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SlackAppenderError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        if self.worker_threads == 0 {
            return Err(SlackAppenderError::Config(
                "workerThreads must be at least 1".to_string(),
            ));
        }
        if self.max_in_flight == Some(0) {
            return Err(SlackAppenderError::Config(
                "maxInFlight must be at least 1".to_string(),
            ));
        }

        let connect_timeout = Duration::from_millis(self.connect_timeout_ms);
        let read_timeout = Duration::from_secs(self.read_timeout_secs);
        let write_timeout = Duration::from_secs(self.write_timeout_secs);
        if connect_timeout
            .checked_add(write_timeout)
            .and_then(|d| d.checked_add(read_timeout))
            .is_none()
        {
            return Err(SlackAppenderError::Config(
                "timeouts are too large to combine into a request deadline".to_string(),
            ));
        }

        Ok(DispatchConfig {
            url: url.to_string(),
            channel: self.channel.clone(),
            username: self.username.clone(),
            connect_timeout,
            read_timeout,
            write_timeout,
        })
    }

    pub fn minimum_severity(&self) -> Result<Option<Severity>> {
        self.minimum_level.as_deref().map(str::parse::<Severity>).transpose()
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Load settings from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let mut config = Self {
            name: std::env::var("SLACK_APPENDER_NAME").unwrap_or_else(|_| "slack".to_string()),
            url: std::env::var("SLACK_WEBHOOK_URL")
                .map_err(|_| SlackAppenderError::Config("SLACK_WEBHOOK_URL not set".to_string()))?,
            channel: std::env::var("SLACK_CHANNEL")
                .map_err(|_| SlackAppenderError::Config("SLACK_CHANNEL not set".to_string()))?,
            username: std::env::var("SLACK_USERNAME")
                .map_err(|_| SlackAppenderError::Config("SLACK_USERNAME not set".to_string()))?,
            ..Self::default()
        };

        config.connect_timeout_ms = env_number("SLACK_CONNECT_TIMEOUT_MS", config.connect_timeout_ms)?;
        config.read_timeout_secs = env_number("SLACK_READ_TIMEOUT_SECS", config.read_timeout_secs)?;
        config.write_timeout_secs =
            env_number("SLACK_WRITE_TIMEOUT_SECS", config.write_timeout_secs)?;
        config.pattern = std::env::var("SLACK_PATTERN").ok();
        config.minimum_level = std::env::var("SLACK_MIN_LEVEL").ok();

        Ok(config)
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SlackAppenderError::MissingField(field));
    }
    Ok(())
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SlackAppenderError::Config(format!("Invalid {}", key))),
        Err(_) => Ok(default),
    }
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

fn default_write_timeout_secs() -> u64 {
    DEFAULT_WRITE_TIMEOUT_SECS
}

fn default_worker_threads() -> usize {
    DEFAULT_WORKER_THREADS
}

fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}

fn default_profile_variable() -> String {
    DEFAULT_PROFILE_VARIABLE.to_string()
}

fn default_ignored_targets() -> Vec<String> {
    DEFAULT_IGNORED_TARGETS.iter().map(|t| t.to_string()).collect()
}
