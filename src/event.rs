//! Log events as seen by the appender.

use crate::error::SlackAppenderError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Ordered log importance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = SlackAppenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "FATAL" => Ok(Self::Fatal),
            _ => Err(SlackAppenderError::MissingMapping(s.to_string())),
        }
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Severity::Trace,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

/// A single emitted log record.
///
/// `message` is `None` when the producer attached no message at all; such
/// events are never forwarded.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub severity: Severity,
    pub logger: String,
    pub message: Option<String>,
    pub fields: Vec<(String, String)>,
    pub timestamp: DateTime<Utc>,
    pub thread_name: Option<String>,
}

impl LogEvent {
    pub fn new(severity: Severity, logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            logger: logger.into(),
            message: Some(message.into()),
            fields: Vec::new(),
            timestamp: Utc::now(),
            thread_name: std::thread::current().name().map(str::to_string),
        }
    }

    /// An event that carries no message payload.
    pub fn without_message(severity: Severity, logger: impl Into<String>) -> Self {
        Self {
            message: None,
            ..Self::new(severity, logger, String::new())
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// The message followed by any structured fields as `key=value` pairs.
    pub fn formatted_message(&self) -> Option<String> {
        let message = self.message.as_ref()?;
        if self.fields.is_empty() {
            return Some(message.clone());
        }

        let mut out = message.clone();
        for (name, value) in &self.fields {
            out.push(' ');
            out.push_str(name);
            out.push('=');
            out.push_str(value);
        }
        Some(out)
    }
}
