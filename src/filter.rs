//! Event filters applied before a message is built.

use crate::event::{LogEvent, Severity};

/// Decides whether an event is forwarded.
pub trait Filter: Send + Sync {
    fn accepts(&self, event: &LogEvent) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&LogEvent) -> bool + Send + Sync,
{
    fn accepts(&self, event: &LogEvent) -> bool {
        self(event)
    }
}

/// Accepts events at or above a minimum severity.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdFilter {
    minimum: Severity,
}

impl ThresholdFilter {
    pub fn new(minimum: Severity) -> Self {
        Self { minimum }
    }
}

impl Filter for ThresholdFilter {
    fn accepts(&self, event: &LogEvent) -> bool {
        event.severity >= self.minimum
    }
}

/// Rejects events whose logger starts with any of the given prefixes.
#[derive(Debug, Clone, Default)]
pub struct TargetFilter {
    ignored: Vec<String>,
}

impl TargetFilter {
    pub fn new(ignored: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ignored: ignored.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ignored(&self, target: &str) -> bool {
        self.ignored.iter().any(|prefix| {
            target == prefix
                || (target.starts_with(prefix.as_str())
                    && target[prefix.len()..].starts_with("::"))
        })
    }
}

impl Filter for TargetFilter {
    fn accepts(&self, event: &LogEvent) -> bool {
        !self.is_ignored(&event.logger)
    }
}
