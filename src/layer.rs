//! `tracing` integration.
//!
//! Register explicitly alongside the other layers:
//!
//! ```no_run
//! use slack_appender::{AppenderConfig, SlackAppender};
//! use tracing_subscriber::prelude::*;
//!
//! let appender = SlackAppender::create(
//!     AppenderConfig::new("slack", "https://hooks.slack.com/services/T/B/X", "#alerts", "log-bot"),
//!     None,
//!     None,
//! )
//! .unwrap();
//! let _guard = appender.guard();
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(appender.layer())
//!     .init();
//! ```

use crate::appender::SlackAppender;
use crate::event::{LogEvent, Severity};
use chrono::Utc;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Boolean field that promotes an `ERROR` event to [`Severity::Fatal`].
pub const FATAL_FIELD: &str = "fatal";

const MESSAGE_FIELD: &str = "message";
const LOG_TARGET_FIELD: &str = "log.target";

pub struct SlackLayer {
    appender: SlackAppender,
}

impl SlackLayer {
    pub fn new(appender: SlackAppender) -> Self {
        Self { appender }
    }

    pub fn appender(&self) -> &SlackAppender {
        &self.appender
    }
}

impl<S> Layer<S> for SlackLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !self.appender.accepts_target(event.metadata().target()) {
            return;
        }
        self.appender.append(&log_event(event));
    }
}

/// Convert a `tracing` event into a [`LogEvent`].
///
/// `fatal = true` only promotes `ERROR` events; on any other level it is an
/// ordinary field.
pub fn log_event(event: &Event<'_>) -> LogEvent {
    let metadata = event.metadata();
    let is_error = *metadata.level() == Level::ERROR;

    let mut visitor = EventVisitor {
        promote_fatal: is_error,
        ..EventVisitor::default()
    };
    event.record(&mut visitor);

    let severity = if is_error && visitor.fatal {
        Severity::Fatal
    } else {
        Severity::from(metadata.level())
    };

    // Events bridged from the `log` crate carry their real target as a field.
    let logger = visitor
        .log_target
        .unwrap_or_else(|| metadata.target().to_string());

    LogEvent {
        severity,
        logger,
        message: visitor.message,
        fields: visitor.fields,
        timestamp: Utc::now(),
        thread_name: std::thread::current().name().map(str::to_string),
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    log_target: Option<String>,
    fields: Vec<(String, String)>,
    promote_fatal: bool,
    fatal: bool,
}

impl EventVisitor {
    fn push(&mut self, field: &Field, value: String) {
        match field.name() {
            MESSAGE_FIELD => self.message = Some(value),
            LOG_TARGET_FIELD => self.log_target = Some(value),
            name if name.starts_with("log.") => {}
            name => self.fields.push((name.to_string(), value)),
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if self.promote_fatal && field.name() == FATAL_FIELD {
            self.fatal = value;
        } else {
            self.push(field, value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}
