//! Rendering of log events into the attachment body text.

use crate::event::LogEvent;

/// Default conversion pattern: the message followed by a newline.
pub const DEFAULT_PATTERN: &str = "%m%n";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Turns an event into display text.
pub trait Layout: Send + Sync {
    fn render(&self, event: &LogEvent) -> String;
}

impl<F> Layout for F
where
    F: Fn(&LogEvent) -> String + Send + Sync,
{
    fn render(&self, event: &LogEvent) -> String {
        self(event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Timestamp,
    Level,
    Logger,
    Message,
    Thread,
    Newline,
}

/// A small printf-style layout.
///
/// Supported conversions:
/// - `%d` timestamp (UTC, millisecond precision)
/// - `%p` severity
/// - `%c` logger name
/// - `%m` message with structured fields
/// - `%t` thread name
/// - `%n` newline
/// - `%%` a literal percent sign
///
/// Unknown conversions are kept verbatim.
#[derive(Debug, Clone)]
pub struct PatternLayout {
    pattern: String,
    segments: Vec<Segment>,
}

impl PatternLayout {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let segments = parse(&pattern);
        Self { pattern, segments }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for PatternLayout {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

impl Layout for PatternLayout {
    fn render(&self, event: &LogEvent) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Timestamp => {
                    out.push_str(&event.timestamp.format(TIMESTAMP_FORMAT).to_string())
                }
                Segment::Level => out.push_str(event.severity.as_str()),
                Segment::Logger => out.push_str(&event.logger),
                Segment::Message => {
                    if let Some(message) = event.formatted_message() {
                        out.push_str(&message);
                    }
                }
                Segment::Thread => out.push_str(event.thread_name.as_deref().unwrap_or("unnamed")),
                Segment::Newline => out.push('\n'),
            }
        }
        out
    }
}

fn parse(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }

        let segment = match chars.next() {
            Some('d') => Segment::Timestamp,
            Some('p') => Segment::Level,
            Some('c') => Segment::Logger,
            Some('m') => Segment::Message,
            Some('t') => Segment::Thread,
            Some('n') => Segment::Newline,
            Some('%') => {
                literal.push('%');
                continue;
            }
            Some(other) => {
                literal.push('%');
                literal.push(other);
                continue;
            }
            None => {
                literal.push('%');
                break;
            }
        };

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(segment);
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
