pub mod appender;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod filter;
pub mod layer;
pub mod layout;
pub mod logging;
pub mod slack;

pub use appender::{AppenderGuard, ProfileSource, SlackAppender, SlackAppenderBuilder};
pub use config::{AppenderConfig, DispatchConfig};
pub use error::{Result, SlackAppenderError};
pub use event::{LogEvent, Severity};
pub use layer::SlackLayer;
