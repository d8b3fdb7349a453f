use anyhow::Context;
use slack_appender::{AppenderConfig, Severity, SlackAppender};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Send one log line through the Slack appender.
///
/// Usage: `slack-appender <level> <message...>`, configured through the
/// `SLACK_*` environment variables (a `.env` file is honoured).
fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let level: Severity = args
        .next()
        .context("usage: slack-appender <level> <message...>")?
        .parse()?;
    let message = args.collect::<Vec<_>>().join(" ");

    // Initialize rustls crypto provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = AppenderConfig::from_env()?;
    let appender = SlackAppender::create(config, None, None)?;
    let _guard = appender.guard();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("slack_appender=debug,demo=trace")),
                ),
        )
        .with(appender.layer())
        .init();

    match level {
        Severity::Trace => tracing::trace!(target: "demo", "{}", message),
        Severity::Debug => tracing::debug!(target: "demo", "{}", message),
        Severity::Info => tracing::info!(target: "demo", "{}", message),
        Severity::Warn => tracing::warn!(target: "demo", "{}", message),
        Severity::Error => tracing::error!(target: "demo", "{}", message),
        Severity::Fatal => tracing::error!(target: "demo", fatal = true, "{}", message),
    }

    tracing::info!(stats = ?appender.stats(), "Message submitted, draining before exit");
    Ok(())
}
