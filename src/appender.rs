//! The appender façade and its factory.

use crate::config::{AppenderConfig, DispatchConfig};
use crate::dispatch::{DeliveryCounts, DeliveryObserver, DispatcherOptions, HttpDispatcher};
use crate::error::Result;
use crate::event::LogEvent;
use crate::filter::{Filter, TargetFilter, ThresholdFilter};
use crate::layer::SlackLayer;
use crate::layout::{DEFAULT_PATTERN, Layout, PatternLayout};
use crate::logging::DIAGNOSTICS_TARGET;
use crate::slack::MessageBuilder;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

/// Where the active profile name comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    /// Read the named environment variable on every event.
    Env(String),
    /// Always use this value.
    Fixed(String),
}

impl ProfileSource {
    /// The current profile; an unset variable resolves to `""`.
    pub fn resolve(&self) -> Cow<'_, str> {
        match self {
            ProfileSource::Env(var) => Cow::Owned(std::env::var(var).unwrap_or_default()),
            ProfileSource::Fixed(profile) => Cow::Borrowed(profile),
        }
    }
}

/// Forwards log events to a Slack incoming webhook.
///
/// Cheap to clone; all clones share one HTTP client and one dispatcher.
/// [`append`](Self::append) never blocks on the network and never reports
/// an error to its caller.
#[derive(Clone)]
pub struct SlackAppender {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    config: DispatchConfig,
    layout: Box<dyn Layout>,
    filter: Option<Box<dyn Filter>>,
    threshold: Option<ThresholdFilter>,
    ignored: TargetFilter,
    profile: ProfileSource,
    shutdown_grace: Duration,
    dispatcher: HttpDispatcher,
}

pub struct SlackAppenderBuilder {
    config: AppenderConfig,
    layout: Option<Box<dyn Layout>>,
    filter: Option<Box<dyn Filter>>,
    observer: Option<Arc<dyn DeliveryObserver>>,
    profile: Option<ProfileSource>,
}

impl SlackAppenderBuilder {
    pub fn layout(mut self, layout: impl Layout + 'static) -> Self {
        self.layout = Some(Box::new(layout));
        self
    }

    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn observer(mut self, observer: impl DeliveryObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Override the profile source; defaults to the configured env variable.
    pub fn profile(mut self, profile: ProfileSource) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Validate the configuration and start the dispatcher.
    pub fn build(self) -> Result<SlackAppender> {
        let config = self.config;
        let dispatch = config.dispatch_config()?;
        let threshold = config.minimum_severity()?.map(ThresholdFilter::new);

        let layout: Box<dyn Layout> = match self.layout {
            Some(layout) => layout,
            None => Box::new(PatternLayout::new(
                config.pattern.as_deref().unwrap_or(DEFAULT_PATTERN),
            )),
        };
        let profile = self
            .profile
            .unwrap_or_else(|| ProfileSource::Env(config.profile_variable.clone()));

        let dispatcher = HttpDispatcher::new(
            &dispatch,
            DispatcherOptions {
                worker_threads: config.worker_threads,
                max_in_flight: config.max_in_flight,
                observer: self.observer,
            },
        )?;

        tracing::info!(
            target: DIAGNOSTICS_TARGET,
            appender = %config.name,
            channel = %dispatch.channel,
            username = %dispatch.username,
            connect_timeout_ms = dispatch.connect_timeout.as_millis() as u64,
            "Slack appender created"
        );

        Ok(SlackAppender {
            inner: Arc::new(Inner {
                name: config.name.trim().to_string(),
                config: dispatch,
                layout,
                filter: self.filter,
                threshold,
                ignored: TargetFilter::new(config.ignored_targets.iter().cloned()),
                profile,
                shutdown_grace: config.shutdown_grace(),
                dispatcher,
            }),
        })
    }
}

impl SlackAppender {
    /// Create an active appender from host-supplied parameters.
    ///
    /// Fails at construction when a required field is missing, the url is
    /// unusable or the minimum level is unknown.
    pub fn create(
        config: AppenderConfig,
        layout: Option<Box<dyn Layout>>,
        filter: Option<Box<dyn Filter>>,
    ) -> Result<Self> {
        SlackAppenderBuilder {
            config,
            layout,
            filter,
            observer: None,
            profile: None,
        }
        .build()
    }

    pub fn builder(config: AppenderConfig) -> SlackAppenderBuilder {
        SlackAppenderBuilder {
            config,
            layout: None,
            filter: None,
            observer: None,
            profile: None,
        }
    }

    /// Forward one event. Returns before any network I/O happens.
    pub fn append(&self, event: &LogEvent) {
        let inner = &self.inner;

        if !inner.ignored.accepts(event) {
            return;
        }
        if inner.threshold.is_some_and(|t| !t.accepts(event)) {
            return;
        }
        if inner.filter.as_ref().is_some_and(|f| !f.accepts(event)) {
            return;
        }

        let profile = inner.profile.resolve();
        let builder = MessageBuilder::new(&inner.config, &*inner.layout);
        let Some(message) = builder.build(event, &profile) else {
            return;
        };

        inner.dispatcher.dispatch(&message);
    }

    /// Whether events from `target` may be forwarded at all.
    pub fn accepts_target(&self, target: &str) -> bool {
        !self.inner.ignored.is_ignored(target)
    }

    /// A `tracing_subscriber` layer feeding this appender.
    pub fn layer(&self) -> SlackLayer {
        SlackLayer::new(self.clone())
    }

    /// A guard that shuts the appender down when dropped.
    ///
    /// Keep it alive in `main`, like a `WorkerGuard`, so pending deliveries
    /// get the configured grace period at process exit.
    #[must_use]
    pub fn guard(&self) -> AppenderGuard {
        AppenderGuard {
            appender: self.clone(),
        }
    }

    /// Stop accepting events and drain running deliveries for up to `grace`.
    pub fn shutdown(&self, grace: Duration) -> bool {
        tracing::debug!(target: DIAGNOSTICS_TARGET, appender = %self.inner.name, "Shutting down Slack appender");
        self.inner.dispatcher.shutdown(grace)
    }

    pub fn is_active(&self) -> bool {
        !self.inner.dispatcher.is_closed()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn dispatch_config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> DeliveryCounts {
        self.inner.dispatcher.stats()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.dispatcher.in_flight()
    }
}

/// Shuts the appender down on drop, waiting for the configured grace period.
pub struct AppenderGuard {
    appender: SlackAppender,
}

impl Drop for AppenderGuard {
    fn drop(&mut self) {
        let grace = self.appender.inner.shutdown_grace;
        self.appender.shutdown(grace);
    }
}
