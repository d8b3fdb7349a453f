//! Internal diagnostics for the delivery path.
//!
//! Everything here logs under [`DIAGNOSTICS_TARGET`], which the Slack layer
//! never forwards, so a failing webhook cannot trigger more webhook calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub const DIAGNOSTICS_TARGET: &str = "slack_appender::diagnostics";

/// Minimum spacing between two delivery-failure warnings.
pub const WARN_INTERVAL: Duration = Duration::from_secs(5);

/// Track operation timing and log on drop
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        tracing::debug!(
            target: DIAGNOSTICS_TARGET,
            operation = %self.operation,
            duration_ms = duration_ms,
            "Operation completed"
        );
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Collapses bursts of failures into one warning per interval.
///
/// The first failure is reported immediately; later ones are counted and
/// reported together once the interval has passed.
pub struct RateLimitedWarner {
    interval_secs: u64,
    last_warn: AtomicU64,
    suppressed: AtomicU64,
}

impl RateLimitedWarner {
    pub fn new(interval: Duration) -> Self {
        let interval_secs = interval.as_secs();
        Self {
            interval_secs,
            last_warn: AtomicU64::new(now_secs().saturating_sub(interval_secs)),
            suppressed: AtomicU64::new(0),
        }
    }

    /// Count one failure and call `warn` with the pending count if due.
    pub fn record(&self, warn: impl FnOnce(u64)) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);

        let now = now_secs();
        let prev = self.last_warn.load(Ordering::Relaxed);
        if now.saturating_sub(prev) < self.interval_secs {
            return;
        }
        // Only one thread wins the window.
        if self
            .last_warn
            .compare_exchange(prev, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let count = self.suppressed.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
        }
    }

    /// Report any pending failures regardless of the interval.
    pub fn flush(&self, warn: impl FnOnce(u64)) {
        let count = self.suppressed.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn.store(now_secs(), Ordering::Relaxed);
        }
    }
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(WARN_INTERVAL)
    }
}

/// Log a swallowed delivery failure with structured context
pub fn log_delivery_failure(count: u64, reason: &str) {
    tracing::warn!(
        target: DIAGNOSTICS_TARGET,
        failures = count,
        reason = %reason,
        "Slack webhook delivery failed"
    );
}
