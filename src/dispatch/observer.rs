//! Delivery outcomes, counters and the observation hook.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The appender was shut down.
    Closed,
    /// `max_in_flight` dispatch units were already running.
    Saturated,
}

/// What happened to one dispatch unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint answered with a 2xx status.
    Delivered { status: u16 },
    /// The endpoint answered with a non-2xx status.
    Rejected { status: u16 },
    /// Connect, TLS, timeout or serialization failure.
    Failed { reason: String },
    /// The message never left the process.
    Dropped(DropReason),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Receives every delivery outcome.
///
/// Called from dispatcher worker threads, and from the logging thread for
/// messages dropped before dispatch. Implementations must not block and
/// must not log through the Slack appender.
pub trait DeliveryObserver: Send + Sync {
    fn on_outcome(&self, outcome: &DeliveryOutcome);
}

impl<F> DeliveryObserver for F
where
    F: Fn(&DeliveryOutcome) + Send + Sync,
{
    fn on_outcome(&self, outcome: &DeliveryOutcome) {
        self(outcome)
    }
}

/// Lock-free delivery counters.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryCounts {
    pub delivered: u64,
    pub rejected: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl DeliveryCounts {
    pub fn total(&self) -> u64 {
        self.delivered + self.rejected + self.failed + self.dropped
    }
}

impl DeliveryStats {
    pub fn record(&self, outcome: &DeliveryOutcome) {
        let counter = match outcome {
            DeliveryOutcome::Delivered { .. } => &self.delivered,
            DeliveryOutcome::Rejected { .. } => &self.rejected,
            DeliveryOutcome::Failed { .. } => &self.failed,
            DeliveryOutcome::Dropped(_) => &self.dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryCounts {
        DeliveryCounts {
            delivered: self.delivered.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}
