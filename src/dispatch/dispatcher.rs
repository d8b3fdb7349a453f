use crate::config::DispatchConfig;
use crate::dispatch::client::{build_http_client, request_timeout};
use crate::dispatch::observer::{
    DeliveryCounts, DeliveryObserver, DeliveryOutcome, DeliveryStats, DropReason,
};
use crate::error::Result;
use crate::logging::{DIAGNOSTICS_TARGET, RateLimitedWarner, Timer, log_delivery_failure};
use crate::slack::ChatMessage;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tokio::runtime::{Handle, Runtime};

/// Sizing and observation knobs for the dispatcher.
#[derive(Clone)]
pub struct DispatcherOptions {
    /// Worker threads of the dedicated delivery runtime.
    pub worker_threads: usize,
    /// Maximum concurrently running dispatch units; `None` is unbounded.
    /// When the bound is hit new messages are dropped.
    pub max_in_flight: Option<usize>,
    pub observer: Option<Arc<dyn DeliveryObserver>>,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            max_in_flight: None,
            observer: None,
        }
    }
}

/// Fire-and-forget webhook delivery.
///
/// Owns one `reqwest::Client` and a dedicated multi-thread tokio runtime, so
/// callers never need to be inside an async context and are never blocked by
/// the network.
pub struct HttpDispatcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    handle: Handle,
    runtime: Mutex<Option<Runtime>>,
    shared: Arc<Shared>,
}

struct Shared {
    stats: DeliveryStats,
    warner: RateLimitedWarner,
    observer: Option<Arc<dyn DeliveryObserver>>,
    closed: AtomicBool,
    max_in_flight: Option<usize>,
    in_flight: AtomicUsize,
    idle_lock: Mutex<()>,
    idle: Condvar,
}

impl Shared {
    fn record(&self, outcome: DeliveryOutcome) {
        self.stats.record(&outcome);

        match &outcome {
            DeliveryOutcome::Delivered { status } => {
                tracing::trace!(target: DIAGNOSTICS_TARGET, status = status, "Webhook accepted message");
            }
            DeliveryOutcome::Rejected { status } => {
                let reason = format!("endpoint returned status {}", status);
                self.warner.record(|count| log_delivery_failure(count, &reason));
            }
            DeliveryOutcome::Failed { reason } => {
                self.warner.record(|count| log_delivery_failure(count, reason));
            }
            DeliveryOutcome::Dropped(reason) => {
                let reason = format!("message dropped: {:?}", reason);
                self.warner.record(|count| log_delivery_failure(count, &reason));
            }
        }

        if let Some(observer) = &self.observer {
            observer.on_outcome(&outcome);
        }
    }

    fn release(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _guard = self.idle_lock.lock().unwrap_or_else(|e| e.into_inner());
            self.idle.notify_all();
        }
    }

    /// Block until no dispatch unit is running or `grace` elapses.
    fn wait_idle(&self, grace: Duration) -> bool {
        let guard = self.idle_lock.lock().unwrap_or_else(|e| e.into_inner());
        let (_guard, result) = self
            .idle
            .wait_timeout_while(guard, grace, |_| self.in_flight.load(Ordering::SeqCst) > 0)
            .unwrap_or_else(|e| e.into_inner());
        !result.timed_out()
    }
}

/// One occupied in-flight slot; released on drop, including when the
/// task is cancelled before it ever runs.
struct Slot(Arc<Shared>);

impl Slot {
    fn acquire(shared: &Arc<Shared>) -> Option<Self> {
        match shared.max_in_flight {
            Some(max) => shared
                .in_flight
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
                .ok()?,
            None => shared.in_flight.fetch_add(1, Ordering::SeqCst),
        };
        Some(Self(shared.clone()))
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.release();
    }
}

impl HttpDispatcher {
    pub fn new(config: &DispatchConfig, options: DispatcherOptions) -> Result<Self> {
        let client = build_http_client(config)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(options.worker_threads.max(1))
            .thread_name("slack-appender")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        tracing::debug!(
            target: DIAGNOSTICS_TARGET,
            worker_threads = options.worker_threads,
            max_in_flight = ?options.max_in_flight,
            "Webhook dispatcher started"
        );

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout: request_timeout(config),
            handle,
            runtime: Mutex::new(Some(runtime)),
            shared: Arc::new(Shared {
                stats: DeliveryStats::default(),
                warner: RateLimitedWarner::default(),
                observer: options.observer,
                closed: AtomicBool::new(false),
                max_in_flight: options.max_in_flight,
                in_flight: AtomicUsize::new(0),
                idle_lock: Mutex::new(()),
                idle: Condvar::new(),
            }),
        })
    }

    /// Submit one message for delivery and return immediately.
    ///
    /// Every failure is swallowed; outcomes surface only through
    /// [`stats`](Self::stats) and the configured observer.
    pub fn dispatch(&self, message: &ChatMessage) {
        if self.is_closed() {
            self.shared.record(DeliveryOutcome::Dropped(DropReason::Closed));
            return;
        }

        let body = match serde_json::to_vec(message) {
            Ok(body) => body,
            Err(e) => {
                self.shared.record(DeliveryOutcome::Failed {
                    reason: format!("serialization failed: {}", e),
                });
                return;
            }
        };

        let slot = match self.admit() {
            Ok(slot) => slot,
            Err(reason) => {
                self.shared.record(DeliveryOutcome::Dropped(reason));
                return;
            }
        };

        let request = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .body(body);

        self.handle.spawn(async move {
            let slot = slot;
            let _timer = Timer::new("webhook_post");

            let outcome = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        DeliveryOutcome::Delivered {
                            status: status.as_u16(),
                        }
                    } else {
                        DeliveryOutcome::Rejected {
                            status: status.as_u16(),
                        }
                    }
                }
                Err(e) => DeliveryOutcome::Failed {
                    reason: e.to_string(),
                },
            };

            slot.0.record(outcome);
        });
    }

    /// Take an in-flight slot for one message.
    ///
    /// `closed` is checked again once the slot is held: either this call
    /// sees the close, or `shutdown` sees the slot and waits for it before
    /// the runtime goes away.
    fn admit(&self) -> std::result::Result<Slot, DropReason> {
        let slot = Slot::acquire(&self.shared).ok_or(DropReason::Saturated)?;
        if self.is_closed() {
            return Err(DropReason::Closed);
        }
        Ok(slot)
    }

    pub fn stats(&self) -> DeliveryCounts {
        self.shared.stats.snapshot()
    }

    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Stop accepting messages, wait up to `grace` for running dispatch
    /// units, then release the runtime and its pooled connections.
    ///
    /// Returns `true` if every unit finished within the grace period.
    /// Later calls are no-ops that return `true`.
    pub fn shutdown(&self, grace: Duration) -> bool {
        let Some(runtime) = self
            .runtime
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        else {
            return true;
        };

        self.shared.closed.store(true, Ordering::SeqCst);
        let started = Instant::now();
        let drained = self.shared.wait_idle(grace);

        self.shared.warner.flush(|count| {
            log_delivery_failure(count, "failures pending at shutdown");
        });

        if drained {
            tracing::debug!(target: DIAGNOSTICS_TARGET, "Webhook dispatcher drained");
        } else {
            tracing::warn!(
                target: DIAGNOSTICS_TARGET,
                abandoned = self.in_flight(),
                grace_ms = grace.as_millis() as u64,
                "Webhook dispatcher shutdown abandoned running deliveries"
            );
        }

        // A blocking runtime shutdown panics inside an async context.
        if Handle::try_current().is_ok() {
            runtime.shutdown_background();
        } else {
            runtime.shutdown_timeout(grace.saturating_sub(started.elapsed()));
        }

        drained
    }
}

impl Drop for HttpDispatcher {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        if let Some(runtime) = self
            .runtime
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            runtime.shutdown_background();
        }
    }
}
