//! Non-blocking webhook delivery.
//!
//! Each message becomes one independent task on the dispatcher's own tokio
//! runtime. Nothing is retried and nothing is reported back to the caller;
//! outcomes are visible only through counters, a rate-limited warning on the
//! diagnostics target, and an optional [`DeliveryObserver`].

mod client;
mod dispatcher;
mod observer;

pub use client::{build_http_client, request_timeout};
pub use dispatcher::{DispatcherOptions, HttpDispatcher};
pub use observer::{DeliveryCounts, DeliveryObserver, DeliveryOutcome, DeliveryStats, DropReason};
