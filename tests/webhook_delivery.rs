//! End-to-end delivery tests against a mock webhook.
//!
//! Delivery is asynchronous, so every test waits on outcomes reported through
//! a `DeliveryObserver` channel instead of polling shared counters.

use std::time::{Duration, Instant};

use serde_json::json;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing_subscriber::prelude::*;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use slack_appender::dispatch::{DeliveryObserver, DeliveryOutcome, DropReason};
use slack_appender::slack::{ChatAttachment, ChatMessage, color_for, icon_for};
use slack_appender::{AppenderConfig, LogEvent, ProfileSource, Severity, SlackAppender};

fn config(server: &MockServer) -> AppenderConfig {
    let mut config = AppenderConfig::new(
        "test",
        format!("{}/slack", server.uri()),
        "#channel",
        "userName",
    );
    config.connect_timeout_ms = 1000;
    config.read_timeout_secs = 1;
    config.write_timeout_secs = 1;
    config
}

fn observer() -> (impl DeliveryObserver, UnboundedReceiver<DeliveryOutcome>) {
    let (tx, rx) = unbounded_channel();
    let observer = move |outcome: &DeliveryOutcome| {
        let _ = tx.send(outcome.clone());
    };
    (observer, rx)
}

async fn next_outcome(rx: &mut UnboundedReceiver<DeliveryOutcome>) -> DeliveryOutcome {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("delivery outcome within 10s")
        .expect("observer channel open")
}

fn expected_success() -> ChatMessage {
    ChatMessage {
        channel: "#channel".to_string(),
        text: "[testttt] testLogger".to_string(),
        attachments: vec![ChatAttachment::new(
            "success",
            "success\n",
            color_for(Severity::Info),
        )],
        icon_emoji: icon_for(Severity::Info).to_string(),
        username: "userName".to_string(),
    }
}

// ── Payload ────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delivers_expected_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/slack"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "channel": "#channel",
            "text": "[testttt] testLogger",
            "attachments": [{
                "fallback": "success",
                "text": "success\n",
                "color": "#5f9ea0"
            }],
            "icon_emoji": ":suspect:",
            "username": "userName"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"test": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let (observer, mut outcomes) = observer();
    let appender = SlackAppender::builder(config(&server))
        .observer(observer)
        .profile(ProfileSource::Fixed("testttt".to_string()))
        .build()
        .unwrap();

    appender.append(&LogEvent::new(Severity::Info, "testLogger", "success"));

    assert_eq!(
        next_outcome(&mut outcomes).await,
        DeliveryOutcome::Delivered { status: 200 }
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let received: ChatMessage = requests[0].body_json().unwrap();
    assert_eq!(received, expected_success());
    assert_eq!(appender.stats().delivered, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn profile_is_read_from_environment_per_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let var = "SLACK_APPENDER_IT_PROFILE";
    let mut config = config(&server);
    config.profile_variable = var.to_string();

    let (observer, mut outcomes) = observer();
    let appender = SlackAppender::builder(config)
        .observer(observer)
        .build()
        .unwrap();

    // SAFETY: no other test reads or writes this variable.
    unsafe { std::env::remove_var(var) };
    appender.append(&LogEvent::new(Severity::Info, "jobs", "first"));
    next_outcome(&mut outcomes).await;

    unsafe { std::env::set_var(var, "staging") };
    appender.append(&LogEvent::new(Severity::Info, "jobs", "second"));
    next_outcome(&mut outcomes).await;

    let texts: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.body_json::<ChatMessage>().unwrap().text)
        .collect();
    assert!(texts.contains(&"[] jobs".to_string()));
    assert!(texts.contains(&"[staging] jobs".to_string()));
}

// ── Fire-and-forget semantics ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_error_is_invisible_to_caller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slack"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"test": "error"})))
        .expect(1)
        .mount(&server)
        .await;

    let (observer, mut outcomes) = observer();
    let appender = SlackAppender::builder(config(&server))
        .observer(observer)
        .profile(ProfileSource::Fixed("testttt".to_string()))
        .build()
        .unwrap();

    // Same call, same unit return as the success case.
    let () = appender.append(&LogEvent::new(Severity::Info, "test", "error"));

    assert_eq!(
        next_outcome(&mut outcomes).await,
        DeliveryOutcome::Rejected { status: 500 }
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    let stats = appender.stats();
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.delivered, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn append_returns_before_slow_endpoint_responds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let (observer, mut outcomes) = observer();
    let appender = SlackAppender::builder(config(&server))
        .observer(observer)
        .build()
        .unwrap();

    let started = Instant::now();
    for i in 0..10 {
        appender.append(&LogEvent::new(Severity::Error, "slow", format!("event {}", i)));
    }
    let elapsed = started.elapsed();
    assert!(
        elapsed < Duration::from_millis(500),
        "append blocked for {:?}",
        elapsed
    );

    // The read timeout (1s) abandons each send well before the 5s delay.
    for _ in 0..10 {
        assert!(matches!(
            next_outcome(&mut outcomes).await,
            DeliveryOutcome::Failed { .. }
        ));
    }
    assert_eq!(appender.stats().failed, 10);
}

// ── Shutdown ───────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_gives_up_after_grace_period() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.read_timeout_secs = 30;
    let appender = SlackAppender::create(config, None, None).unwrap();

    appender.append(&LogEvent::new(Severity::Error, "slow", "still sending"));
    assert_eq!(appender.in_flight(), 1);

    let closing = appender.clone();
    let started = Instant::now();
    let drained = tokio::task::spawn_blocking(move || closing.shutdown(Duration::from_millis(300)))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(!drained);
    assert!(elapsed >= Duration::from_millis(300), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "blocked for {:?}", elapsed);
    assert!(!appender.is_active());
    assert_eq!(appender.stats().delivered, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn event_without_message_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let appender = SlackAppender::create(config(&server), None, None).unwrap();
    appender.append(&LogEvent::without_message(Severity::Fatal, "core"));
    assert!(appender.shutdown(Duration::from_secs(1)));

    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(appender.stats().total(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn saturated_dispatcher_drops_new_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.max_in_flight = Some(1);

    let (observer, mut outcomes) = observer();
    let appender = SlackAppender::builder(config)
        .observer(observer)
        .build()
        .unwrap();

    appender.append(&LogEvent::new(Severity::Warn, "burst", "one"));
    appender.append(&LogEvent::new(Severity::Warn, "burst", "two"));

    assert_eq!(
        next_outcome(&mut outcomes).await,
        DeliveryOutcome::Dropped(DropReason::Saturated)
    );
    assert_eq!(
        next_outcome(&mut outcomes).await,
        DeliveryOutcome::Delivered { status: 200 }
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_appends_each_dispatch_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(40)
        .mount(&server)
        .await;

    let (observer, mut outcomes) = observer();
    let appender = SlackAppender::builder(config(&server))
        .observer(observer)
        .build()
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let appender = appender.clone();
            std::thread::spawn(move || {
                for i in 0..5 {
                    appender.append(&LogEvent::new(
                        Severity::Info,
                        format!("thread{}", t),
                        format!("message {}", i),
                    ));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for _ in 0..40 {
        assert!(next_outcome(&mut outcomes).await.is_delivered());
    }
    assert_eq!(appender.stats().delivered, 40);
}

// ── tracing integration ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn layer_forwards_tracing_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (observer, mut outcomes) = observer();
    let appender = SlackAppender::builder(config(&server))
        .observer(observer)
        .profile(ProfileSource::Fixed("qa".to_string()))
        .build()
        .unwrap();

    let subscriber = tracing_subscriber::registry().with(appender.layer());
    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(target: "orders", order_id = 42, "payment declined");
        tracing::error!(target: "orders", fatal = true, "ledger corrupted");
        // No message: skipped.
        tracing::error!(target: "orders", code = 7);
        // Transport and appender targets are never forwarded.
        tracing::error!(target: "hyper::client", "connection reset");
        tracing::error!(target: "slack_appender::diagnostics", "delivery failed");
    });

    next_outcome(&mut outcomes).await;
    next_outcome(&mut outcomes).await;

    let mut received: Vec<ChatMessage> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.body_json().unwrap())
        .collect();
    assert_eq!(received.len(), 2);
    received.sort_by(|a, b| a.attachments[0].fallback.cmp(&b.attachments[0].fallback));

    let fatal = &received[0];
    assert_eq!(fatal.text, "[qa] orders");
    assert_eq!(fatal.icon_emoji, ":finnadie:");
    assert_eq!(fatal.attachments[0].fallback, "ledger corrupted");
    assert_eq!(fatal.attachments[0].color, "#b03e3c");

    let warn = &received[1];
    assert_eq!(warn.icon_emoji, ":goberserk:");
    assert_eq!(warn.attachments[0].fallback, "payment declined order_id=42");
    assert_eq!(warn.attachments[0].text, "payment declined order_id=42\n");
}
