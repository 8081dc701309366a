#![allow(clippy::unwrap_used)]
// Integration tests for `Coordinator` against a wiremock appliance.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use perla_api::STATUS_PATH;
use perla_core::{
    ConnectionParams, Coordinator, CoordinatorState, FailureKind, ReadingValue, read_all,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn params_for(server: &MockServer) -> ConnectionParams {
    ConnectionParams::new("127.0.0.1")
        .with_port(server.address().port())
        .with_timeout(Duration::from_secs(5))
}

fn coordinator(params: ConnectionParams) -> Coordinator {
    Coordinator::new(params).unwrap()
}

async fn mount_ok(server: &MockServer, body: &Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// Poll `check` until it holds or `limit` elapses.
async fn eventually(limit: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

// ── Single-flight ───────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_requests_share_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"OutOfService": "0"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let coord = coordinator(params_for(&server));

    let (a, b, c, d) = tokio::join!(
        coord.request_refresh(),
        coord.request_refresh(),
        coord.request_refresh(),
        coord.request_refresh(),
    );

    let first = a.snapshot().unwrap();
    for other in [&b, &c, &d] {
        assert!(Arc::ptr_eq(first, other.snapshot().unwrap()));
    }
    assert_eq!(coord.state().cycles, 1);
}

#[tokio::test]
async fn test_concurrent_failures_share_one_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let coord = coordinator(params_for(&server));
    let (a, b) = tokio::join!(coord.request_refresh(), coord.request_refresh());

    assert_eq!(a.error(), b.error());
    assert_eq!(a.error().unwrap().kind, FailureKind::Protocol);
}

#[tokio::test]
async fn test_sequential_requests_each_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let coord = coordinator(params_for(&server));
    assert!(coord.request_refresh().await.is_success());
    assert!(coord.request_refresh().await.is_success());
    assert_eq!(coord.state().cycles, 2);
}

// ── Snapshot and availability ───────────────────────────────────────

#[tokio::test]
async fn test_failure_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    mount_ok(&server, &json!({"RegenerativLevel": "80"}), 1).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let coord = coordinator(params_for(&server));

    assert!(coord.request_refresh().await.is_success());
    assert!(coord.is_available());
    let before = coord.current_snapshot().unwrap();

    let outcome = coord.request_refresh().await;
    assert_eq!(outcome.error().unwrap().message, "HTTP 500: boom");

    assert!(!coord.is_available());
    let after = coord.current_snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(coord.state().last_error.as_ref().unwrap().kind, FailureKind::Protocol);
}

#[tokio::test]
async fn test_first_cycle_failure_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let coord = coordinator(params_for(&server));
    assert!(!coord.is_available());

    let outcome = coord.request_refresh().await;

    assert_eq!(outcome.error().unwrap().kind, FailureKind::Decode);
    assert!(!coord.is_available());
    assert!(coord.current_snapshot().is_none());
}

#[tokio::test]
async fn test_raw_values_round_trip() {
    let server = MockServer::start().await;
    let body = json!({
        "Serial": "ABC123",
        "RegenerativLevel": 87,
        "HardnessIN_dH": "18.5",
        "ShowError": false,
        "ActiveErrorIDs": null,
        "LastServiceCustomer": "-",
    });
    mount_ok(&server, &body, 1).await;

    let coord = coordinator(params_for(&server));
    coord.request_refresh().await;

    let snapshot = coord.current_snapshot().unwrap();
    assert_eq!(Value::Object(snapshot.fields().clone()), body);
}

#[tokio::test]
async fn test_poll_scenario_success_then_timeout() {
    let server = MockServer::start().await;
    mount_ok(&server, &json!({"OutOfService": "0"}), 1).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"OutOfService": "1"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let params = params_for(&server)
        .with_poll_interval(Duration::from_secs(30))
        .with_timeout(Duration::from_millis(300));
    let coord = coordinator(params);

    // Cycle 1
    assert!(coord.request_refresh().await.is_success());
    assert!(coord.is_available());
    let readings = read_all("perla", coord.current_snapshot().as_deref(), &Utc);
    let oos = readings.iter().find(|r| r.key == "out_of_service").unwrap();
    assert_eq!(oos.value, ReadingValue::Problem(false));
    let before = coord.current_snapshot().unwrap();

    // Cycle 2
    let outcome = coord.request_refresh().await;
    assert_eq!(outcome.error().unwrap().kind, FailureKind::Timeout);
    assert!(!coord.is_available());
    assert!(Arc::ptr_eq(&before, &coord.current_snapshot().unwrap()));
}

// ── Listeners ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_listeners_notified_once_per_cycle() {
    let server = MockServer::start().await;
    mount_ok(&server, &json!({"OutOfService": "0"}), 1).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let coord = coordinator(params_for(&server));
    let hits = Arc::new(AtomicUsize::new(0));
    let seen_available = Arc::new(AtomicUsize::new(0));

    let (h, s) = (Arc::clone(&hits), Arc::clone(&seen_available));
    let _sub = coord.register(move |state: &CoordinatorState| {
        h.fetch_add(1, Ordering::SeqCst);
        if state.available {
            s.fetch_add(1, Ordering::SeqCst);
        }
    });

    // Listener already sees the new state when the waiter is released.
    coord.request_refresh().await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(seen_available.load(Ordering::SeqCst), 1);

    coord.request_refresh().await;
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(seen_available.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_register_does_not_fetch_and_drop_unregisters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let coord = coordinator(params_for(&server));
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let sub = coord.register(move |_: &CoordinatorState| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(coord.state().cycles, 0);
    assert_eq!(coord.listener_count(), 1);

    sub.unsubscribe();
    assert_eq!(coord.listener_count(), 0);

    coord.request_refresh().await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_refreshes_immediately() {
    let server = MockServer::start().await;
    mount_ok(&server, &json!({"OutOfService": "0"}), 10).await;

    let coord = coordinator(params_for(&server).with_poll_interval(Duration::from_secs(3600)));
    coord.start();
    coord.start();
    assert!(coord.is_running());

    assert!(eventually(Duration::from_secs(3), || coord.is_available()).await);
    assert_eq!(coord.state().cycles, 1);

    coord.shutdown().await;
    assert!(!coord.is_running());
}

#[tokio::test]
async fn test_timer_continues_after_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_ok(&server, &json!({"OutOfService": "0"}), 10).await;

    let coord = coordinator(params_for(&server).with_poll_interval(Duration::from_secs(5)));
    coord.start();

    assert!(eventually(Duration::from_secs(2), || coord.state().cycles == 1).await);
    assert!(!coord.is_available());

    assert!(eventually(Duration::from_secs(8), || coord.is_available()).await);
    assert_eq!(coord.state().cycles, 2);

    coord.shutdown().await;
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

#[tokio::test]
async fn test_slow_appliance_never_overlaps_cycles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"OutOfService": "0"}))
                .set_delay(Duration::from_secs(6)),
        )
        .mount(&server)
        .await;

    let coord = coordinator(
        params_for(&server)
            .with_poll_interval(Duration::from_secs(5))
            .with_timeout(Duration::from_secs(10)),
    );
    let started = tokio::time::Instant::now();
    coord.start();

    // First fetch ends at ~6 s; the next starts 5 s later, not on a 5 s grid.
    tokio::time::sleep_until(started + Duration::from_millis(9500)).await;
    assert_eq!(request_count(&server).await, 1);
    assert_eq!(coord.state().cycles, 1);

    tokio::time::sleep_until(started + Duration::from_millis(12500)).await;
    assert_eq!(request_count(&server).await, 2);

    coord.shutdown().await;
}

#[tokio::test]
async fn test_manual_refresh_rearms_timer() {
    let server = MockServer::start().await;
    mount_ok(&server, &json!({"OutOfService": "0"}), 10).await;

    let coord = coordinator(params_for(&server).with_poll_interval(Duration::from_secs(5)));
    let started = tokio::time::Instant::now();
    coord.start();
    assert!(eventually(Duration::from_secs(2), || coord.state().cycles == 1).await);

    tokio::time::sleep_until(started + Duration::from_secs(3)).await;
    assert!(coord.request_refresh().await.is_success());
    assert_eq!(request_count(&server).await, 2);

    // Without re-arming, the timer would have fired at ~5 s.
    tokio::time::sleep_until(started + Duration::from_millis(6500)).await;
    assert_eq!(request_count(&server).await, 2);

    tokio::time::sleep_until(started + Duration::from_millis(9500)).await;
    assert_eq!(request_count(&server).await, 3);
    assert_eq!(coord.state().cycles, 3);

    coord.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_lets_in_flight_refresh_finish() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"OutOfService": "0"}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let coord = coordinator(params_for(&server));
    coord.start();

    let waiter = {
        let coord = coord.clone();
        tokio::spawn(async move { coord.request_refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    coord.shutdown().await;

    let outcome = waiter.await.unwrap();
    assert!(outcome.is_success());
    assert!(coord.is_available());
}

#[test]
fn test_new_rejects_invalid_params() {
    let params = ConnectionParams::new("perla").with_poll_interval(Duration::from_secs(1));
    assert!(Coordinator::new(params).is_err());

    assert!(Coordinator::new(ConnectionParams::new("  ")).is_err());
}
