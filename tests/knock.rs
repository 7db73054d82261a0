//! Knock probe timing against a live backend.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use teleport_bridge::config::parse_directive;
use teleport_bridge::knock::{ProbeReport, ProbeScheduler, ProbeSequence, KNOCK_INTERVAL};
use teleport_bridge::lifecycle::Shutdown;
use teleport_bridge::station::DirectStation;
use teleport_bridge::resilience::Backoff;
use teleport_bridge::Teleport;

#[tokio::test]
async fn test_knock_sends_count_probes_one_second_apart() {
    let addr: SocketAddr = "127.0.0.1:28401".parse().unwrap();
    let hits = common::start_recording_backend(addr, 200, "knocked").await;

    let shutdown = Shutdown::new();
    let scheduler = ProbeScheduler::new(Duration::from_secs(2));
    let started = Instant::now();

    let report = scheduler
        .run(
            ProbeSequence::new(format!("http://{addr}/knock"), 3),
            shutdown.subscribe(),
        )
        .await;

    assert_eq!(
        report,
        ProbeReport {
            sent: 3,
            failed: 0,
            cancelled: false
        }
    );

    let hits = hits.lock().unwrap().clone();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h.request_line.starts_with("GET /knock ")));
    assert!(hits[0].at.duration_since(started) >= KNOCK_INTERVAL);
    for pair in hits.windows(2) {
        assert!(pair[1].at.duration_since(pair[0].at) >= KNOCK_INTERVAL);
    }
}

#[tokio::test]
async fn test_knock_error_statuses_are_counted_not_retried() {
    let addr: SocketAddr = "127.0.0.1:28402".parse().unwrap();
    let hits = common::start_recording_backend(addr, 503, "busy").await;

    let shutdown = Shutdown::new();
    let scheduler = ProbeScheduler::new(Duration::from_secs(2));
    let sequence = ProbeSequence::new(format!("http://{addr}/knock"), 2)
        .with_interval(Duration::from_millis(50));

    let report = scheduler.run(sequence, shutdown.subscribe()).await;
    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(hits.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_provisioning_schedules_knock_from_directive() {
    let knock_addr: SocketAddr = "127.0.0.1:28403".parse().unwrap();
    let hits = common::start_recording_backend(knock_addr, 200, "ok").await;

    let directive = format!("teleport listen://127.0.0.1:28404 knock http://{knock_addr}/hello 2");
    let config = parse_directive(&directive).unwrap();
    assert_eq!(config.knock_count(), 2);

    let shutdown = Shutdown::new();
    let station = Arc::new(DirectStation::new(Backoff::new(
        Duration::from_millis(50),
        Duration::from_millis(200),
    )));
    let scheduler = ProbeScheduler::new(Duration::from_secs(2));

    let started = Instant::now();
    let teleport = Teleport::provision(
        config,
        Duration::from_secs(30),
        station,
        &scheduler,
        &shutdown,
    );
    // Provisioning never waits on the knock sequence.
    assert!(started.elapsed() < KNOCK_INTERVAL);

    let report = teleport.knock_task.unwrap().await.unwrap();
    assert_eq!(report.sent, 2);
    assert!(!report.cancelled);
    assert_eq!(hits.lock().unwrap().len(), 2);
    assert!(started.elapsed() >= KNOCK_INTERVAL * 2);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), teleport.station_task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_knock_completes_when_coordinator_is_dropped() {
    let knock_addr: SocketAddr = "127.0.0.1:28405".parse().unwrap();
    let hits = common::start_recording_backend(knock_addr, 200, "ok").await;

    let directive = format!("listen://127.0.0.1:28406 knock http://{knock_addr}/open 2");
    let station = Arc::new(DirectStation::new(Backoff::new(
        Duration::from_millis(50),
        Duration::from_millis(200),
    )));

    let teleport = {
        let shutdown = Shutdown::new();
        Teleport::provision(
            parse_directive(&directive).unwrap(),
            Duration::from_secs(30),
            station,
            &ProbeScheduler::new(Duration::from_secs(2)),
            &shutdown,
        )
    };

    let report = teleport.knock_task.unwrap().await.unwrap();
    assert_eq!(report.sent, 2);
    assert!(!report.cancelled);
    assert_eq!(hits.lock().unwrap().len(), 2);
    assert!(!teleport.station_task.is_finished());
    teleport.station_task.abort();
}
