//! Tests for tokio spawner and status surface

use std::sync::Arc;

use seatwatch::config::SchedulerConfig;
use seatwatch::core::{HealthSnapshot, PollScheduler, Spawn};
use seatwatch::infra::{InMemoryInventorySource, InMemoryNotifier, InMemoryStore};
use seatwatch::runtime::api::{health_from, status};
use seatwatch::runtime::tokio_spawner::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_try_current_outside_runtime() {
    assert!(TokioSpawner::try_current().is_none());
}

fn snapshot(trailing_failures: usize) -> HealthSnapshot {
    HealthSnapshot {
        capacity: 10,
        len: 10,
        failures: trailing_failures,
        trailing_failures,
        trips: 0,
    }
}

#[test]
fn test_health_degrades_at_half_window() {
    assert!(health_from(&snapshot(0)).ok);
    assert!(health_from(&snapshot(4)).ok);
    let degraded = health_from(&snapshot(5));
    assert!(!degraded.ok);
    assert_eq!(degraded.trailing_timeouts, 5);
    assert_eq!(degraded.window, 10);
}

#[tokio::test]
async fn test_status_of_idle_scheduler() {
    let scheduler = PollScheduler::new(
        SchedulerConfig::default(),
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryInventorySource::new()),
        Arc::new(InMemoryNotifier::new()),
        TokioSpawner::current(),
    );
    let snapshot = status(&scheduler);
    assert!(!snapshot.running);
    assert_eq!(snapshot.max_in_flight, 5);
    assert_eq!(snapshot.queued, 0);
    assert_eq!(snapshot.health.capacity, 10);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["in_flight"], 0);
}
