//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use seatwatch::config::SchedulerConfig;
use seatwatch::core::{
    InventoryError, InventoryRecord, InventorySource, PriceTier, SeatClass, Spawn, Station, Tracking, TrackingId,
};

/// Simple tokio spawner for tests.
#[derive(Clone)]
pub struct TestSpawner;

impl Spawn for TestSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(fut);
    }
}

pub fn travel_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 12).unwrap()
}

/// Tracking whose origin code encodes its id, so sources can tell polls apart.
pub fn tracking(id: TrackingId) -> Tracking {
    Tracking::new(
        id,
        100 + id,
        Station::new(format!("O{id}"), "Moscow"),
        Station::new(format!("D{id}"), "St. Petersburg"),
        travel_day(),
    )
}

/// Departure with two lower compartment berths at 3000.
pub fn compartment_train(number: &str) -> InventoryRecord {
    let day = travel_day();
    InventoryRecord::new(number, day.and_hms_opt(22, 10, 0).unwrap(), day.and_hms_opt(23, 50, 0).unwrap())
        .with_seats(SeatClass::CompartmentLower, 2)
        .with_min_price(PriceTier::Compartment, 3000.0)
}

/// Fast timings for tests.
pub fn fast_config(max_in_flight: u32) -> SchedulerConfig {
    SchedulerConfig {
        max_in_flight,
        lookup_timeout_ms: 200,
        tick_interval_ms: 2,
        reconcile_retry_ms: 10,
        ..SchedulerConfig::default()
    }
}

/// Source that sleeps on every lookup and records ordering and concurrency.
pub struct RecordingSource {
    delay: Duration,
    records: Mutex<HashMap<TrackingId, Vec<InventoryRecord>>>,
    calls: Mutex<Vec<TrackingId>>,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingSource {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            records: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn set_records(&self, id: TrackingId, records: Vec<InventoryRecord>) {
        self.records.lock().insert(id, records);
    }

    pub fn calls(&self) -> Vec<TrackingId> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, id: TrackingId) -> usize {
        self.calls.lock().iter().filter(|c| **c == id).count()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

fn id_from_origin(origin: &str) -> TrackingId {
    origin.trim_start_matches('O').parse().unwrap_or_default()
}

#[async_trait]
impl InventorySource for RecordingSource {
    async fn lookup(
        &self,
        origin: &str,
        _destination: &str,
        _date: NaiveDate,
    ) -> Result<Vec<InventoryRecord>, InventoryError> {
        let id = id_from_origin(origin);
        self.calls.lock().push(id);
        let now = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);

        tokio::time::sleep(self.delay).await;

        self.current.fetch_sub(1, Ordering::AcqRel);
        Ok(self.records.lock().get(&id).cloned().unwrap_or_default())
    }
}

/// Poll `cond` until it holds or `limit` elapses.
pub async fn wait_until<F>(limit: Duration, mut cond: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    cond()
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}

/// Layer that records the level and target of every event.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<(tracing::Level, String)>>>);

impl EventLog {
    pub fn events(&self) -> Vec<(tracing::Level, String)> {
        self.0.lock().clone()
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventLog {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let meta = event.metadata();
        self.0.lock().push((*meta.level(), meta.target().to_string()));
    }
}
