//! Bounded poll scheduler.
//!
//! Owns the tracking set, the in-flight counter and the health window. The
//! outer loop reconciles the tracking set against the store, then tops up poll
//! units until the queue is drained or the cap is reached. Each unit runs
//! lookup → filter → notify → requeue for one ticket and releases its slot on
//! every exit path.
//!
//! Shared state sits behind `parking_lot` mutexes that are only held between
//! await points, so units interleave exactly as they would on a single
//! cooperative thread while still being spawnable on a multi-threaded runtime.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use super::audit::{build_audit_event, AuditAction, AuditSink};
use super::filter;
use super::gate::{NotificationGate, NotifyOutcome};
use super::health::{ConnectionHealth, HealthSnapshot};
use super::tracking_set::{ReconcileReport, Resolution, Ticket, TrackingSet};
use super::{InventoryError, InventorySource, MessageRef, Notifier, StoreError, Tracking, TrackingId, TrackingStore, WatchError};
use crate::config::SchedulerConfig;
use crate::util::{clock, truncate, LOG_PAYLOAD_LIMIT};

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// How one poll unit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Ticket no longer resolved; nothing was done.
    Vanished,
    /// Lookup succeeded but nothing matched.
    NoMatches,
    /// Matches found inside the cooldown window.
    Suppressed,
    /// Alert delivered.
    Notified(MessageRef),
    /// Matches found but the notifier failed.
    DeliveryFailed,
    /// Lookup exceeded its deadline.
    Timeout,
    /// Lookup payload could not be decoded.
    Malformed,
    /// Any other failure.
    Failed,
}

impl PollOutcome {
    const fn audit_action(self) -> AuditAction {
        match self {
            Self::Vanished => AuditAction::Vanished,
            Self::NoMatches => AuditAction::NoMatches,
            Self::Suppressed => AuditAction::Suppressed,
            Self::Notified(_) => AuditAction::Notified,
            Self::DeliveryFailed => AuditAction::DeliveryFailed,
            Self::Timeout => AuditAction::Timeout,
            Self::Malformed => AuditAction::Malformed,
            Self::Failed => AuditAction::Failed,
        }
    }
}

/// Reserved unit of the concurrency cap. Released on drop.
struct InFlightSlot {
    counter: Arc<AtomicU32>,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

struct Shared<St, Src, N> {
    config: SchedulerConfig,
    store: Arc<St>,
    source: Arc<Src>,
    notifier: Arc<N>,
    gate: NotificationGate,
    trackings: Mutex<TrackingSet>,
    health: Mutex<ConnectionHealth>,
    /// Lock-free cap accounting - number of poll units in flight.
    in_flight: Arc<AtomicU32>,
    peak_in_flight: AtomicU32,
    running: AtomicBool,
    shutdown: AtomicBool,
    audit: Mutex<Option<Box<dyn AuditSink>>>,
}

impl<St, Src, N> Shared<St, Src, N>
where
    St: TrackingStore,
    Src: InventorySource,
    N: Notifier,
{
    /// Try to reserve a slot atomically using a CAS loop.
    fn try_reserve_slot(&self) -> Option<InFlightSlot> {
        let max = self.config.max_in_flight;
        let mut current = self.in_flight.load(Ordering::Acquire);
        loop {
            if current >= max {
                return None;
            }
            match self
                .in_flight
                .compare_exchange_weak(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    self.peak_in_flight.fetch_max(current + 1, Ordering::AcqRel);
                    return Some(InFlightSlot {
                        counter: Arc::clone(&self.in_flight),
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }

    async fn run_unit(self: Arc<Self>, ticket: Ticket, slot: InFlightSlot) -> PollOutcome {
        let resolution = self.trackings.lock().resolve(ticket);
        let Resolution::Resolved(tracking) = resolution else {
            self.audit(Some(ticket.id), AuditAction::Vanished, None);
            drop(slot);
            return PollOutcome::Vanished;
        };

        let result = self.poll(&tracking).await;
        let outcome = self.classify(&tracking, result);

        self.trackings.lock().requeue(ticket);
        drop(slot);
        outcome
    }

    async fn poll(&self, tracking: &Tracking) -> Result<PollOutcome, WatchError> {
        let timeout = self.config.lookup_timeout();
        let lookup = self
            .source
            .lookup(&tracking.origin.code, &tracking.destination.code, tracking.date);
        let records = tokio::time::timeout(timeout, lookup)
            .await
            .unwrap_or(Err(InventoryError::Timeout(timeout)));

        match &records {
            Ok(_) => self.record_connectivity(true),
            Err(InventoryError::Timeout(_)) => self.record_connectivity(false),
            Err(_) => {}
        }

        let matches = filter::matches(records?, &tracking.criteria, self.config.seat_threshold);
        if matches.is_empty() {
            return Ok(PollOutcome::NoMatches);
        }

        let outcome = self
            .gate
            .notify(self.store.as_ref(), self.notifier.as_ref(), tracking, &matches, clock::now())
            .await?;
        Ok(match outcome {
            NotifyOutcome::Suppressed => PollOutcome::Suppressed,
            NotifyOutcome::Sent(message) => {
                info!(tracking_id = tracking.id, trains = matches.len(), "alert sent");
                PollOutcome::Notified(message)
            }
            NotifyOutcome::DeliveryFailed => PollOutcome::DeliveryFailed,
        })
    }

    fn classify(&self, tracking: &Tracking, result: Result<PollOutcome, WatchError>) -> PollOutcome {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(WatchError::Inventory(InventoryError::Timeout(_))) => PollOutcome::Timeout,
            Err(WatchError::Inventory(InventoryError::Malformed { reason, payload })) => {
                warn!(
                    tracking_id = tracking.id,
                    %reason,
                    payload = %truncate(&payload, LOG_PAYLOAD_LIMIT),
                    "inventory payload could not be decoded"
                );
                PollOutcome::Malformed
            }
            Err(e) => {
                error!(
                    tracking_id = tracking.id,
                    origin = %tracking.origin.code,
                    destination = %tracking.destination.code,
                    date = %tracking.date,
                    error = %e,
                    "poll failed"
                );
                PollOutcome::Failed
            }
        };
        self.audit(Some(tracking.id), outcome.audit_action(), None);
        outcome
    }

    fn record_connectivity(&self, success: bool) {
        let tripped = self.health.lock().record(success);
        if tripped {
            let window = self.config.health_window;
            error!(window, "inventory source unreachable: every lookup in the health window timed out");
            self.audit(None, AuditAction::HealthTrip, Some(format!("{window} consecutive timeouts")));
        }
    }

    fn audit(&self, tracking_id: Option<TrackingId>, action: AuditAction, detail: Option<String>) {
        if let Some(sink) = self.audit.lock().as_mut() {
            sink.record(build_audit_event(tracking_id, action, detail));
        }
    }
}

/// Round-robin poller over every active, eligible tracking.
pub struct PollScheduler<St, Src, N, Sp> {
    shared: Arc<Shared<St, Src, N>>,
    spawner: Sp,
}

impl<St, Src, N, Sp> PollScheduler<St, Src, N, Sp>
where
    St: TrackingStore,
    Src: InventorySource,
    N: Notifier,
    Sp: Spawn,
{
    /// Create a scheduler from its collaborators. Nothing runs until [`run`](Self::run)
    /// or [`top_up`](Self::top_up) is called.
    pub fn new(config: SchedulerConfig, store: Arc<St>, source: Arc<Src>, notifier: Arc<N>, spawner: Sp) -> Self {
        let gate = NotificationGate::new(config.cooldown(), config.seat_threshold);
        let health = ConnectionHealth::new(config.health_window);
        Self {
            shared: Arc::new(Shared {
                config,
                store,
                source,
                notifier,
                gate,
                trackings: Mutex::new(TrackingSet::new()),
                health: Mutex::new(health),
                in_flight: Arc::new(AtomicU32::new(0)),
                peak_in_flight: AtomicU32::new(0),
                running: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
                audit: Mutex::new(None),
            }),
            spawner,
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(self, audit: Box<dyn AuditSink>) -> Self {
        *self.shared.audit.lock() = Some(audit);
        self
    }

    /// Pull the active set from the store and sync the rotation with it.
    pub async fn reconcile(&self) -> Result<ReconcileReport, StoreError> {
        let fresh = self.shared.store.list_active_eligible_trackings().await?;
        let report = self.shared.trackings.lock().reconcile(fresh);
        for id in &report.added {
            info!(tracking_id = id, "tracking added to rotation");
            self.shared.audit(Some(*id), AuditAction::Added, None);
        }
        for id in &report.evicted {
            info!(tracking_id = id, "tracking left rotation");
            self.shared.audit(Some(*id), AuditAction::Evicted, None);
        }
        Ok(report)
    }

    /// Launch poll units until the queue is empty or the cap is reached.
    /// Returns the number of units launched; never waits for them.
    pub fn top_up(&self) -> usize {
        let mut launched = 0;
        loop {
            let next = self.shared.trackings.lock().pop_next();
            let Some(ticket) = next else {
                break;
            };
            let Some(slot) = self.shared.try_reserve_slot() else {
                self.shared.trackings.lock().push_front(ticket);
                break;
            };
            self.shared.audit(Some(ticket.id), AuditAction::PollStarted, None);
            let shared = Arc::clone(&self.shared);
            self.spawner.spawn(async move {
                shared.run_unit(ticket, slot).await;
            });
            launched += 1;
        }
        launched
    }

    /// Run until [`shutdown`](Self::shutdown) is called.
    ///
    /// Each cycle reconciles, then keeps topping up (sleeping one tick between
    /// attempts) until as many units were launched as trackings are in rotation,
    /// or nothing is queued or in flight. A failed reconciliation abandons the
    /// cycle; units already in flight are unaffected.
    pub async fn run(&self) {
        self.shared.running.store(true, Ordering::Release);
        info!(max_in_flight = self.shared.config.max_in_flight, "tracking poll scheduler started");

        while !self.is_shutting_down() {
            match self.reconcile().await {
                Ok(report) => self.drive_rotation(report.tracked).await,
                Err(e) => {
                    error!(error = %e, "reconciliation failed; cycle abandoned");
                    self.shared.audit(None, AuditAction::CycleFailed, Some(e.to_string()));
                    tokio::time::sleep(self.shared.config.reconcile_retry()).await;
                }
            }
        }

        self.shared.running.store(false, Ordering::Release);
        info!("tracking poll scheduler stopped");
    }

    async fn drive_rotation(&self, budget: usize) {
        let tick = self.shared.config.tick_interval();
        let mut launched = 0;
        loop {
            launched += self.top_up();
            tokio::time::sleep(tick).await;
            if launched >= budget || self.is_idle() || self.is_shutting_down() {
                break;
            }
        }
    }

    /// Ask the outer loop to stop after the current tick. In-flight units finish on their own.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
    }

    fn is_shutting_down(&self) -> bool {
        self.shared.shutdown.load(Ordering::Acquire)
    }

    fn is_idle(&self) -> bool {
        self.in_flight() == 0 && self.shared.trackings.lock().queued() == 0
    }

    /// Whether [`run`](Self::run) is currently looping.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Configured concurrency cap.
    pub fn max_in_flight(&self) -> u32 {
        self.shared.config.max_in_flight
    }

    /// Poll units currently in flight.
    pub fn in_flight(&self) -> u32 {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of simultaneous units seen so far.
    pub fn peak_in_flight(&self) -> u32 {
        self.shared.peak_in_flight.load(Ordering::Acquire)
    }

    /// Tickets waiting in the queue.
    pub fn queued(&self) -> usize {
        self.shared.trackings.lock().queued()
    }

    /// Ids waiting in the queue, head first.
    pub fn queued_ids(&self) -> Vec<TrackingId> {
        self.shared.trackings.lock().queued_ids()
    }

    /// Trackings in rotation.
    pub fn tracked(&self) -> usize {
        self.shared.trackings.lock().len()
    }

    /// Current snapshot of a tracking in rotation.
    pub fn tracking(&self, id: TrackingId) -> Option<Tracking> {
        self.shared.trackings.lock().get(id).cloned()
    }

    /// Connection health window.
    pub fn health(&self) -> HealthSnapshot {
        self.shared.health.lock().snapshot()
    }
}
