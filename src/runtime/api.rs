//! Status and health payloads for operators.

use serde::{Deserialize, Serialize};

use crate::core::{HealthSnapshot, InventorySource, Notifier, PollScheduler, Spawn, TrackingStore};

/// Point-in-time view of a running scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether the outer loop is running.
    pub running: bool,
    /// Concurrency cap.
    pub max_in_flight: u32,
    /// Poll units in flight.
    pub in_flight: u32,
    /// Highest concurrency observed.
    pub peak_in_flight: u32,
    /// Tickets waiting in the queue.
    pub queued: usize,
    /// Trackings in rotation.
    pub tracked: usize,
    /// Connection health window.
    pub health: HealthSnapshot,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Trailing lookups that timed out in a row.
    pub trailing_timeouts: usize,
    /// Health window size.
    pub window: usize,
}

/// Collect a status snapshot.
pub fn status<St, Src, N, Sp>(scheduler: &PollScheduler<St, Src, N, Sp>) -> SchedulerStatus
where
    St: TrackingStore,
    Src: InventorySource,
    N: Notifier,
    Sp: Spawn,
{
    SchedulerStatus {
        running: scheduler.is_running(),
        max_in_flight: scheduler.max_in_flight(),
        in_flight: scheduler.in_flight(),
        peak_in_flight: scheduler.peak_in_flight(),
        queued: scheduler.queued(),
        tracked: scheduler.tracked(),
        health: scheduler.health(),
    }
}

/// Derive health from a window snapshot: unhealthy once the trailing run of
/// timeouts reaches half the window.
pub fn health_from(snapshot: &HealthSnapshot) -> Health {
    let limit = snapshot.capacity.div_ceil(2).max(1);
    Health {
        ok: snapshot.trailing_failures < limit,
        trailing_timeouts: snapshot.trailing_failures,
        window: snapshot.capacity,
    }
}

/// Return a health payload for a scheduler.
pub fn health<St, Src, N, Sp>(scheduler: &PollScheduler<St, Src, N, Sp>) -> Health
where
    St: TrackingStore,
    Src: InventorySource,
    N: Notifier,
    Sp: Spawn,
{
    health_from(&scheduler.health())
}
