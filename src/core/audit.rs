//! Audit sink implementations.
//!
//! The scheduler reports reconciliation changes, poll outcomes and health
//! trips here; the closer reports finished trackings. Sinks are optional and
//! must not block.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::TrackingId;
use crate::util::clock::now;

/// Kind of scheduler event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Tracking entered rotation.
    Added,
    /// Tracking left rotation.
    Evicted,
    /// Poll unit launched.
    PollStarted,
    /// Poll unit found its tracking gone.
    Vanished,
    /// Poll completed without matches.
    NoMatches,
    /// Match suppressed by the cooldown.
    Suppressed,
    /// Alert delivered.
    Notified,
    /// Alert could not be delivered.
    DeliveryFailed,
    /// Lookup timed out.
    Timeout,
    /// Lookup returned an undecodable payload.
    Malformed,
    /// Any other poll failure.
    Failed,
    /// Health window filled with failures.
    HealthTrip,
    /// Reconciliation fetch failed.
    CycleFailed,
    /// Tracking finished by the closer.
    Closed,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related tracking, if any.
    pub tracking_id: Option<TrackingId>,
    /// Action taken.
    pub action: AuditAction,
    /// Event time.
    pub created_at: DateTime<Utc>,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Shared sink: the scheduler records through one handle while callers read
/// through another.
impl<S: AuditSink> AuditSink for Arc<Mutex<S>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// Helper to build an audit event stamped with a fresh id and the current time.
pub fn build_audit_event(
    tracking_id: Option<TrackingId>,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        tracking_id,
        action,
        created_at: now(),
        detail,
    }
}
