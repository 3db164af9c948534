//! Core domain model, collaborator seams and the poll scheduler.

pub mod audit;
pub mod closer;
pub mod error;
pub mod filter;
pub mod gate;
pub mod health;
pub mod inventory;
pub mod message;
pub mod model;
pub mod notifier;
pub mod scheduler;
pub mod store;
pub mod tracking_set;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use closer::{close_reason, CloseReason, CloseReport, TrackingCloser};
pub use error::{AppResult, InventoryError, NotifyError, StoreError, WatchError};
pub use filter::{matches, precheck, SeatThreshold, TierMatch};
pub use gate::{NotificationGate, NotifyOutcome};
pub use health::{ConnectionHealth, HealthSnapshot};
pub use inventory::{InventoryRecord, InventorySource};
pub use model::{
    MessageRef, NotificationRecord, PriceTier, SeatClass, SeatClassSet, SeatCriteria, Station, Tracking, TrackingId,
    TrackingPatch, UserId,
};
pub use notifier::{Notifier, OperatorChannel};
pub use scheduler::{PollOutcome, PollScheduler, Spawn};
pub use store::TrackingStore;
pub use tracking_set::{ReconcileReport, Resolution, Ticket, TrackingSet};
