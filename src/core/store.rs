//! Persistence seam for trackings and the notification log.

use async_trait::async_trait;

use super::{NotificationRecord, StoreError, Tracking, TrackingId, TrackingPatch};

/// Read/write access to tracking records and the append-only notification log.
///
/// The scheduler never deletes records; it only reads the active set, stamps
/// notification bookkeeping and finishes trackings through [`TrackingPatch`].
#[async_trait]
pub trait TrackingStore: Send + Sync + 'static {
    /// Trackings that are active and whose owner is eligible.
    async fn list_active_eligible_trackings(&self) -> Result<Vec<Tracking>, StoreError>;

    /// Every unfinished tracking regardless of owner eligibility.
    async fn list_unfinished_trackings(&self) -> Result<Vec<Tracking>, StoreError>;

    /// Fetch one tracking.
    async fn get_tracking(&self, id: TrackingId) -> Result<Option<Tracking>, StoreError>;

    /// Apply a partial update.
    async fn update_tracking(&self, id: TrackingId, patch: TrackingPatch) -> Result<(), StoreError>;

    /// Most recent notification sent for a tracking.
    async fn last_notification(&self, tracking_id: TrackingId) -> Result<Option<NotificationRecord>, StoreError>;

    /// Append a notification record.
    async fn append_notification(&self, record: NotificationRecord) -> Result<(), StoreError>;
}
