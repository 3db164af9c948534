//! In-memory tracking store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{NotificationRecord, StoreError, Tracking, TrackingId, TrackingPatch, TrackingStore};

#[derive(Default)]
struct State {
    trackings: BTreeMap<TrackingId, Tracking>,
    notifications: Vec<NotificationRecord>,
}

/// Simple in-memory store for development/testing.
///
/// Listings come back ordered by id. [`set_unavailable`](Self::set_unavailable)
/// makes every call fail with [`StoreError::Unavailable`].
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with trackings.
    pub fn with_trackings(trackings: impl IntoIterator<Item = Tracking>) -> Self {
        let store = Self::new();
        for tracking in trackings {
            store.upsert(tracking);
        }
        store
    }

    /// Insert or replace a tracking.
    pub fn upsert(&self, tracking: Tracking) {
        self.state.lock().trackings.insert(tracking.id, tracking);
    }

    /// Delete a tracking outright.
    pub fn remove(&self, id: TrackingId) -> Option<Tracking> {
        self.state.lock().trackings.remove(&id)
    }

    /// Edit a tracking in place. Returns whether it existed.
    pub fn modify<F>(&self, id: TrackingId, edit: F) -> bool
    where
        F: FnOnce(&mut Tracking),
    {
        self.state.lock().trackings.get_mut(&id).map(edit).is_some()
    }

    /// Current copy of a tracking.
    pub fn tracking(&self, id: TrackingId) -> Option<Tracking> {
        self.state.lock().trackings.get(&id).cloned()
    }

    /// Every logged notification, oldest first.
    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.state.lock().notifications.clone()
    }

    /// Toggle simulated outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".into()));
        }
        Ok(())
    }

    fn list_where<F>(&self, keep: F) -> Vec<Tracking>
    where
        F: Fn(&Tracking) -> bool,
    {
        self.state
            .lock()
            .trackings
            .values()
            .filter(|t| keep(*t))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TrackingStore for InMemoryStore {
    async fn list_active_eligible_trackings(&self) -> Result<Vec<Tracking>, StoreError> {
        self.check()?;
        Ok(self.list_where(Tracking::is_pollable))
    }

    async fn list_unfinished_trackings(&self) -> Result<Vec<Tracking>, StoreError> {
        self.check()?;
        Ok(self.list_where(|t| t.finished_at.is_none()))
    }

    async fn get_tracking(&self, id: TrackingId) -> Result<Option<Tracking>, StoreError> {
        self.check()?;
        Ok(self.tracking(id))
    }

    async fn update_tracking(&self, id: TrackingId, patch: TrackingPatch) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock();
        let tracking = state.trackings.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        tracking.apply(&patch);
        Ok(())
    }

    async fn last_notification(&self, tracking_id: TrackingId) -> Result<Option<NotificationRecord>, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .notifications
            .iter()
            .filter(|n| n.tracking_id == tracking_id)
            .max_by_key(|n| n.created_at)
            .cloned())
    }

    async fn append_notification(&self, record: NotificationRecord) -> Result<(), StoreError> {
        self.check()?;
        self.state.lock().notifications.push(record);
        Ok(())
    }
}
