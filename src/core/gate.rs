//! Per-tracking notification cooldown and the delivery bookkeeping around it.

use chrono::{DateTime, Duration, Utc};

use super::filter::SeatThreshold;
use super::message::render_alert;
use super::{InventoryRecord, MessageRef, NotificationRecord, Notifier, StoreError, Tracking, TrackingId, TrackingPatch, TrackingStore};

/// Default minimum time between two alerts for one tracking.
pub const DEFAULT_COOLDOWN_SECS: i64 = 300;

/// What happened to a match handed to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Inside the cooldown window; nothing was sent.
    Suppressed,
    /// Alert delivered and logged.
    Sent(MessageRef),
    /// The notifier failed; nothing was logged so the next match retries.
    DeliveryFailed,
}

/// Cooldown gate keyed by the last logged notification of a tracking.
#[derive(Debug, Clone, Copy)]
pub struct NotificationGate {
    cooldown: Duration,
    threshold: SeatThreshold,
}

impl NotificationGate {
    /// Create a gate with the given cooldown and the seat threshold used for rendering.
    pub const fn new(cooldown: Duration, threshold: SeatThreshold) -> Self {
        Self { cooldown, threshold }
    }

    /// Configured cooldown.
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Pure decision: open when there is no previous alert or it is at least one
    /// cooldown old.
    pub fn is_open(&self, last: Option<&NotificationRecord>, now: DateTime<Utc>) -> bool {
        last.is_none_or(|record| record.created_at <= now - self.cooldown)
    }

    /// Look up the last alert for `tracking_id` and decide.
    pub async fn should_notify<S>(&self, store: &S, tracking_id: TrackingId, now: DateTime<Utc>) -> Result<bool, StoreError>
    where
        S: TrackingStore + ?Sized,
    {
        let last = store.last_notification(tracking_id).await?;
        Ok(self.is_open(last.as_ref(), now))
    }

    /// Gate, send and log one alert.
    ///
    /// A tracking is polled by one unit at a time, so the read-decide-write
    /// sequence cannot race with itself. Nothing is written until the notifier
    /// accepted the message. The first-notification stamp is best effort: a
    /// failed stamp is logged and the alert still counts against the cooldown.
    pub async fn notify<S, N>(
        &self,
        store: &S,
        notifier: &N,
        tracking: &Tracking,
        matches: &[InventoryRecord],
        now: DateTime<Utc>,
    ) -> Result<NotifyOutcome, StoreError>
    where
        S: TrackingStore + ?Sized,
        N: Notifier + ?Sized,
    {
        if !self.should_notify(store, tracking.id, now).await? {
            return Ok(NotifyOutcome::Suppressed);
        }

        let text = render_alert(tracking, matches, self.threshold);
        let message = match notifier.send(tracking.user_id, &text, matches).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(tracking_id = tracking.id, error = %e, "alert delivery failed");
                return Ok(NotifyOutcome::DeliveryFailed);
            }
        };

        // The log entry is the cooldown key, so it is written before anything else.
        store
            .append_notification(NotificationRecord {
                tracking_id: tracking.id,
                user_id: tracking.user_id,
                created_at: now,
                message,
                train_number: matches.first().map(|r| r.train_number.clone()),
            })
            .await?;
        if let Err(e) = Self::stamp_first_notification(store, tracking, now).await {
            tracing::warn!(tracking_id = tracking.id, error = %e, "first notification stamp not saved");
        }
        Ok(NotifyOutcome::Sent(message))
    }

    async fn stamp_first_notification<S>(store: &S, tracking: &Tracking, now: DateTime<Utc>) -> Result<(), StoreError>
    where
        S: TrackingStore + ?Sized,
    {
        if tracking.first_notification_sent_at.is_some() {
            return Ok(());
        }
        // The rotation snapshot may predate our own earlier stamp.
        let stored = store.get_tracking(tracking.id).await?;
        if stored.is_some_and(|t| t.first_notification_sent_at.is_some()) {
            return Ok(());
        }
        store
            .update_tracking(tracking.id, TrackingPatch::first_notification(now))
            .await
    }
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS), SeatThreshold::AnySeat)
    }
}
