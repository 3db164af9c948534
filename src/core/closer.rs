//! Background expiry of unfinished trackings.
//!
//! Runs on its own interval, independent of the poll scheduler. A tracking is
//! finished when its owner lost eligibility, or when its first alert has gone
//! unanswered for longer than the configured expiry. Only the second case is
//! announced to the user.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::audit::{build_audit_event, AuditAction, AuditSink};
use super::message::render_closed;
use super::{Notifier, StoreError, Tracking, TrackingPatch, TrackingStore};
use crate::config::CloserConfig;
use crate::util::clock;

/// Why a tracking gets finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Owner is no longer eligible. Closed silently.
    Ineligible,
    /// First alert is older than the expiry. Closed with a notice.
    Expired,
}

impl CloseReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ineligible => "ineligible",
            Self::Expired => "expired",
        }
    }
}

/// Decide whether `tracking` should be finished at `now`.
pub fn close_reason(tracking: &Tracking, now: DateTime<Utc>, expiry: Duration) -> Option<CloseReason> {
    if tracking.finished_at.is_some() {
        return None;
    }
    if !tracking.eligible {
        return Some(CloseReason::Ineligible);
    }
    match tracking.first_notification_sent_at {
        Some(first) if first < now - expiry => Some(CloseReason::Expired),
        _ => None,
    }
}

/// Counts from one closer pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseReport {
    /// Unfinished trackings examined.
    pub checked: usize,
    /// Finished because the owner lost eligibility.
    pub ineligible: usize,
    /// Finished because the first alert expired.
    pub expired: usize,
    /// Trackings whose update failed; retried next pass.
    pub failed: usize,
}

/// Periodically finishes trackings that should no longer be watched.
pub struct TrackingCloser<St, N> {
    config: CloserConfig,
    store: Arc<St>,
    notifier: Arc<N>,
    bot_username: Option<String>,
    shutdown: AtomicBool,
    audit: Mutex<Option<Box<dyn AuditSink>>>,
}

impl<St, N> TrackingCloser<St, N>
where
    St: TrackingStore,
    N: Notifier,
{
    /// Create a closer.
    pub fn new(config: CloserConfig, store: Arc<St>, notifier: Arc<N>) -> Self {
        Self {
            config,
            store,
            notifier,
            bot_username: None,
            shutdown: AtomicBool::new(false),
            audit: Mutex::new(None),
        }
    }

    /// Attach an audit sink. Every finished tracking is recorded as `Closed`.
    #[must_use]
    pub fn with_audit(self, audit: Box<dyn AuditSink>) -> Self {
        *self.audit.lock() = Some(audit);
        self
    }

    /// Bot username used for the re-create link in the closed notice.
    #[must_use]
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// One pass over every unfinished tracking.
    ///
    /// Only a failed listing aborts the pass. Per-tracking failures are logged
    /// and counted, and the notice is best-effort once the tracking is finished.
    pub async fn cycle(&self, now: DateTime<Utc>) -> Result<CloseReport, StoreError> {
        let trackings = self.store.list_unfinished_trackings().await?;
        let expiry = self.config.notified_expiry();
        let mut report = CloseReport {
            checked: trackings.len(),
            ..CloseReport::default()
        };

        for tracking in trackings {
            let Some(reason) = close_reason(&tracking, now, expiry) else {
                continue;
            };
            if let Err(e) = self.store.update_tracking(tracking.id, TrackingPatch::finish(now)).await {
                error!(tracking_id = tracking.id, error = %e, "failed to finish tracking");
                report.failed += 1;
                continue;
            }
            if let Some(sink) = self.audit.lock().as_mut() {
                let detail = Some(reason.as_str().to_string());
                sink.record(build_audit_event(Some(tracking.id), AuditAction::Closed, detail));
            }

            match reason {
                CloseReason::Ineligible => {
                    debug!(tracking_id = tracking.id, "tracking finished: owner not eligible");
                    report.ineligible += 1;
                }
                CloseReason::Expired => {
                    info!(tracking_id = tracking.id, "tracking finished: alert expired");
                    report.expired += 1;
                    let text = render_closed(&tracking, self.bot_username.as_deref());
                    if let Err(e) = self.notifier.send(tracking.user_id, &text, &[]).await {
                        warn!(tracking_id = tracking.id, error = %e, "closed notice not delivered");
                    }
                }
            }
        }
        Ok(report)
    }

    /// Run passes every `interval` until [`shutdown`](Self::shutdown).
    pub async fn run(&self) {
        let interval = self.config.interval();
        info!(interval_secs = interval.as_secs(), "tracking closer started");
        while !self.shutdown.load(Ordering::Acquire) {
            match self.cycle(clock::now()).await {
                Ok(report) if report.ineligible + report.expired + report.failed > 0 => {
                    info!(
                        checked = report.checked,
                        ineligible = report.ineligible,
                        expired = report.expired,
                        failed = report.failed,
                        "closer pass finished"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "closer pass failed"),
            }
            tokio::time::sleep(interval).await;
        }
        info!("tracking closer stopped");
    }

    /// Stop the loop after the current sleep.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}
