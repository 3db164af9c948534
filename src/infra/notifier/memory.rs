//! Recording notifier for development/testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{InventoryRecord, MessageRef, Notifier, NotifyError, OperatorChannel, UserId};

/// A message accepted by [`InMemoryNotifier`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Recipient.
    pub user_id: UserId,
    /// Rendered text.
    pub text: String,
    /// Train numbers the message was about.
    pub trains: Vec<String>,
    /// Assigned reference.
    pub message: MessageRef,
}

/// Notifier that keeps every message in memory.
///
/// Failures can be queued with [`fail_next`](Self::fail_next); each queued
/// error is returned by one `send` call before normal delivery resumes.
#[derive(Default)]
pub struct InMemoryNotifier {
    sent: Mutex<Vec<SentMessage>>,
    failures: Mutex<VecDeque<NotifyError>>,
    next_id: AtomicI64,
}

impl InMemoryNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `send` fail with `error`.
    pub fn fail_next(&self, error: NotifyError) {
        self.failures.lock().push_back(error);
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Messages delivered to one user.
    pub fn sent_to(&self, user_id: UserId) -> Vec<SentMessage> {
        self.sent.lock().iter().filter(|m| m.user_id == user_id).cloned().collect()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, user_id: UserId, text: &str, matches: &[InventoryRecord]) -> Result<MessageRef, NotifyError> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        let message = MessageRef(self.next_id.fetch_add(1, Ordering::AcqRel) + 1);
        self.sent.lock().push(SentMessage {
            user_id,
            text: text.to_string(),
            trains: matches.iter().map(|r| r.train_number.clone()).collect(),
            message,
        });
        Ok(message)
    }
}

/// Operator channel that keeps every alert in memory.
#[derive(Default)]
pub struct InMemoryOperatorChannel {
    alerts: Mutex<Vec<String>>,
    failures: Mutex<VecDeque<NotifyError>>,
}

impl InMemoryOperatorChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `alert` fail with `error`.
    pub fn fail_next(&self, error: NotifyError) {
        self.failures.lock().push_back(error);
    }

    /// Alerts delivered so far.
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().clone()
    }
}

#[async_trait]
impl OperatorChannel for InMemoryOperatorChannel {
    async fn alert(&self, text: &str) -> Result<(), NotifyError> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        self.alerts.lock().push(text.to_string());
        Ok(())
    }
}
