//! Outbound user messaging seam.

use async_trait::async_trait;

use super::{InventoryRecord, MessageRef, NotifyError, UserId};

/// Delivers rendered messages to users.
///
/// Delivery is best-effort: callers log failures and carry on.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Send `text` to `user_id`. `matches` is the inventory the message is about
    /// (empty for service messages).
    async fn send(
        &self,
        user_id: UserId,
        text: &str,
        matches: &[InventoryRecord],
    ) -> Result<MessageRef, NotifyError>;
}

/// Delivers operator alerts to a service chat.
#[async_trait]
pub trait OperatorChannel: Send + Sync + 'static {
    /// Post one rendered alert.
    async fn alert(&self, text: &str) -> Result<(), NotifyError>;
}
