//! Infrastructure adapters for stores, inventory sources and notifiers.

pub mod inventory;
pub mod notifier;
pub mod store;

pub use inventory::{InMemoryInventorySource, RzdInventorySource};
pub use notifier::{InMemoryNotifier, InMemoryOperatorChannel, TelegramNotifier, TelegramServiceChat};
pub use store::InMemoryStore;
