//! Configuration models for the scheduler, closer and adapters.

pub mod watch;

pub use watch::{
    CloserConfig, InventoryConfig, SchedulerConfig, ServiceNotificationsConfig, TelegramConfig, WatchConfig,
    DEFAULT_INVENTORY_BASE_URL,
};
