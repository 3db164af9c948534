//! Runtime adapters and status surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{health, health_from, status, Health, SchedulerStatus};
pub use tokio_spawner::TokioSpawner;
