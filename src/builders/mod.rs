//! Builders to construct scheduler components and operator alerts from configuration.

pub mod scheduler_builder;

pub use scheduler_builder::{build_closer, build_operator_alerts, build_scheduler};
