//! # Seatwatch
//!
//! A bounded poll scheduler that watches train seat availability on behalf of
//! many independent trackings and alerts each owner when matching seats appear.
//!
//! ## Core Problem Solved
//!
//! The upstream ticket site is slow, flaky and rate sensitive, while the set of
//! trackings changes constantly underneath the poller:
//!
//! - **Bounded load**: at most `max_in_flight` lookups run at once
//! - **Fair rotation**: every tracking is polled round-robin, none is skipped or doubled
//! - **Live membership**: trackings join and leave between polls without restarts
//! - **Failure isolation**: one bad lookup never stalls the rotation
//! - **Quiet alerts**: a per-tracking cooldown keeps repeat alerts apart
//! - **Connectivity alarm**: a window of consecutive timeouts raises one operator alert
//!
//! ## Wiring
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use seatwatch::builders::build_scheduler;
//! use seatwatch::config::WatchConfig;
//! use seatwatch::runtime::TokioSpawner;
//!
//! let cfg = WatchConfig::from_env()?;
//! if let Some(service) = &cfg.service_notifications {
//!     let (alerts, forward) = seatwatch::builders::build_operator_alerts(service)?;
//!     seatwatch::util::init_tracing_with_operator_alerts(alerts);
//!     tokio::spawn(forward);
//! }
//! let scheduler = build_scheduler(&cfg, store, source, notifier, TokioSpawner::current())?;
//! scheduler.run().await;
//! ```
//!
//! For complete flows, see `tests/scheduler_test.rs` and `tests/closer_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Domain model, collaborator seams and the poll scheduler.
pub mod core;
/// Configuration models and loaders.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters for stores, inventory sources and notifiers.
pub mod infra;
/// Runtime adapters and status surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
