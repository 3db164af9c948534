//! Tests for builder modules

use std::sync::Arc;

use seatwatch::builders::{build_closer, build_operator_alerts, build_scheduler};
use seatwatch::config::{SchedulerConfig, ServiceNotificationsConfig, WatchConfig};
use seatwatch::core::WatchError;
use seatwatch::infra::{InMemoryInventorySource, InMemoryNotifier, InMemoryStore};
use seatwatch::runtime::TokioSpawner;

#[tokio::test]
async fn test_build_scheduler_uses_config() {
    let cfg = WatchConfig {
        scheduler: SchedulerConfig {
            max_in_flight: 7,
            ..SchedulerConfig::default()
        },
        ..WatchConfig::default()
    };
    let scheduler = build_scheduler(
        &cfg,
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryInventorySource::new()),
        Arc::new(InMemoryNotifier::new()),
        TokioSpawner::current(),
    )
    .unwrap();
    assert_eq!(scheduler.max_in_flight(), 7);
    assert_eq!(scheduler.in_flight(), 0);
    assert!(!scheduler.is_running());
}

#[tokio::test]
async fn test_build_scheduler_rejects_invalid_config() {
    let mut cfg = WatchConfig::default();
    cfg.scheduler.lookup_timeout_ms = 0;
    let result = build_scheduler(
        &cfg,
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryInventorySource::new()),
        Arc::new(InMemoryNotifier::new()),
        TokioSpawner::current(),
    );
    assert!(matches!(result, Err(WatchError::Config(_))));
}

#[test]
fn test_build_closer_rejects_invalid_config() {
    let mut cfg = WatchConfig::default();
    cfg.closer.notified_expiry_hours = 0;
    let result = build_closer(&cfg, Arc::new(InMemoryStore::new()), Arc::new(InMemoryNotifier::new()));
    assert!(matches!(result, Err(WatchError::Config(_))));
}

#[test]
fn test_build_operator_alerts_checks_service_chat() {
    let mut cfg = ServiceNotificationsConfig {
        bot_token: "777:OPS".into(),
        chat_id: "-1001234".into(),
        project_name: Some("seatwatch".into()),
    };
    assert!(build_operator_alerts(&cfg).is_ok());

    cfg.bot_token.clear();
    assert!(matches!(build_operator_alerts(&cfg), Err(WatchError::Notify(_))));
}
