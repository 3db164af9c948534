//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use seatwatch::config::{CloserConfig, InventoryConfig, SchedulerConfig, WatchConfig};
use seatwatch::core::SeatThreshold;

#[test]
fn test_defaults_are_valid() {
    let cfg = WatchConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.scheduler.max_in_flight, 5);
    assert_eq!(cfg.scheduler.lookup_timeout(), Duration::from_secs(5));
    assert_eq!(cfg.scheduler.cooldown(), chrono::Duration::minutes(5));
    assert_eq!(cfg.scheduler.health_window, 10);
    assert_eq!(cfg.closer.interval(), Duration::from_secs(60));
    assert_eq!(cfg.closer.notified_expiry(), chrono::Duration::hours(24));
    assert!(cfg.telegram.is_none());
}

#[test]
fn test_scheduler_config_invalid_cap() {
    let invalid = SchedulerConfig {
        max_in_flight: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_window() {
    let invalid = SchedulerConfig {
        health_window: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_closer_config_invalid_interval() {
    let invalid = CloserConfig {
        interval_secs: 0,
        ..CloserConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_inventory_config_requires_http_url() {
    let invalid = InventoryConfig {
        base_url: "ticket.rzd.ru".to_string(),
        ..InventoryConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_from_json_str_fills_defaults() {
    let json = r#"{
        "scheduler": { "max_in_flight": 8, "seat_threshold": "with_companion" },
        "telegram": { "bot_token": "123:ABC", "username": "seat_bot" }
    }"#;
    let cfg = WatchConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.scheduler.max_in_flight, 8);
    assert_eq!(cfg.scheduler.seat_threshold, SeatThreshold::WithCompanion);
    assert_eq!(cfg.scheduler.lookup_timeout_ms, 5_000);
    assert_eq!(cfg.telegram.unwrap().username, "seat_bot");
}

#[test]
fn test_from_json_str_rejects_invalid() {
    let err = WatchConfig::from_json_str(r#"{"scheduler": {"max_in_flight": 0}}"#).unwrap_err();
    assert!(err.contains("scheduler invalid"));
    assert!(WatchConfig::from_json_str("not json").unwrap_err().starts_with("parse error"));
}

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_from_lookup_reads_nested_keys() {
    let cfg = WatchConfig::from_lookup(lookup(&[
        ("SCHEDULER__MAX_IN_FLIGHT", "3"),
        ("SCHEDULER__SEAT_THRESHOLD", "with_companion"),
        ("CLOSER__NOTIFIED_EXPIRY_HOURS", "12"),
        ("INVENTORY__BASE_URL", "http://localhost:9000"),
        ("TG_BOT__TOKEN", "123:ABC"),
        ("TG_BOT__USERNAME", "seat_bot"),
    ]))
    .unwrap();
    assert_eq!(cfg.scheduler.max_in_flight, 3);
    assert_eq!(cfg.scheduler.seat_threshold, SeatThreshold::WithCompanion);
    assert_eq!(cfg.closer.notified_expiry_hours, 12);
    assert_eq!(cfg.inventory.base_url, "http://localhost:9000");
    assert_eq!(cfg.telegram.unwrap().bot_token, "123:ABC");
}

#[test]
fn test_from_lookup_rejects_bad_values() {
    let err = WatchConfig::from_lookup(lookup(&[("SCHEDULER__MAX_IN_FLIGHT", "many")])).unwrap_err();
    assert!(err.starts_with("SCHEDULER__MAX_IN_FLIGHT"));

    let err = WatchConfig::from_lookup(lookup(&[("TG_BOT__TOKEN", "123:ABC")])).unwrap_err();
    assert!(err.contains("must be set together"));
}

#[test]
fn test_from_lookup_empty_keeps_defaults() {
    let cfg = WatchConfig::from_lookup(lookup(&[("SCHEDULER__MAX_IN_FLIGHT", "")])).unwrap();
    assert_eq!(cfg.scheduler.max_in_flight, 5);
}

#[test]
fn test_from_lookup_reads_service_chat() {
    let cfg = WatchConfig::from_lookup(lookup(&[
        ("SERVICE_NOTIFICATIONS__BOT_TOKEN", "777:OPS"),
        ("SERVICE_NOTIFICATIONS__CHAT_ID", "-1001234"),
        ("SERVICE_NOTIFICATIONS__PROJECT_NAME", "seatwatch-prod"),
    ]))
    .unwrap();
    let service = cfg.service_notifications.unwrap();
    assert_eq!(service.chat_id, "-1001234");
    assert_eq!(service.project_name.as_deref(), Some("seatwatch-prod"));

    let err = WatchConfig::from_lookup(lookup(&[("SERVICE_NOTIFICATIONS__CHAT_ID", "-1001234")])).unwrap_err();
    assert!(err.contains("must be set together"));
}

#[test]
fn test_service_chat_requires_chat_id() {
    let json = r#"{"service_notifications": {"bot_token": "777:OPS", "chat_id": " "}}"#;
    let err = WatchConfig::from_json_str(json).unwrap_err();
    assert!(err.contains("service_notifications invalid"));
}
