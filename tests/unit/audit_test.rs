//! Tests for audit sink

use std::sync::Arc;

use parking_lot::Mutex;
use seatwatch::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(Some(7), AuditAction::Notified, Some("020У".to_string()));

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].tracking_id, Some(7));
    assert_eq!(events[0].action, AuditAction::Notified);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(Some(1), AuditAction::Added, None));
    sink.record(build_audit_event(Some(2), AuditAction::Added, None));
    sink.record(build_audit_event(Some(3), AuditAction::Added, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].tracking_id, Some(2)); // First one popped
    assert_eq!(events[1].tracking_id, Some(3));
}

#[test]
fn test_build_audit_event() {
    let a = build_audit_event(None, AuditAction::HealthTrip, Some("10 consecutive timeouts".to_string()));
    let b = build_audit_event(None, AuditAction::HealthTrip, None);

    assert_ne!(a.event_id, b.event_id);
    assert!(uuid::Uuid::parse_str(&a.event_id).is_ok());
    assert_eq!(a.tracking_id, None);
    assert_eq!(a.detail.as_deref(), Some("10 consecutive timeouts"));
    assert!(a.created_at <= b.created_at);
}

#[test]
fn test_shared_sink_handle() {
    let shared = Arc::new(Mutex::new(InMemoryAuditSink::new(4)));
    let mut writer: Box<dyn AuditSink> = Box::new(Arc::clone(&shared));
    writer.record(build_audit_event(Some(1), AuditAction::Evicted, None));
    assert_eq!(shared.lock().events().len(), 1);
}

#[test]
fn test_action_serializes_snake_case() {
    let json = serde_json::to_string(&AuditAction::DeliveryFailed).unwrap();
    assert_eq!(json, "\"delivery_failed\"");
}
