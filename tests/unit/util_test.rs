//! Tests for utility functions

use chrono::NaiveDate;
use seatwatch::core::NotifyError;
use seatwatch::infra::InMemoryOperatorChannel;
use seatwatch::util::{
    copy_tracking_link, escape_html, forward_operator_alerts, operator_alert_layer, search_results_url, truncate,
    LOG_PAYLOAD_LIMIT,
};
use tracing_subscriber::layer::SubscriberExt;

#[test]
fn test_search_link_uses_site_codes() {
    let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    assert!(search_results_url("2000000", "2010290", date).ends_with("/2000000/2010290/2024-12-31"));
}

#[test]
fn test_copy_link() {
    assert!(copy_tracking_link("bot", 3).ends_with("start=tracking_copy_3"));
}

#[test]
fn test_escape_html_train_names() {
    assert_eq!(escape_html("Сапсан <A&B>"), "Сапсан &lt;A&amp;B&gt;");
}

#[test]
fn test_log_payload_limit() {
    let long = "ж".repeat(LOG_PAYLOAD_LIMIT * 2);
    assert_eq!(truncate(&long, LOG_PAYLOAD_LIMIT).chars().count(), LOG_PAYLOAD_LIMIT + 3);
}

#[test]
fn test_init_tracing_is_idempotent() {
    seatwatch::util::init_tracing();
    seatwatch::util::init_tracing();
    tracing::info!(target: "seatwatch", "tracing initialised twice without panicking");
}

#[tokio::test]
async fn test_operator_alerts_carry_error_events_only() {
    let (layer, queued) = operator_alert_layer(Some("seatwatch-prod".into()));
    tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
        tracing::info!("cycle finished");
        tracing::warn!(tracking_id = 4, "alert delivery failed");
        tracing::error!(target: "seatwatch::core::scheduler", error = "store unavailable: timeout", "reconciliation failed");
    });

    let channel = InMemoryOperatorChannel::new();
    forward_operator_alerts(queued, &channel).await;

    let alerts = channel.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(
        alerts[0],
        "seatwatch-prod: \n<pre><code>ERROR seatwatch::core::scheduler: reconciliation failed \
         error=store unavailable: timeout</code></pre>"
    );
}

#[tokio::test]
async fn test_failed_operator_alert_does_not_stop_forwarding() {
    let (layer, queued) = operator_alert_layer(None);
    tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
        tracing::error!("first");
        tracing::error!("second");
    });

    let channel = InMemoryOperatorChannel::new();
    channel.fail_next(NotifyError::RateLimited { retry_after_secs: 5 });
    forward_operator_alerts(queued, &channel).await;

    let alerts = channel.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("second"));
}
