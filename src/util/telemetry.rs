//! Telemetry helpers for structured logging and tracing.
//!
//! Besides the default fmt subscriber, error-level events can be forwarded to an
//! operator chat: [`OperatorAlertLayer`] renders each ERROR event and hands it to
//! a channel, and [`forward_operator_alerts`] drains that channel into an
//! [`OperatorChannel`].

use std::fmt::{self, Write as _};

use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::text::{escape_html, truncate};
use crate::core::OperatorChannel;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "seatwatch=info";

/// Alerts longer than this many characters are cut down to an excerpt.
pub const OPERATOR_ALERT_LIMIT: usize = 3_700;

/// Characters kept from an alert that exceeded [`OPERATOR_ALERT_LIMIT`].
pub const OPERATOR_ALERT_EXCERPT: usize = 800;

/// Initialize tracing/telemetry. Users can install their own subscriber; this
/// helper installs a default env-based subscriber if none is set.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter()).try_init();
}

/// Like [`init_tracing`], with error-level events also sent through `alerts`.
pub fn init_tracing_with_operator_alerts(alerts: OperatorAlertLayer) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(alerts)
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Render one operator alert as Telegram HTML.
pub fn render_operator_alert(project_name: Option<&str>, message: &str) -> String {
    let mut text = String::new();
    if let Some(name) = project_name {
        let _ = writeln!(text, "{}: ", escape_html(name));
    }
    let body = if message.chars().count() > OPERATOR_ALERT_LIMIT {
        format!("{}\n\n[full text in the service log]", truncate(message, OPERATOR_ALERT_EXCERPT))
    } else {
        message.to_string()
    };
    let _ = write!(text, "<pre><code>{}</code></pre>", escape_html(&body));
    text
}

/// `tracing` layer that queues a rendered alert for every ERROR event.
pub struct OperatorAlertLayer {
    project_name: Option<String>,
    tx: mpsc::UnboundedSender<String>,
}

/// Create the layer and the receiving end its alerts are queued on.
pub fn operator_alert_layer(project_name: Option<String>) -> (OperatorAlertLayer, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (OperatorAlertLayer { project_name, tx }, rx)
}

impl<S: Subscriber> Layer<S> for OperatorAlertLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() != Level::ERROR {
            return;
        }
        let mut fields = EventText::default();
        event.record(&mut fields);
        let line = fields.into_line(meta.target());
        // Receiver gone means alerts are switched off.
        let _ = self.tx.send(render_operator_alert(self.project_name.as_deref(), &line));
    }
}

#[derive(Default)]
struct EventText {
    message: String,
    fields: String,
}

impl EventText {
    fn into_line(self, target: &str) -> String {
        format!("ERROR {target}: {}{}", self.message, self.fields)
    }
}

impl Visit for EventText {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

/// Deliver queued alerts until every [`OperatorAlertLayer`] handle is dropped.
///
/// A failed delivery is logged at `warn`, so it never loops back into the layer.
pub async fn forward_operator_alerts<C>(mut alerts: mpsc::UnboundedReceiver<String>, channel: &C)
where
    C: OperatorChannel + ?Sized,
{
    while let Some(text) = alerts.recv().await {
        if let Err(e) = channel.alert(&text).await {
            tracing::warn!(error = %e, "operator alert not delivered");
        }
    }
}
