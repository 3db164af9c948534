//! Builders to construct the scheduler, closer and operator alerts from configuration.

use std::future::Future;
use std::sync::Arc;

use crate::config::{ServiceNotificationsConfig, WatchConfig};
use crate::core::{InventorySource, Notifier, PollScheduler, Spawn, TrackingCloser, TrackingStore, WatchError};
use crate::infra::TelegramServiceChat;
use crate::util::{forward_operator_alerts, operator_alert_layer, OperatorAlertLayer};

/// Validate configuration and wire a poll scheduler from its collaborators.
pub fn build_scheduler<St, Src, N, Sp>(
    cfg: &WatchConfig,
    store: Arc<St>,
    source: Arc<Src>,
    notifier: Arc<N>,
    spawner: Sp,
) -> Result<PollScheduler<St, Src, N, Sp>, WatchError>
where
    St: TrackingStore,
    Src: InventorySource,
    N: Notifier,
    Sp: Spawn,
{
    cfg.validate().map_err(WatchError::Config)?;
    Ok(PollScheduler::new(cfg.scheduler.clone(), store, source, notifier, spawner))
}

/// Validate configuration and wire a tracking closer. The bot username, when
/// configured, enables the re-create link in closed notices.
pub fn build_closer<St, N>(cfg: &WatchConfig, store: Arc<St>, notifier: Arc<N>) -> Result<TrackingCloser<St, N>, WatchError>
where
    St: TrackingStore,
    N: Notifier,
{
    cfg.validate().map_err(WatchError::Config)?;
    let closer = TrackingCloser::new(cfg.closer.clone(), store, notifier);
    Ok(match &cfg.telegram {
        Some(telegram) => closer.with_bot_username(telegram.username.clone()),
        None => closer,
    })
}

/// Wire operator alerts to the configured service chat.
///
/// Install the returned layer (for example with
/// [`init_tracing_with_operator_alerts`](crate::util::init_tracing_with_operator_alerts))
/// and spawn the returned future; it ends once the layer is dropped.
pub fn build_operator_alerts(
    cfg: &ServiceNotificationsConfig,
) -> Result<(OperatorAlertLayer, impl Future<Output = ()> + Send + 'static), WatchError> {
    let chat = TelegramServiceChat::from_config(cfg)?;
    let (layer, alerts) = operator_alert_layer(cfg.project_name.clone());
    Ok((layer, async move { forward_operator_alerts(alerts, &chat).await }))
}
