//! Scheduler, closer and adapter configuration structures.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::SeatThreshold;

/// Default ticket site API root.
pub const DEFAULT_INVENTORY_BASE_URL: &str = "https://ticket.rzd.ru";

/// Poll scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum concurrent poll units (K).
    pub max_in_flight: u32,
    /// Deadline for one inventory lookup, in milliseconds.
    pub lookup_timeout_ms: u64,
    /// Pause between top-up attempts, in milliseconds.
    pub tick_interval_ms: u64,
    /// Pause after a failed reconciliation, in milliseconds.
    pub reconcile_retry_ms: u64,
    /// Minimum seconds between two alerts for one tracking.
    pub notification_cooldown_secs: u64,
    /// Number of lookups kept in the connection health window.
    pub health_window: usize,
    /// Minimum seats a tier needs to count as a match.
    pub seat_threshold: SeatThreshold,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 5,
            lookup_timeout_ms: 5_000,
            tick_interval_ms: 100,
            reconcile_retry_ms: 5_000,
            notification_cooldown_secs: 300,
            health_window: 10,
            seat_threshold: SeatThreshold::AnySeat,
        }
    }
}

impl SchedulerConfig {
    /// Validate scheduler configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be greater than 0".into());
        }
        if self.lookup_timeout_ms == 0 {
            return Err("lookup_timeout_ms must be greater than 0".into());
        }
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".into());
        }
        if self.reconcile_retry_ms == 0 {
            return Err("reconcile_retry_ms must be greater than 0".into());
        }
        if self.health_window == 0 {
            return Err("health_window must be greater than 0".into());
        }
        Ok(())
    }

    /// Lookup deadline.
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Top-up tick.
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Backoff after a failed reconciliation.
    pub const fn reconcile_retry(&self) -> Duration {
        Duration::from_millis(self.reconcile_retry_ms)
    }

    /// Notification cooldown.
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.notification_cooldown_secs).unwrap_or(i64::MAX))
    }
}

/// Tracking closer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloserConfig {
    /// Seconds between closer passes.
    pub interval_secs: u64,
    /// Hours after the first alert before a tracking is finished.
    pub notified_expiry_hours: u32,
}

impl Default for CloserConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            notified_expiry_hours: 24,
        }
    }
}

impl CloserConfig {
    /// Validate closer configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_secs == 0 {
            return Err("interval_secs must be greater than 0".into());
        }
        if self.notified_expiry_hours == 0 {
            return Err("notified_expiry_hours must be greater than 0".into());
        }
        Ok(())
    }

    /// Pause between passes.
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Age of the first alert after which a tracking is finished.
    pub fn notified_expiry(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.notified_expiry_hours))
    }
}

/// Ticket site adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// API root.
    pub base_url: String,
    /// HTTP client timeout, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INVENTORY_BASE_URL.to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

impl InventoryConfig {
    /// Validate adapter configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("base_url `{}` must be an http(s) URL", self.base_url));
        }
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// HTTP client timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Telegram bot credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token.
    pub bot_token: String,
    /// Bot username, used in deep links.
    pub username: String,
}

impl TelegramConfig {
    /// Validate bot credentials.
    pub fn validate(&self) -> Result<(), String> {
        if self.bot_token.trim().is_empty() {
            return Err("bot_token must not be empty".into());
        }
        if self.username.trim().is_empty() {
            return Err("username must not be empty".into());
        }
        Ok(())
    }
}

/// Operator chat that receives error-level log events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceNotificationsConfig {
    /// Bot API token of the service bot.
    pub bot_token: String,
    /// Chat id or `@channel` name of the operator chat.
    pub chat_id: String,
    /// Prefix put on every alert.
    #[serde(default)]
    pub project_name: Option<String>,
}

impl ServiceNotificationsConfig {
    /// Validate service chat settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.bot_token.trim().is_empty() {
            return Err("bot_token must not be empty".into());
        }
        if self.chat_id.trim().is_empty() {
            return Err("chat_id must not be empty".into());
        }
        Ok(())
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll scheduler.
    pub scheduler: SchedulerConfig,
    /// Tracking closer.
    pub closer: CloserConfig,
    /// Ticket site adapter.
    pub inventory: InventoryConfig,
    /// Telegram notifier, when alerts go out through a bot.
    pub telegram: Option<TelegramConfig>,
    /// Operator chat for error-level events.
    pub service_notifications: Option<ServiceNotificationsConfig>,
}

impl WatchConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.scheduler
            .validate()
            .map_err(|e| format!("scheduler invalid: {e}"))?;
        self.closer.validate().map_err(|e| format!("closer invalid: {e}"))?;
        self.inventory
            .validate()
            .map_err(|e| format!("inventory invalid: {e}"))?;
        if let Some(telegram) = &self.telegram {
            telegram.validate().map_err(|e| format!("telegram invalid: {e}"))?;
        }
        if let Some(service) = &self.service_notifications {
            service
                .validate()
                .map_err(|e| format!("service_notifications invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `.env` (silently ignored if missing), then read `__`-nested
    /// environment variables over the defaults and validate.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unset or empty keys keep
    /// their defaults; values that fail to parse are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        let s = &mut cfg.scheduler;
        set_parsed(&get, "SCHEDULER__MAX_IN_FLIGHT", &mut s.max_in_flight)?;
        set_parsed(&get, "SCHEDULER__LOOKUP_TIMEOUT_MS", &mut s.lookup_timeout_ms)?;
        set_parsed(&get, "SCHEDULER__TICK_INTERVAL_MS", &mut s.tick_interval_ms)?;
        set_parsed(&get, "SCHEDULER__RECONCILE_RETRY_MS", &mut s.reconcile_retry_ms)?;
        set_parsed(&get, "SCHEDULER__NOTIFICATION_COOLDOWN_SECS", &mut s.notification_cooldown_secs)?;
        set_parsed(&get, "SCHEDULER__HEALTH_WINDOW", &mut s.health_window)?;
        if let Some(value) = get("SCHEDULER__SEAT_THRESHOLD") {
            s.seat_threshold = match value.trim() {
                "any_seat" => SeatThreshold::AnySeat,
                "with_companion" => SeatThreshold::WithCompanion,
                other => return Err(format!("SCHEDULER__SEAT_THRESHOLD: unknown threshold `{other}`")),
            };
        }

        set_parsed(&get, "CLOSER__INTERVAL_SECS", &mut cfg.closer.interval_secs)?;
        set_parsed(&get, "CLOSER__NOTIFIED_EXPIRY_HOURS", &mut cfg.closer.notified_expiry_hours)?;

        if let Some(url) = get("INVENTORY__BASE_URL") {
            cfg.inventory.base_url = url;
        }
        set_parsed(&get, "INVENTORY__REQUEST_TIMEOUT_MS", &mut cfg.inventory.request_timeout_ms)?;

        cfg.telegram = match (get("TG_BOT__TOKEN"), get("TG_BOT__USERNAME")) {
            (Some(bot_token), Some(username)) => Some(TelegramConfig { bot_token, username }),
            (None, None) => None,
            _ => return Err("TG_BOT__TOKEN and TG_BOT__USERNAME must be set together".into()),
        };

        cfg.service_notifications = match (
            get("SERVICE_NOTIFICATIONS__BOT_TOKEN"),
            get("SERVICE_NOTIFICATIONS__CHAT_ID"),
        ) {
            (Some(bot_token), Some(chat_id)) => Some(ServiceNotificationsConfig {
                bot_token,
                chat_id,
                project_name: get("SERVICE_NOTIFICATIONS__PROJECT_NAME"),
            }),
            (None, None) => None,
            _ => {
                return Err(
                    "SERVICE_NOTIFICATIONS__BOT_TOKEN and SERVICE_NOTIFICATIONS__CHAT_ID must be set together".into(),
                )
            }
        };

        cfg.validate()?;
        Ok(cfg)
    }
}

fn set_parsed<G, T>(get: &G, key: &str, slot: &mut T) -> Result<(), String>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = get(key) {
        *slot = raw.trim().parse().map_err(|e| format!("{key}: {e}"))?;
    }
    Ok(())
}
