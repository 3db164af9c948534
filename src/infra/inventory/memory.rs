//! Scripted inventory source for development/testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::core::{InventoryError, InventoryRecord, InventorySource};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedLookup {
    /// Return these records.
    Records(Vec<InventoryRecord>),
    /// Fail with a timeout.
    Timeout,
    /// Fail with an undecodable payload.
    Malformed(String),
    /// Fail with a transport error.
    Transport(String),
    /// Sleep, then return these records. Lets callers exercise their own deadline.
    Delayed(Duration, Vec<InventoryRecord>),
}

type RouteKey = (String, String, NaiveDate);

/// In-memory source keyed by route and date.
///
/// Per-route scripts are consumed front to back; once a script is exhausted
/// (or absent) the route's fixed records are returned, or an empty list.
#[derive(Default)]
pub struct InMemoryInventorySource {
    fixed: Mutex<HashMap<RouteKey, Vec<InventoryRecord>>>,
    scripts: Mutex<HashMap<RouteKey, VecDeque<ScriptedLookup>>>,
    lookups: AtomicUsize,
}

impl InMemoryInventorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(origin: &str, destination: &str, date: NaiveDate) -> RouteKey {
        (origin.to_string(), destination.to_string(), date)
    }

    /// Records returned for a route whenever no script is pending.
    pub fn set_records(&self, origin: &str, destination: &str, date: NaiveDate, records: Vec<InventoryRecord>) {
        self.fixed.lock().insert(Self::key(origin, destination, date), records);
    }

    /// Queue a one-off reply for a route.
    pub fn push_script(&self, origin: &str, destination: &str, date: NaiveDate, reply: ScriptedLookup) {
        self.scripts
            .lock()
            .entry(Self::key(origin, destination, date))
            .or_default()
            .push_back(reply);
    }

    /// Lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Acquire)
    }
}

#[async_trait]
impl InventorySource for InMemoryInventorySource {
    async fn lookup(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<InventoryRecord>, InventoryError> {
        self.lookups.fetch_add(1, Ordering::AcqRel);
        let key = Self::key(origin, destination, date);
        let scripted = self.scripts.lock().get_mut(&key).and_then(VecDeque::pop_front);
        match scripted {
            Some(ScriptedLookup::Records(records)) => Ok(records),
            Some(ScriptedLookup::Timeout) => Err(InventoryError::Timeout(Duration::ZERO)),
            Some(ScriptedLookup::Malformed(payload)) => Err(InventoryError::Malformed {
                reason: "scripted malformed payload".into(),
                payload,
            }),
            Some(ScriptedLookup::Transport(reason)) => Err(InventoryError::Transport(reason)),
            Some(ScriptedLookup::Delayed(delay, records)) => {
                tokio::time::sleep(delay).await;
                Ok(records)
            }
            None => Ok(self.fixed.lock().get(&key).cloned().unwrap_or_default()),
        }
    }
}
