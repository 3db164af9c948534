//! Sliding window of connectivity outcomes for the inventory source.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of outcomes kept in the window.
pub const DEFAULT_HEALTH_WINDOW: usize = 10;

/// Point-in-time view of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Window capacity.
    pub capacity: usize,
    /// Outcomes currently held.
    pub len: usize,
    /// Failures currently held.
    pub failures: usize,
    /// Failures at the end of the window with no success after them.
    pub trailing_failures: usize,
    /// Trips since construction.
    pub trips: u64,
}

/// Fixed-capacity ring of recent lookup outcomes.
///
/// Only connectivity timeouts count as failures; decode errors and other
/// faults are never recorded here.
#[derive(Debug, Clone)]
pub struct ConnectionHealth {
    window: VecDeque<bool>,
    capacity: usize,
    trips: u64,
}

impl ConnectionHealth {
    /// Create an empty window. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            trips: 0,
        }
    }

    /// Record one outcome, evicting the oldest when full.
    ///
    /// Returns `true` when the window is full of failures. The window is
    /// cleared on a trip, so the next failure starts a fresh window.
    pub fn record(&mut self, success: bool) -> bool {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(success);

        let tripped = self.window.len() == self.capacity && self.window.iter().all(|ok| !ok);
        if tripped {
            self.trips += 1;
            self.window.clear();
        }
        tripped
    }

    /// Window capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Outcomes currently held.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether no outcome has been recorded since the last reset.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Current view of the window.
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            capacity: self.capacity,
            len: self.window.len(),
            failures: self.window.iter().filter(|ok| !**ok).count(),
            trailing_failures: self.window.iter().rev().take_while(|ok| !**ok).count(),
            trips: self.trips,
        }
    }
}

impl Default for ConnectionHealth {
    fn default() -> Self {
        Self::new(DEFAULT_HEALTH_WINDOW)
    }
}
