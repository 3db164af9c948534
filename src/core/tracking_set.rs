//! In-memory working set of trackings and the FIFO rotation over them.
//!
//! The map holds the last-known snapshot of every tracking in rotation; the
//! queue holds tickets for the ones waiting to be polled. Each insertion into
//! the map gets a fresh generation, and a ticket only resolves while its
//! generation is current. Eviction therefore never has to search the queue:
//! stale tickets fall out as [`Resolution::Vanished`] when they are reached.

use std::collections::{HashMap, HashSet, VecDeque};

use super::{Tracking, TrackingId};

/// Queue entry for one tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    /// Tracking identifier.
    pub id: TrackingId,
    /// Map generation the ticket was issued for.
    pub generation: u64,
}

/// Result of looking a ticket up in the map.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Tracking is still in rotation; carries its current snapshot.
    Resolved(Tracking),
    /// Tracking was evicted (or replaced) since the ticket was issued.
    Vanished,
}

/// Changes applied by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Newly inserted ids, in fetch order.
    pub added: Vec<TrackingId>,
    /// Ids whose snapshot was refreshed in place.
    pub updated: usize,
    /// Ids removed from the map.
    pub evicted: Vec<TrackingId>,
    /// Trackings in rotation after the pass.
    pub tracked: usize,
}

#[derive(Debug)]
struct Entry {
    tracking: Tracking,
    generation: u64,
}

/// Map of trackings in rotation plus the FIFO of tickets awaiting a poll.
#[derive(Debug, Default)]
pub struct TrackingSet {
    entries: HashMap<TrackingId, Entry>,
    queue: VecDeque<Ticket>,
    next_generation: u64,
}

impl TrackingSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sync the map with an authoritative snapshot of active, eligible trackings.
    ///
    /// New ids are inserted and queued at the tail, known ids are refreshed
    /// without touching their queue position, and ids missing from `fresh`
    /// (or no longer pollable) are evicted from the map only.
    pub fn reconcile(&mut self, fresh: Vec<Tracking>) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut seen = HashSet::with_capacity(fresh.len());

        for tracking in fresh {
            if !tracking.is_pollable() || !seen.insert(tracking.id) {
                continue;
            }
            if let Some(entry) = self.entries.get_mut(&tracking.id) {
                entry.tracking = tracking;
                report.updated += 1;
            } else {
                let ticket = self.insert(tracking);
                self.queue.push_back(ticket);
                report.added.push(ticket.id);
            }
        }

        self.entries.retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                report.evicted.push(*id);
            }
            keep
        });

        report.tracked = self.entries.len();
        report
    }

    fn insert(&mut self, tracking: Tracking) -> Ticket {
        self.next_generation += 1;
        let ticket = Ticket {
            id: tracking.id,
            generation: self.next_generation,
        };
        self.entries.insert(
            tracking.id,
            Entry {
                tracking,
                generation: ticket.generation,
            },
        );
        ticket
    }

    /// Pop the ticket at the head of the rotation.
    pub fn pop_next(&mut self) -> Option<Ticket> {
        self.queue.pop_front()
    }

    /// Return a popped ticket to the head of the rotation.
    pub fn push_front(&mut self, ticket: Ticket) {
        self.queue.push_front(ticket);
    }

    /// Resolve a ticket against the map.
    pub fn resolve(&self, ticket: Ticket) -> Resolution {
        match self.entries.get(&ticket.id) {
            Some(entry) if entry.generation == ticket.generation => Resolution::Resolved(entry.tracking.clone()),
            _ => Resolution::Vanished,
        }
    }

    /// Put a ticket back at the tail if it still resolves. Returns whether it was queued.
    pub fn requeue(&mut self, ticket: Ticket) -> bool {
        let current = self
            .entries
            .get(&ticket.id)
            .is_some_and(|entry| entry.generation == ticket.generation);
        if current {
            self.queue.push_back(ticket);
        }
        current
    }

    /// Whether `id` is in rotation.
    pub fn contains(&self, id: TrackingId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Current snapshot of a tracking in rotation.
    pub fn get(&self, id: TrackingId) -> Option<&Tracking> {
        self.entries.get(&id).map(|entry| &entry.tracking)
    }

    /// Trackings in rotation.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tracking is in rotation.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tickets waiting in the queue, stale ones included.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Ids waiting in the queue, head first.
    pub fn queued_ids(&self) -> Vec<TrackingId> {
        self.queue.iter().map(|ticket| ticket.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Station;
    use chrono::NaiveDate;

    fn tracking(id: TrackingId) -> Tracking {
        let date = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        Tracking::new(id, 1, Station::new("A", "A"), Station::new("B", "B"), date)
    }

    #[test]
    fn test_new_trackings_are_queued_in_fetch_order() {
        let mut set = TrackingSet::new();
        let report = set.reconcile(vec![tracking(3), tracking(1), tracking(2)]);
        assert_eq!(report.added, vec![3, 1, 2]);
        assert_eq!(set.queued_ids(), vec![3, 1, 2]);
        assert_eq!(report.tracked, 3);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut set = TrackingSet::new();
        set.reconcile(vec![tracking(1), tracking(2)]);
        let report = set.reconcile(vec![tracking(1), tracking(2)]);
        assert!(report.added.is_empty());
        assert!(report.evicted.is_empty());
        assert_eq!(report.updated, 2);
        assert_eq!(set.queued_ids(), vec![1, 2]);
        assert_eq!(set.get(1).unwrap().criteria, tracking(1).criteria);
    }

    #[test]
    fn test_update_in_place_keeps_position() {
        let mut set = TrackingSet::new();
        set.reconcile(vec![tracking(1), tracking(2)]);
        let edited = tracking(1).with_max_price(Some(1500.0));
        set.reconcile(vec![tracking(2), edited]);
        assert_eq!(set.queued_ids(), vec![1, 2]);
        assert_eq!(set.get(1).unwrap().criteria.max_price, Some(1500.0));
    }

    #[test]
    fn test_unpollable_or_missing_are_evicted() {
        let mut set = TrackingSet::new();
        set.reconcile(vec![tracking(1), tracking(2), tracking(3)]);
        let mut banned = tracking(2);
        banned.eligible = false;
        let report = set.reconcile(vec![tracking(1), banned]);
        let mut evicted = report.evicted.clone();
        evicted.sort_unstable();
        assert_eq!(evicted, vec![2, 3]);
        assert!(set.contains(1));
        assert!(!set.contains(2));
        // Removal is soft: stale tickets stay queued until reached.
        assert_eq!(set.queued(), 3);
    }

    #[test]
    fn test_vanished_ticket_is_not_requeued() {
        let mut set = TrackingSet::new();
        set.reconcile(vec![tracking(9)]);
        set.reconcile(Vec::new());

        let ticket = set.pop_next().unwrap();
        assert_eq!(set.resolve(ticket), Resolution::Vanished);
        assert!(!set.requeue(ticket));
        assert_eq!(set.queued(), 0);
    }

    #[test]
    fn test_readded_tracking_does_not_duplicate_rotation() {
        let mut set = TrackingSet::new();
        set.reconcile(vec![tracking(5)]);
        let in_flight = set.pop_next().unwrap();

        // Evicted and re-added while the old ticket is in flight.
        set.reconcile(Vec::new());
        set.reconcile(vec![tracking(5)]);
        assert_eq!(set.queued_ids(), vec![5]);

        assert_eq!(set.resolve(in_flight), Resolution::Vanished);
        assert!(!set.requeue(in_flight));
        assert_eq!(set.queued_ids(), vec![5]);

        let fresh = set.pop_next().unwrap();
        assert!(matches!(set.resolve(fresh), Resolution::Resolved(t) if t.id == 5));
    }

    #[test]
    fn test_pushed_back_ticket_keeps_its_turn() {
        let mut set = TrackingSet::new();
        set.reconcile(vec![tracking(1), tracking(2)]);

        let head = set.pop_next().unwrap();
        set.push_front(head);
        assert_eq!(set.queued_ids(), vec![1, 2]);
        assert!(matches!(set.resolve(head), Resolution::Resolved(t) if t.id == 1));
    }

    #[test]
    fn test_duplicate_ids_in_fetch_are_inserted_once() {
        let mut set = TrackingSet::new();
        let report = set.reconcile(vec![tracking(1), tracking(1)]);
        assert_eq!(report.added, vec![1]);
        assert_eq!(set.queued(), 1);
    }
}
