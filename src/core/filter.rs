//! Availability filter: which departures satisfy a tracking's seat and price criteria.
//!
//! Each price tier is checked on its own: enabled sub-categories of the tier are
//! summed, compared against the seat threshold, and the tier's own minimum price
//! is compared against the tracking's ceiling. A departure is kept once if any
//! tier qualifies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{InventoryError, InventoryRecord, InventorySource, PriceTier, SeatCriteria, Tracking};

/// Minimum number of free seats a tier must offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatThreshold {
    /// At least one seat.
    #[default]
    AnySeat,
    /// Room for a companion: at least two seats.
    WithCompanion,
}

impl SeatThreshold {
    /// Seat count required by this mode.
    pub const fn min_seats(self) -> u32 {
        match self {
            Self::AnySeat => 1,
            Self::WithCompanion => 2,
        }
    }
}

/// A tier of a departure that satisfied the criteria.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierMatch {
    /// Matching tier.
    pub tier: PriceTier,
    /// Free seats across the enabled sub-categories.
    pub seats: u32,
    /// Tier minimum price, when the source reported one.
    pub min_price: Option<f64>,
}

fn price_allowed(max_price: Option<f64>, min_price: Option<f64>) -> bool {
    match (max_price, min_price) {
        (None, _) => true,
        (Some(max), Some(price)) => price <= max,
        (Some(_), None) => false,
    }
}

/// Tiers of `record` that satisfy `criteria`, in display order.
pub fn matching_tiers(
    record: &InventoryRecord,
    criteria: &SeatCriteria,
    threshold: SeatThreshold,
) -> Vec<TierMatch> {
    PriceTier::ALL
        .into_iter()
        .filter_map(|tier| {
            let mut enabled = tier
                .classes()
                .iter()
                .filter(|class| criteria.seat_classes.contains(**class))
                .peekable();
            enabled.peek()?;
            let seats: u32 = enabled.map(|class| record.seats(*class)).sum();
            let min_price = record.min_price(tier);
            (seats >= threshold.min_seats() && price_allowed(criteria.max_price, min_price))
                .then_some(TierMatch { tier, seats, min_price })
        })
        .collect()
}

/// Whether any tier of `record` satisfies `criteria`.
pub fn record_matches(record: &InventoryRecord, criteria: &SeatCriteria, threshold: SeatThreshold) -> bool {
    !matching_tiers(record, criteria, threshold).is_empty()
}

/// Departures that satisfy `criteria`, in input order, each at most once.
pub fn matches(
    records: Vec<InventoryRecord>,
    criteria: &SeatCriteria,
    threshold: SeatThreshold,
) -> Vec<InventoryRecord> {
    records
        .into_iter()
        .filter(|record| record_matches(record, criteria, threshold))
        .collect()
}

/// Save-time check: is there room for a companion on this tracking right now?
pub async fn precheck<S>(
    source: &S,
    tracking: &Tracking,
    timeout: Duration,
) -> Result<Vec<InventoryRecord>, InventoryError>
where
    S: InventorySource + ?Sized,
{
    let lookup = source.lookup(&tracking.origin.code, &tracking.destination.code, tracking.date);
    let records = tokio::time::timeout(timeout, lookup)
        .await
        .map_err(|_| InventoryError::Timeout(timeout))??;
    Ok(matches(records, &tracking.criteria, SeatThreshold::WithCompanion))
}
