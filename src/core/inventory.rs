//! Inventory records and the lookup abstraction over the external seat source.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{InventoryError, PriceTier, SeatClass};

/// Availability of one train departure, normalized per seat class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Train number as displayed to passengers.
    pub train_number: String,
    /// Local departure time.
    pub departure: NaiveDateTime,
    /// Local arrival time.
    pub arrival: NaiveDateTime,
    /// Departure station name.
    pub origin_name: String,
    /// Arrival station name.
    pub destination_name: String,
    seats: [u32; 8],
    min_prices: [Option<f64>; 4],
}

impl InventoryRecord {
    /// Create a record with no seats available.
    pub fn new(train_number: impl Into<String>, departure: NaiveDateTime, arrival: NaiveDateTime) -> Self {
        Self {
            train_number: train_number.into(),
            departure,
            arrival,
            origin_name: String::new(),
            destination_name: String::new(),
            seats: [0; 8],
            min_prices: [None; 4],
        }
    }

    /// Set the station names.
    #[must_use]
    pub fn with_route(mut self, origin_name: impl Into<String>, destination_name: impl Into<String>) -> Self {
        self.origin_name = origin_name.into();
        self.destination_name = destination_name.into();
        self
    }

    /// Set the free seat count of one class.
    #[must_use]
    pub fn with_seats(mut self, class: SeatClass, count: u32) -> Self {
        self.seats[class.index()] = count;
        self
    }

    /// Set the minimum price of one tier.
    #[must_use]
    pub fn with_min_price(mut self, tier: PriceTier, price: f64) -> Self {
        self.min_prices[tier.index()] = Some(price);
        self
    }

    /// Free seats of one class.
    pub const fn seats(&self, class: SeatClass) -> u32 {
        self.seats[class.index()]
    }

    /// Add free seats to one class.
    pub fn add_seats(&mut self, class: SeatClass, count: u32) {
        let slot = &mut self.seats[class.index()];
        *slot = slot.saturating_add(count);
    }

    /// Lowest price offered in a tier, if any car of that tier is on sale.
    pub const fn min_price(&self, tier: PriceTier) -> Option<f64> {
        self.min_prices[tier.index()]
    }

    /// Lower the tier's minimum price to `price` if it is cheaper.
    pub fn offer_price(&mut self, tier: PriceTier, price: f64) {
        let slot = &mut self.min_prices[tier.index()];
        *slot = Some(slot.map_or(price, |current| current.min(price)));
    }

    /// Free seats across every class of a tier.
    pub fn tier_seats(&self, tier: PriceTier) -> u32 {
        tier.classes().iter().map(|class| self.seats(*class)).sum()
    }
}

/// Remote seat inventory, queried once per poll unit.
///
/// Implementations should not apply their own retry policy: the scheduler
/// wraps each call in a deadline and classifies the outcome.
#[async_trait]
pub trait InventorySource: Send + Sync + 'static {
    /// Fetch every departure between two stations on a date.
    async fn lookup(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<InventoryRecord>, InventoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn departure() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    #[test]
    fn test_offer_price_keeps_minimum() {
        let mut record = InventoryRecord::new("001A", departure(), departure());
        assert_eq!(record.min_price(PriceTier::Reserved), None);

        record.offer_price(PriceTier::Reserved, 3000.0);
        record.offer_price(PriceTier::Reserved, 2500.0);
        record.offer_price(PriceTier::Reserved, 2700.0);
        assert_eq!(record.min_price(PriceTier::Reserved), Some(2500.0));
    }

    #[test]
    fn test_tier_seats_sums_sub_categories() {
        let record = InventoryRecord::new("002A", departure(), departure())
            .with_seats(SeatClass::CompartmentUpper, 3)
            .with_seats(SeatClass::CompartmentLower, 4)
            .with_seats(SeatClass::Seated, 9);
        assert_eq!(record.tier_seats(PriceTier::Compartment), 7);
        assert_eq!(record.tier_seats(PriceTier::Seated), 9);
        assert_eq!(record.tier_seats(PriceTier::Reserved), 0);
    }
}
