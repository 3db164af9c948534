//! Tracking and notification records shared by the scheduler and its collaborators.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a tracking. Stable across reconciliation cycles.
pub type TrackingId = i64;

/// Identifier of the owning user (also the chat the alert is sent to).
pub type UserId = i64;

/// Seat categories a tracking can enable independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatClass {
    /// Sleeping car with two-berth compartments ("SV").
    FirstClass,
    /// Seated car ("SID").
    Seated,
    /// Open-plan sleeper, lower berth.
    ReservedLower,
    /// Open-plan sleeper, upper berth.
    ReservedUpper,
    /// Open-plan sleeper, side lower berth.
    ReservedSideLower,
    /// Open-plan sleeper, side upper berth.
    ReservedSideUpper,
    /// Four-berth compartment, upper berth.
    CompartmentUpper,
    /// Four-berth compartment, lower berth.
    CompartmentLower,
}

impl SeatClass {
    /// Every seat class, in display order.
    pub const ALL: [Self; 8] = [
        Self::FirstClass,
        Self::Seated,
        Self::ReservedLower,
        Self::ReservedUpper,
        Self::ReservedSideLower,
        Self::ReservedSideUpper,
        Self::CompartmentUpper,
        Self::CompartmentLower,
    ];

    /// Position of this class in [`SeatClass::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::FirstClass => 0,
            Self::Seated => 1,
            Self::ReservedLower => 2,
            Self::ReservedUpper => 3,
            Self::ReservedSideLower => 4,
            Self::ReservedSideUpper => 5,
            Self::CompartmentUpper => 6,
            Self::CompartmentLower => 7,
        }
    }

    /// Price tier the class is sold under.
    pub const fn tier(self) -> PriceTier {
        match self {
            Self::FirstClass => PriceTier::FirstClass,
            Self::Seated => PriceTier::Seated,
            Self::ReservedLower
            | Self::ReservedUpper
            | Self::ReservedSideLower
            | Self::ReservedSideUpper => PriceTier::Reserved,
            Self::CompartmentUpper | Self::CompartmentLower => PriceTier::Compartment,
        }
    }
}

/// Car types priced as one unit. Sub-categories of a tier share a minimum price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    /// "SV" cars.
    FirstClass,
    /// "SID" cars.
    Seated,
    /// "PLATZ" open-plan sleepers.
    Reserved,
    /// "KUPE" compartment cars.
    Compartment,
}

impl PriceTier {
    /// Every tier, in display order.
    pub const ALL: [Self; 4] = [Self::FirstClass, Self::Seated, Self::Reserved, Self::Compartment];

    /// Position of this tier in [`PriceTier::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::FirstClass => 0,
            Self::Seated => 1,
            Self::Reserved => 2,
            Self::Compartment => 3,
        }
    }

    /// Seat classes sold under this tier.
    pub const fn classes(self) -> &'static [SeatClass] {
        match self {
            Self::FirstClass => &[SeatClass::FirstClass],
            Self::Seated => &[SeatClass::Seated],
            Self::Reserved => &[
                SeatClass::ReservedLower,
                SeatClass::ReservedUpper,
                SeatClass::ReservedSideLower,
                SeatClass::ReservedSideUpper,
            ],
            Self::Compartment => &[SeatClass::CompartmentUpper, SeatClass::CompartmentLower],
        }
    }

    /// Human label used in alerts.
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstClass => "SV",
            Self::Seated => "Seated",
            Self::Reserved => "Platzkart",
            Self::Compartment => "Kupe",
        }
    }
}

/// Compact set of enabled seat classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatClassSet {
    bits: u8,
}

impl SeatClassSet {
    /// Set with no classes enabled.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Set with every class enabled (the default for a new tracking).
    pub const fn all() -> Self {
        Self { bits: u8::MAX }
    }

    /// Build a set from a list of classes.
    pub fn of(classes: &[SeatClass]) -> Self {
        classes.iter().fold(Self::empty(), |set, class| set.with(*class))
    }

    /// Return a copy with `class` enabled.
    #[must_use]
    pub const fn with(self, class: SeatClass) -> Self {
        Self {
            bits: self.bits | (1 << class.index()),
        }
    }

    /// Return a copy with `class` disabled.
    #[must_use]
    pub const fn without(self, class: SeatClass) -> Self {
        Self {
            bits: self.bits & !(1 << class.index()),
        }
    }

    /// Whether `class` is enabled.
    pub const fn contains(self, class: SeatClass) -> bool {
        self.bits & (1 << class.index()) != 0
    }

    /// Whether no class is enabled.
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Iterate the enabled classes in display order.
    pub fn iter(self) -> impl Iterator<Item = SeatClass> {
        SeatClass::ALL.into_iter().filter(move |class| self.contains(*class))
    }
}

impl Default for SeatClassSet {
    fn default() -> Self {
        Self::all()
    }
}

/// Price and seat-class criteria a tracking matches inventory against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatCriteria {
    /// Maximum acceptable minimum price; `None` means no price constraint.
    pub max_price: Option<f64>,
    /// Seat classes the user is interested in.
    pub seat_classes: SeatClassSet,
}

impl Default for SeatCriteria {
    fn default() -> Self {
        Self {
            max_price: None,
            seat_classes: SeatClassSet::all(),
        }
    }
}

/// Station as known to the inventory source and the ticket site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Express code used by the inventory lookup.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Code used in ticket-site links.
    pub site_code: String,
}

impl Station {
    /// Create a station whose site code equals its express code.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            site_code: code.clone(),
            code,
            name: name.into(),
        }
    }
}

/// A user's standing subscription for one route, date and seat/price combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracking {
    /// Tracking identifier.
    pub id: TrackingId,
    /// Owning user.
    pub user_id: UserId,
    /// Departure station.
    pub origin: Station,
    /// Arrival station.
    pub destination: Station,
    /// Travel date.
    pub date: NaiveDate,
    /// Matching criteria.
    pub criteria: SeatCriteria,
    /// Not finished.
    pub active: bool,
    /// Owner is not banned and has non-expired access.
    pub eligible: bool,
    /// Set once, when the first alert for this tracking was delivered.
    pub first_notification_sent_at: Option<DateTime<Utc>>,
    /// When the tracking was finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Tracking {
    /// Create an active, eligible tracking with every seat class enabled.
    pub fn new(
        id: TrackingId,
        user_id: UserId,
        origin: Station,
        destination: Station,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            user_id,
            origin,
            destination,
            date,
            criteria: SeatCriteria::default(),
            active: true,
            eligible: true,
            first_notification_sent_at: None,
            finished_at: None,
            created_at: Utc::now(),
        }
    }

    /// Set the price ceiling.
    #[must_use]
    pub fn with_max_price(mut self, max_price: Option<f64>) -> Self {
        self.criteria.max_price = max_price;
        self
    }

    /// Replace the enabled seat classes.
    #[must_use]
    pub fn with_seat_classes(mut self, seat_classes: SeatClassSet) -> Self {
        self.criteria.seat_classes = seat_classes;
        self
    }

    /// Whether the scheduler should keep this tracking in rotation.
    pub const fn is_pollable(&self) -> bool {
        self.active && self.eligible
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &TrackingPatch) {
        if let Some(at) = patch.first_notification_sent_at {
            self.first_notification_sent_at = Some(at);
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(at) = patch.finished_at {
            self.finished_at = Some(at);
        }
    }
}

/// Partial update written back to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingPatch {
    /// Stamp for the first delivered alert.
    pub first_notification_sent_at: Option<DateTime<Utc>>,
    /// New lifecycle flag.
    pub active: Option<bool>,
    /// Finish timestamp.
    pub finished_at: Option<DateTime<Utc>>,
}

impl TrackingPatch {
    /// Patch stamping the first delivered alert.
    pub fn first_notification(at: DateTime<Utc>) -> Self {
        Self {
            first_notification_sent_at: Some(at),
            ..Self::default()
        }
    }

    /// Patch finishing a tracking.
    pub fn finish(at: DateTime<Utc>) -> Self {
        Self {
            active: Some(false),
            finished_at: Some(at),
            ..Self::default()
        }
    }
}

/// Reference to a delivered message, used later for threaded replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageRef(pub i64);

/// Append-only record of a delivered alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Tracking the alert belongs to.
    pub tracking_id: TrackingId,
    /// Recipient.
    pub user_id: UserId,
    /// Delivery time; the cooldown key.
    pub created_at: DateTime<Utc>,
    /// Delivered message.
    pub message: MessageRef,
    /// First matched train, for display.
    pub train_number: Option<String>,
}
