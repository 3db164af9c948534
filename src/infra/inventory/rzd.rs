//! Ticket site TrainPricing adapter.
//!
//! One lookup is one `TrainPricing` POST for a route and date. Car groups are
//! folded into per-class seat counts and per-tier minimum prices.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER};
use serde::Deserialize;
use serde_json::json;

use crate::config::InventoryConfig;
use crate::core::{InventoryError, InventoryRecord, InventorySource, PriceTier, SeatClass};
use crate::util::{truncate, LOG_PAYLOAD_LIMIT};

/// Path of the pricing endpoint, relative to the API root.
pub const TRAIN_PRICING_PATH: &str = "/apib2b/p/Railway/V1/Search/TrainPricing?service_provider=B2B_RZD";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PricingResponse {
    trains: Vec<TrainJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrainJson {
    display_train_number: String,
    departure_date_time: NaiveDateTime,
    arrival_date_time: NaiveDateTime,
    #[serde(default)]
    origin_name: String,
    #[serde(default)]
    destination_name: String,
    #[serde(default)]
    car_groups: Vec<CarGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CarGroup {
    car_type_name: String,
    #[serde(default)]
    total_place_quantity: u32,
    #[serde(default)]
    place_quantity: u32,
    lower_place_quantity: Option<u32>,
    upper_place_quantity: Option<u32>,
    lower_side_place_quantity: Option<u32>,
    upper_side_place_quantity: Option<u32>,
    min_price: Option<f64>,
}

impl CarGroup {
    /// Berth breakdown, or the total counted as lower berths when the group has none.
    fn berths(&self, classes: &[(SeatClass, Option<u32>)]) -> Vec<(SeatClass, u32)> {
        match classes.first() {
            Some(&(lower, _)) if classes.iter().all(|(_, n)| n.is_none()) => vec![(lower, self.total_place_quantity)],
            _ => classes.iter().map(|&(class, n)| (class, n.unwrap_or(0))).collect(),
        }
    }

    fn fold_into(&self, record: &mut InventoryRecord) {
        let (tier, seats) = match self.car_type_name.trim() {
            "СВ" | "ЛЮКС" => (
                PriceTier::FirstClass,
                vec![(SeatClass::FirstClass, self.total_place_quantity)],
            ),
            "СИД" => (PriceTier::Seated, vec![(SeatClass::Seated, self.place_quantity)]),
            "ПЛАЦ" => (
                PriceTier::Reserved,
                self.berths(&[
                    (SeatClass::ReservedLower, self.lower_place_quantity),
                    (SeatClass::ReservedUpper, self.upper_place_quantity),
                    (SeatClass::ReservedSideLower, self.lower_side_place_quantity),
                    (SeatClass::ReservedSideUpper, self.upper_side_place_quantity),
                ]),
            ),
            "КУПЕ" => (
                PriceTier::Compartment,
                self.berths(&[
                    (SeatClass::CompartmentLower, self.lower_place_quantity),
                    (SeatClass::CompartmentUpper, self.upper_place_quantity),
                ]),
            ),
            _ => return,
        };
        for (class, count) in seats {
            record.add_seats(class, count);
        }
        if let Some(price) = self.min_price {
            record.offer_price(tier, price);
        }
    }
}

/// Decode a TrainPricing response body into inventory records, one per train.
///
/// Car types outside the four tiers (e.g. general seating) are ignored.
pub fn parse_train_pricing(body: &str) -> Result<Vec<InventoryRecord>, InventoryError> {
    let response: PricingResponse = serde_json::from_str(body).map_err(|e| InventoryError::Malformed {
        reason: e.to_string(),
        payload: truncate(body, LOG_PAYLOAD_LIMIT),
    })?;

    Ok(response
        .trains
        .into_iter()
        .map(|train| {
            let mut record = InventoryRecord::new(
                train.display_train_number,
                train.departure_date_time,
                train.arrival_date_time,
            )
            .with_route(train.origin_name, train.destination_name);
            for group in &train.car_groups {
                group.fold_into(&mut record);
            }
            record
        })
        .collect())
}

fn request_body(origin: &str, destination: &str, date: NaiveDate) -> serde_json::Value {
    json!({
        "Origin": origin,
        "Destination": destination,
        "DepartureDate": date.format("%Y-%m-%dT00:00:00").to_string(),
        "TimeFrom": 0,
        "TimeTo": 24,
        "CarGrouping": "DontGroup",
        "GetByLocalTime": true,
        "SpecialPlacesDemand": "StandardPlacesAndForDisabledPersons",
        "CarIssuingType": "PassengersAndBaggage",
    })
}

/// Live inventory source backed by the ticket site.
#[derive(Debug, Clone)]
pub struct RzdInventorySource {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RzdInventorySource {
    /// Build the HTTP client from adapter configuration.
    pub fn from_config(cfg: &InventoryConfig) -> Result<Self, InventoryError> {
        let base = cfg.base_url.trim_end_matches('/');
        let site = HeaderValue::from_str(base)
            .map_err(|e| InventoryError::Transport(format!("invalid base_url header value: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, site.clone());
        headers.insert(REFERER, site);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("seatwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| InventoryError::Transport(format!("http client: {e}")))?;

        Ok(Self {
            endpoint: format!("{base}{TRAIN_PRICING_PATH}"),
            timeout: cfg.request_timeout(),
            client,
        })
    }

    fn classify(&self, err: &reqwest::Error) -> InventoryError {
        if err.is_timeout() {
            InventoryError::Timeout(self.timeout)
        } else {
            InventoryError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl InventorySource for RzdInventorySource {
    async fn lookup(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<InventoryRecord>, InventoryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body(origin, destination, date))
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(&e))?;
        if !status.is_success() {
            return Err(InventoryError::Transport(format!(
                "ticket site returned {status}: {}",
                truncate(&body, LOG_PAYLOAD_LIMIT)
            )));
        }

        tracing::debug!(origin, destination, %date, bytes = body.len(), "train pricing fetched");
        parse_train_pricing(&body)
    }
}
