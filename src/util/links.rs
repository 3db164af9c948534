//! Links to the ticket site and back into the bot.

use chrono::NaiveDate;

use crate::core::TrackingId;

/// Base URL of the ticket site.
pub const TICKET_SITE: &str = "https://ticket.rzd.ru";

/// Search results page for a route and date.
pub fn search_results_url(from_site_code: &str, to_site_code: &str, date: NaiveDate) -> String {
    format!(
        "{TICKET_SITE}/searchresults/v/1/{from_site_code}/{to_site_code}/{}",
        date.format("%Y-%m-%d")
    )
}

/// Deep link that opens the bot with a request to copy a finished tracking.
pub fn copy_tracking_link(bot_username: &str, tracking_id: TrackingId) -> String {
    format!("https://t.me/{bot_username}?start=tracking_copy_{tracking_id}")
}
