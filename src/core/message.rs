//! HTML message bodies sent to users.

use std::fmt::Write;

use super::filter::{matching_tiers, SeatThreshold};
use super::{InventoryRecord, Tracking};
use crate::util::{copy_tracking_link, escape_html, search_results_url};

/// Most departures listed in one alert.
pub const MAX_LISTED_TRAINS: usize = 10;

fn route_line(tracking: &Tracking) -> String {
    format!(
        "{} → {}, {}",
        escape_html(&tracking.origin.name),
        escape_html(&tracking.destination.name),
        tracking.date.format("%d.%m.%Y")
    )
}

/// Alert for departures that matched a tracking.
pub fn render_alert(tracking: &Tracking, matches: &[InventoryRecord], threshold: SeatThreshold) -> String {
    let mut text = format!(
        "<b>🚆 Tracking #{}: seats available</b>\n{}\n\n",
        tracking.id,
        route_line(tracking)
    );

    for record in matches.iter().take(MAX_LISTED_TRAINS) {
        let _ = writeln!(
            text,
            "<b>№{}</b> {} → {}",
            escape_html(&record.train_number),
            record.departure.format("%H:%M"),
            record.arrival.format("%H:%M"),
        );
        for tier in matching_tiers(record, &tracking.criteria, threshold) {
            let price = tier
                .min_price
                .map_or_else(|| "price n/a".to_string(), |p| format!("from {p:.0} ₽"));
            let _ = writeln!(text, "  {}: {} seats, {}", tier.tier.label(), tier.seats, price);
        }
    }
    if matches.len() > MAX_LISTED_TRAINS {
        let _ = writeln!(text, "…and {} more", matches.len() - MAX_LISTED_TRAINS);
    }

    let _ = write!(
        text,
        "\n<a href=\"{}\">Open search results</a>",
        search_results_url(&tracking.origin.site_code, &tracking.destination.site_code, tracking.date)
    );
    text
}

/// Notice that a tracking was closed after its alert went unanswered.
pub fn render_closed(tracking: &Tracking, bot_username: Option<&str>) -> String {
    let mut text = format!(
        "<b>📕 Tracking #{}</b> was switched off\n\n<b>ℹ️ Tracking details:</b>\n{}",
        tracking.id,
        route_line(tracking)
    );
    if let Some(bot) = bot_username {
        let _ = write!(
            text,
            "\n\nYou can <a href=\"{}\">create it again with the same details</a>",
            copy_tracking_link(bot, tracking.id)
        );
    }
    text
}
