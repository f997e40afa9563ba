//! Listing types

use super::RemainingTime;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable numeric identifier of a marketplace listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub u64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ListingId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Category the listing is filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub id: i64,
    /// Leaf category name
    pub name: String,
    /// Parent path joined with " > "
    pub path: String,
}

/// Most recent bid on a listing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecentBid {
    pub bidder_name: Option<String>,
    pub amount: Option<Decimal>,
    pub bid_date: Option<String>,
}

/// Immutable view of a listing at the time it was fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingSnapshot {
    pub id: ListingId,
    pub title: String,
    pub current_price: Decimal,
    pub remaining: RemainingTime,
    /// Auction end as reported by the marketplace (local marketplace time)
    pub end_time: Option<NaiveDateTime>,
    pub category: Option<CategoryInfo>,
    pub recent_bid: Option<RecentBid>,
    pub url: String,
}

impl ListingSnapshot {
    /// Whether the auction has concluded
    pub fn is_ended(&self) -> bool {
        self.remaining.is_ended()
    }
}

/// Errors raised by a listing lookup
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The endpoint answered with a non-success status
    #[error("Listing API error: {status} - {body}")]
    Status { status: u16, body: String },
    /// The payload did not match the item-detail schema
    #[error("Malformed listing payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
