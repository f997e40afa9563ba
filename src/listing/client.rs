//! Item-detail API client
//!
//! Looks up a single listing by identifier and normalizes the camelCase
//! payload into a [`ListingSnapshot`]. Required fields (`itemId`, `title`,
//! `currentPrice`) must be present; everything else degrades to a default.

use super::{
    CategoryInfo, ListingFetcher, ListingId, ListingSnapshot, RecentBid, RemainingTime,
    TransportError,
};
use crate::telemetry::{record_latency, LatencyMetric};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Listing API base URL
pub const API_BASE_URL: &str = "https://buyerapi.shopgoodwill.com/api";

/// Public listing page base URL
pub const ITEM_URL_BASE: &str = "https://shopgoodwill.com/item";

const ITEM_DETAIL_PATH: &str = "ItemDetail/GetItemDetailModelByItemId";

/// Configuration for the listing client
#[derive(Debug, Clone)]
pub struct ListingClientConfig {
    /// Base URL for the listing API
    pub base_url: String,
    /// Base URL used to build public listing links
    pub item_url_base: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ListingClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            item_url_base: ITEM_URL_BASE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the marketplace item-detail endpoint
pub struct ListingClient {
    config: ListingClientConfig,
    client: Client,
}

impl ListingClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(ListingClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ListingClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn detail_url(&self, id: ListingId) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            ITEM_DETAIL_PATH,
            id
        )
    }

    /// Decode an item-detail payload
    pub fn parse_snapshot(&self, body: &[u8]) -> Result<ListingSnapshot, TransportError> {
        let detail: ItemDetail = serde_json::from_slice(body)?;
        Ok(detail.into_snapshot(&self.config.item_url_base))
    }
}

#[async_trait]
impl ListingFetcher for ListingClient {
    async fn fetch(&self, id: ListingId) -> Result<ListingSnapshot, TransportError> {
        let url = self.detail_url(id);
        tracing::debug!(url = %url, listing = %id, "Fetching listing detail");

        let started = Instant::now();
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = response.bytes().await?;
        record_latency(LatencyMetric::Fetch, started.elapsed());

        self.parse_snapshot(&body)
    }
}

/// Raw item-detail response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemDetail {
    item_id: u64,
    title: String,
    current_price: Decimal,
    #[serde(default)]
    remaining_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    category_id: Option<i64>,
    #[serde(default)]
    category_parent_list: Option<String>,
    #[serde(default)]
    bid_history: Option<BidHistory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BidHistory {
    #[serde(default)]
    bid_summary: Vec<RecentBid>,
}

impl ItemDetail {
    fn into_snapshot(self, item_url_base: &str) -> ListingSnapshot {
        let id = ListingId(self.item_id);

        let category = match (self.category_id, self.category_parent_list.as_deref()) {
            (Some(cat_id), Some(list)) => Some(parse_category(cat_id, list)),
            _ => None,
        };

        ListingSnapshot {
            id,
            title: self.title,
            current_price: self.current_price,
            remaining: RemainingTime::parse(self.remaining_time.as_deref().unwrap_or_default()),
            end_time: self.end_time.as_deref().and_then(parse_end_time),
            category,
            recent_bid: self
                .bid_history
                .and_then(|h| h.bid_summary.into_iter().next()),
            url: format!("{}/{}", item_url_base.trim_end_matches('/'), id),
        }
    }
}

/// Parse a `|`-separated category list such as `"10|Collectibles|27|Coins"`
fn parse_category(id: i64, list: &str) -> CategoryInfo {
    let names: Vec<&str> = list
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with(|c: char| c.is_ascii_digit()))
        .collect();

    CategoryInfo {
        id,
        name: names.last().copied().unwrap_or_default().to_string(),
        path: names.join(" > "),
    }
}

/// Parse an ISO 8601 end time, with or without an offset
fn parse_end_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
}
