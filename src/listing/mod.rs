//! Listing lookup
//!
//! Normalized listing snapshots and the remote item-detail client that
//! produces them.

mod client;
mod remaining;
mod types;

pub use client::{ListingClient, ListingClientConfig, API_BASE_URL, ITEM_URL_BASE};
pub use remaining::RemainingTime;
pub use types::{CategoryInfo, ListingId, ListingSnapshot, RecentBid, TransportError};

use async_trait::async_trait;

/// Trait for single-listing lookups
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    /// Fetch the current state of one listing
    async fn fetch(&self, id: ListingId) -> Result<ListingSnapshot, TransportError>;
}
