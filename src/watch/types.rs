//! Watch scheduler types

use crate::listing::{ListingId, ListingSnapshot, TransportError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// External identity on whose behalf watches are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SubscriberId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Event delivered to the rendering collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    /// Current price moved since the previous poll
    Changed {
        subscriber: SubscriberId,
        snapshot: ListingSnapshot,
    },
    /// Auction concluded; the snapshot carries the final price
    Ended {
        subscriber: SubscriberId,
        snapshot: ListingSnapshot,
    },
}

impl WatchEvent {
    pub fn subscriber(&self) -> SubscriberId {
        match self {
            Self::Changed { subscriber, .. } | Self::Ended { subscriber, .. } => *subscriber,
        }
    }

    pub fn snapshot(&self) -> &ListingSnapshot {
        match self {
            Self::Changed { snapshot, .. } | Self::Ended { snapshot, .. } => snapshot,
        }
    }

    /// Whether this is the last event for the listing
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }
}

/// Errors surfaced to watch/unwatch callers
#[derive(Debug, Error)]
pub enum WatchError {
    /// Initial lookup of the listing failed
    #[error("Failed to fetch listing {listing}: {source}")]
    Transport {
        listing: ListingId,
        #[source]
        source: TransportError,
    },
    /// Removal requested for a listing the subscriber does not watch
    #[error("Listing {listing} is not being watched by {subscriber}")]
    NotWatching {
        subscriber: SubscriberId,
        listing: ListingId,
    },
    /// Watch requested for a listing whose auction is already over
    #[error("Listing {} has already ended", .0.id)]
    ListingEnded(Box<ListingSnapshot>),
}
