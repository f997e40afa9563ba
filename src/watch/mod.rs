//! Watch-list scheduler
//!
//! Tracks auction listings per subscriber, re-polls each one at a cadence
//! derived from its remaining time, and emits [`WatchEvent`]s when a price
//! changes or an auction ends.

mod entry;
mod group;
mod policy;
mod registry;
mod types;

pub use entry::{EntryState, PollOutcome, WatchEntry};
pub use group::WatchGroup;
pub use policy::{
    poll_interval, IntervalPolicy, DEFAULT_NO_COUNTDOWN_INTERVAL_SECS, MIN_INTERVAL_SECS,
};
pub use registry::Registry;
pub use types::{SubscriberId, WatchError, WatchEvent};
