//! A single watched listing

use super::IntervalPolicy;
use crate::listing::{ListingId, ListingSnapshot};
use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle of a watch entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Active,
    /// Terminal: the auction has concluded
    Expired,
}

/// Result of applying a fresh snapshot to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Unchanged,
    /// Current price differs from the previous snapshot
    Changed,
    /// Remaining time reached zero; the entry is now expired
    Ended,
}

/// One tracked listing with its own poll cadence
#[derive(Debug, Clone)]
pub struct WatchEntry {
    snapshot: ListingSnapshot,
    interval_secs: u64,
    last_poll: Instant,
    next_poll: Instant,
    state: EntryState,
    consecutive_failures: u32,
}

impl WatchEntry {
    /// Create an active entry from its initial snapshot
    pub fn new(snapshot: ListingSnapshot, policy: &IntervalPolicy, now: Instant) -> Self {
        let interval_secs = policy.interval_for(&snapshot.remaining);
        Self {
            snapshot,
            interval_secs,
            last_poll: now,
            next_poll: now + Duration::from_secs(interval_secs),
            state: EntryState::Active,
            consecutive_failures: 0,
        }
    }

    pub fn id(&self) -> ListingId {
        self.snapshot.id
    }

    pub fn snapshot(&self) -> &ListingSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> ListingSnapshot {
        self.snapshot
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Time of the last successful poll
    pub fn last_poll(&self) -> Instant {
        self.last_poll
    }

    /// Earliest time the entry is due again
    pub fn next_poll(&self) -> Instant {
        self.next_poll
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether the entry's own interval has elapsed since its last poll
    /// attempt
    pub fn is_due(&self, now: Instant) -> bool {
        self.state == EntryState::Active && now >= self.next_poll
    }

    /// Apply a freshly fetched snapshot
    pub fn apply(
        &mut self,
        snapshot: ListingSnapshot,
        policy: &IntervalPolicy,
        now: Instant,
    ) -> PollOutcome {
        if self.state == EntryState::Expired {
            // terminal, nothing to report
            return PollOutcome::Unchanged;
        }

        let changed = snapshot.current_price != self.snapshot.current_price;
        let ended = snapshot.is_ended();

        self.snapshot = snapshot;
        self.last_poll = now;
        self.consecutive_failures = 0;

        if ended {
            self.state = EntryState::Expired;
            return PollOutcome::Ended;
        }

        self.interval_secs = policy.interval_for(&self.snapshot.remaining);
        self.next_poll = now + self.interval();

        if changed {
            PollOutcome::Changed
        } else {
            PollOutcome::Unchanged
        }
    }

    /// Replace the snapshot without reporting a change (re-watch race)
    pub(crate) fn refresh(
        &mut self,
        snapshot: ListingSnapshot,
        policy: &IntervalPolicy,
        now: Instant,
    ) {
        *self = Self::new(snapshot, policy, now);
    }

    /// Record a failed poll; the previous snapshot is kept and the entry is
    /// retried one interval later
    pub fn record_failure(&mut self, now: Instant) -> u32 {
        self.next_poll = now + self.interval();
        self.consecutive_failures += 1;
        self.consecutive_failures
    }
}
