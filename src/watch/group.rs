//! Per-subscriber watch group
//!
//! A group owns every entry watched by one subscriber and runs a single
//! background loop for all of them. Each cycle re-fetches only the entries
//! whose own interval has elapsed, then sleeps until the earliest entry falls
//! due, never longer than the shortest interval in the group. Adding an entry
//! wakes the sleep early so a faster cadence takes effect immediately.
//!
//! Lock order is registry map first, then group state. The loop never holds
//! a lock across a fetch or while delivering events. Cancelling the last
//! entry detaches the loop instead of aborting it, so events it already
//! collected are still delivered before it exits.

use super::entry::{EntryState, PollOutcome, WatchEntry};
use super::registry::RegistryInner;
use super::{IntervalPolicy, SubscriberId, WatchError, WatchEvent};
use crate::listing::{ListingId, ListingSnapshot, TransportError};
use crate::telemetry::{
    adjust_gauge, increment_counter, record_latency, set_gauge, CounterMetric, GaugeMetric,
    LatencyMetric,
};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct GroupState {
    /// Insertion order
    entries: Vec<WatchEntry>,
    /// Present iff `entries` is non-empty
    task: Option<JoinHandle<()>>,
}

impl GroupState {
    fn position(&self, id: ListingId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    fn group_interval(&self) -> Option<Duration> {
        self.entries.iter().map(WatchEntry::interval).min()
    }

    /// Time until the earliest active entry falls due, capped at the group
    /// interval. `None` when there are no entries.
    fn next_wake(&self, now: Instant) -> Option<Duration> {
        let interval = self.group_interval()?;
        let until_due = self
            .entries
            .iter()
            .filter(|e| e.state() == EntryState::Active)
            .map(|e| e.next_poll().saturating_duration_since(now))
            .min()
            .unwrap_or(interval);
        Some(until_due.min(interval))
    }

    /// Release the loop without aborting it; a loop that finds the group
    /// empty exits on its own
    fn detach_task(&mut self) {
        self.task = None;
    }
}

/// All watches of one subscriber, polled by one background task
pub struct WatchGroup {
    subscriber: SubscriberId,
    policy: IntervalPolicy,
    state: Mutex<GroupState>,
    wake: Notify,
}

/// Result of inserting a snapshot into a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AddOutcome {
    Inserted,
    /// Listing was already tracked; its snapshot was replaced in place
    Replaced,
}

impl WatchGroup {
    pub(super) fn new(subscriber: SubscriberId, policy: IntervalPolicy) -> Self {
        Self {
            subscriber,
            policy,
            state: Mutex::new(GroupState {
                entries: Vec::new(),
                task: None,
            }),
            wake: Notify::new(),
        }
    }

    pub fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }

    pub async fn contains(&self, id: ListingId) -> bool {
        self.state.lock().await.position(id).is_some()
    }

    /// Whether the background loop is alive
    pub async fn is_running(&self) -> bool {
        self.state
            .lock()
            .await
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Shortest interval across all entries
    pub async fn interval(&self) -> Option<Duration> {
        self.state.lock().await.group_interval()
    }

    /// Copy of the current entries, in insertion order
    pub async fn entries(&self) -> Vec<WatchEntry> {
        self.state.lock().await.entries.clone()
    }

    pub async fn snapshot(&self, id: ListingId) -> Option<ListingSnapshot> {
        let state = self.state.lock().await;
        state
            .position(id)
            .map(|pos| state.entries[pos].snapshot().clone())
    }

    pub async fn snapshots(&self) -> Vec<ListingSnapshot> {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .map(|e| e.snapshot().clone())
            .collect()
    }

    /// Insert or replace an entry, then start the loop or wake it.
    ///
    /// Caller holds the registry map lock.
    pub(super) async fn add_entry(
        self: &Arc<Self>,
        snapshot: ListingSnapshot,
        registry: Weak<RegistryInner>,
    ) -> AddOutcome {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let id = snapshot.id;

        let outcome = match state.position(id) {
            Some(pos) => {
                state.entries[pos].refresh(snapshot, &self.policy, now);
                AddOutcome::Replaced
            }
            None => {
                state.entries.push(WatchEntry::new(snapshot, &self.policy, now));
                adjust_gauge(GaugeMetric::WatchedListings, 1.0);
                AddOutcome::Inserted
            }
        };

        let running = state.task.as_ref().is_some_and(|task| !task.is_finished());
        if running {
            self.wake.notify_one();
        } else {
            state.task = Some(tokio::spawn(Self::run(Arc::clone(self), registry)));
        }

        tracing::debug!(
            subscriber = %self.subscriber,
            listing = %id,
            entries = state.entries.len(),
            ?outcome,
            "Watch entry added"
        );

        outcome
    }

    /// Remove an entry on explicit cancellation.
    ///
    /// Releases the loop when the last entry goes; the caller then
    /// deregisters the group. Caller holds the registry map lock.
    pub(super) async fn remove_entry(
        &self,
        id: ListingId,
    ) -> Result<ListingSnapshot, WatchError> {
        let mut state = self.state.lock().await;

        let pos = state.position(id).ok_or(WatchError::NotWatching {
            subscriber: self.subscriber,
            listing: id,
        })?;

        let entry = state.entries.remove(pos);
        adjust_gauge(GaugeMetric::WatchedListings, -1.0);

        if state.entries.is_empty() {
            state.detach_task();
            self.wake.notify_one();
        }

        Ok(entry.into_snapshot())
    }

    /// Stop the loop if the group has no entries. Returns true if stopped.
    pub(super) async fn stop_if_empty(&self) -> bool {
        let mut state = self.state.lock().await;
        if !state.entries.is_empty() {
            return false;
        }
        state.detach_task();
        self.wake.notify_one();
        true
    }

    /// Stop the loop and drop every entry
    pub(super) async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        adjust_gauge(GaugeMetric::WatchedListings, -(state.entries.len() as f64));
        state.entries.clear();
    }

    /// Remove this group from the registry map if it is still the registered one
    fn deregister(&self, groups: &mut HashMap<SubscriberId, Arc<WatchGroup>>) {
        let registered = groups
            .get(&self.subscriber)
            .is_some_and(|g| std::ptr::eq(g.as_ref(), self));
        if registered {
            groups.remove(&self.subscriber);
        }
        set_gauge(GaugeMetric::ActiveGroups, groups.len() as f64);
    }

    /// Background loop: one cycle, then sleep for the group interval or
    /// until woken by a new entry
    async fn run(group: Arc<Self>, registry: Weak<RegistryInner>) {
        tracing::info!(subscriber = %group.subscriber, "Watch group started");

        while let Some(interval) = group.run_cycle(&registry).await {
            tracing::debug!(
                subscriber = %group.subscriber,
                sleep_secs = interval.as_secs(),
                "Watch group sleeping"
            );

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = group.wake.notified() => {
                    tracing::debug!(subscriber = %group.subscriber, "Watch group woken early");
                }
            }
        }

        tracing::info!(subscriber = %group.subscriber, "Watch group stopped");
    }

    /// Run one cycle. Returns the sleep before the next cycle, or `None`
    /// once the group has emptied and deregistered.
    async fn run_cycle(&self, registry: &Weak<RegistryInner>) -> Option<Duration> {
        let started = Instant::now();

        let due: Vec<ListingId> = {
            let state = self.state.lock().await;
            if state.entries.is_empty() {
                // cancelled from outside, already deregistered
                return None;
            }

            let due: Vec<ListingId> = state
                .entries
                .iter()
                .filter(|e| e.is_due(started))
                .map(WatchEntry::id)
                .collect();

            if due.is_empty() {
                return state.next_wake(started);
            }
            due
        };

        // Registry dropped: nobody is left to deliver events to
        let registry = registry.upgrade()?;

        let mut results = Vec::with_capacity(due.len());
        for id in due {
            let result = registry.fetcher.fetch(id).await;
            results.push((id, result));
        }

        let (events, retired) = self.apply_results(&registry, results).await;

        for event in events {
            registry.emit(event).await;
        }

        record_latency(LatencyMetric::Cycle, started.elapsed());

        if retired {
            return None;
        }
        // entries may have been cancelled while events were delivered
        self.state.lock().await.next_wake(Instant::now())
    }

    /// Apply fetch results in insertion order and retire expired entries.
    /// Returns the events to deliver and whether the group emptied and was
    /// deregistered.
    async fn apply_results(
        &self,
        registry: &RegistryInner,
        results: Vec<(ListingId, Result<ListingSnapshot, TransportError>)>,
    ) -> (Vec<WatchEvent>, bool) {
        let mut groups = registry.groups.lock().await;
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let mut events = Vec::new();

        for (id, result) in results {
            let Some(pos) = state.position(id) else {
                tracing::debug!(
                    subscriber = %self.subscriber,
                    listing = %id,
                    "Listing unwatched during poll, dropping result"
                );
                continue;
            };

            let snapshot = match result {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    increment_counter(CounterMetric::PollFailed);
                    let failures = state.entries[pos].record_failure(now);
                    tracing::warn!(
                        subscriber = %self.subscriber,
                        listing = %id,
                        failures,
                        error = %e,
                        "Listing poll failed, keeping previous snapshot"
                    );
                    continue;
                }
            };

            increment_counter(CounterMetric::PollSucceeded);

            match state.entries[pos].apply(snapshot, &self.policy, now) {
                PollOutcome::Unchanged => {
                    tracing::debug!(
                        subscriber = %self.subscriber,
                        listing = %id,
                        "Listing unchanged"
                    );
                }
                PollOutcome::Changed => {
                    increment_counter(CounterMetric::ChangeEvent);
                    let snapshot = state.entries[pos].snapshot().clone();
                    tracing::info!(
                        subscriber = %self.subscriber,
                        listing = %id,
                        price = %snapshot.current_price,
                        remaining = %snapshot.remaining,
                        "Listing price changed"
                    );
                    events.push(WatchEvent::Changed {
                        subscriber: self.subscriber,
                        snapshot,
                    });
                }
                PollOutcome::Ended => {
                    increment_counter(CounterMetric::EndedEvent);
                    adjust_gauge(GaugeMetric::WatchedListings, -1.0);
                    let snapshot = state.entries.remove(pos).into_snapshot();
                    tracing::info!(
                        subscriber = %self.subscriber,
                        listing = %id,
                        final_price = %snapshot.current_price,
                        "Auction ended, watch retired"
                    );
                    events.push(WatchEvent::Ended {
                        subscriber: self.subscriber,
                        snapshot,
                    });
                }
            }
        }

        if state.entries.is_empty() {
            // own handle: the task exits after delivering this cycle's events
            state.detach_task();
            self.deregister(&mut groups);
            return (events, true);
        }

        (events, false)
    }
}

impl std::fmt::Debug for WatchGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchGroup")
            .field("subscriber", &self.subscriber)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
