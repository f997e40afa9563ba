//! Subscriber registry
//!
//! Maps each subscriber to its [`WatchGroup`]. Groups are created on the
//! first watch and removed as soon as they have no entries left, whether the
//! last entry was cancelled or its auction ended.

use super::group::AddOutcome;
use super::{IntervalPolicy, SubscriberId, WatchError, WatchEvent, WatchGroup};
use crate::config::WatchConfig;
use crate::listing::{ListingFetcher, ListingId, ListingSnapshot};
use crate::telemetry::{set_gauge, GaugeMetric};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

pub(super) struct RegistryInner {
    pub(super) groups: Mutex<HashMap<SubscriberId, Arc<WatchGroup>>>,
    pub(super) fetcher: Arc<dyn ListingFetcher>,
    events: mpsc::Sender<WatchEvent>,
    policy: IntervalPolicy,
}

impl RegistryInner {
    pub(super) async fn emit(&self, event: WatchEvent) {
        let listing = event.snapshot().id;
        if self.events.send(event).await.is_err() {
            tracing::warn!(listing = %listing, "Event receiver dropped, discarding event");
        }
    }
}

/// Process-wide watch service
///
/// Cheap to clone; clones share the same groups.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Create a registry and the receiver its change/ended events are
    /// delivered to
    pub fn new(
        fetcher: Arc<dyn ListingFetcher>,
        config: &WatchConfig,
    ) -> (Self, mpsc::Receiver<WatchEvent>) {
        let (events, rx) = mpsc::channel(config.event_buffer.max(1));

        let inner = RegistryInner {
            groups: Mutex::new(HashMap::new()),
            fetcher,
            events,
            policy: IntervalPolicy::new(config.no_countdown_interval_secs),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    /// Start watching a listing for a subscriber.
    ///
    /// Watching a listing that is already tracked is a no-op returning the
    /// current snapshot. Otherwise the listing is fetched once before it is
    /// tracked, and that initial snapshot is returned.
    pub async fn watch(
        &self,
        subscriber: SubscriberId,
        listing: ListingId,
    ) -> Result<ListingSnapshot, WatchError> {
        if let Some(group) = self.group(subscriber).await {
            if let Some(snapshot) = group.snapshot(listing).await {
                tracing::debug!(%subscriber, %listing, "Listing already watched");
                return Ok(snapshot);
            }
        }

        let snapshot = self
            .inner
            .fetcher
            .fetch(listing)
            .await
            .map_err(|source| WatchError::Transport { listing, source })?;

        if snapshot.is_ended() {
            return Err(WatchError::ListingEnded(Box::new(snapshot)));
        }

        let mut groups = self.inner.groups.lock().await;
        let group = self.get_or_create_locked(&mut groups, subscriber);
        let outcome = group
            .add_entry(snapshot.clone(), Arc::downgrade(&self.inner))
            .await;

        if outcome == AddOutcome::Inserted {
            tracing::info!(
                %subscriber,
                %listing,
                price = %snapshot.current_price,
                remaining = %snapshot.remaining,
                "Watching listing"
            );
        }

        Ok(snapshot)
    }

    /// Stop watching a listing. Returns the last known snapshot.
    pub async fn unwatch(
        &self,
        subscriber: SubscriberId,
        listing: ListingId,
    ) -> Result<ListingSnapshot, WatchError> {
        let mut groups = self.inner.groups.lock().await;

        let group = groups
            .get(&subscriber)
            .cloned()
            .ok_or(WatchError::NotWatching {
                subscriber,
                listing,
            })?;

        let snapshot = group.remove_entry(listing).await?;
        tracing::info!(%subscriber, %listing, "Stopped watching listing");

        Self::drop_group_if_empty(&mut groups, &group).await;

        Ok(snapshot)
    }

    /// Group registered for a subscriber, created empty if there is none.
    ///
    /// An empty group has no running loop. It starts polling on its first
    /// watch, or is removed again by [`drop_if_empty`](Self::drop_if_empty).
    pub async fn get_or_create_group(&self, subscriber: SubscriberId) -> Arc<WatchGroup> {
        let mut groups = self.inner.groups.lock().await;
        self.get_or_create_locked(&mut groups, subscriber)
    }

    /// Group currently registered for a subscriber
    pub async fn group(&self, subscriber: SubscriberId) -> Option<Arc<WatchGroup>> {
        self.inner.groups.lock().await.get(&subscriber).cloned()
    }

    /// Snapshots of every listing a subscriber watches, in insertion order
    pub async fn watched(&self, subscriber: SubscriberId) -> Vec<ListingSnapshot> {
        match self.group(subscriber).await {
            Some(group) => group.snapshots().await,
            None => Vec::new(),
        }
    }

    /// Stop and deregister a subscriber's group if it has no entries.
    /// Returns true if a group was removed.
    pub async fn drop_if_empty(&self, subscriber: SubscriberId) -> bool {
        let mut groups = self.inner.groups.lock().await;
        match groups.get(&subscriber).cloned() {
            Some(group) => Self::drop_group_if_empty(&mut groups, &group).await,
            None => false,
        }
    }

    /// Number of subscribers with at least one watch
    pub async fn group_count(&self) -> usize {
        self.inner.groups.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.groups.lock().await.is_empty()
    }

    /// Stop every group and forget all watches
    pub async fn shutdown(&self) {
        let mut groups = self.inner.groups.lock().await;
        for group in groups.values() {
            group.shutdown().await;
        }
        let stopped = groups.len();
        groups.clear();
        set_gauge(GaugeMetric::ActiveGroups, 0.0);
        tracing::info!(groups = stopped, "Registry shut down");
    }

    fn get_or_create_locked(
        &self,
        groups: &mut HashMap<SubscriberId, Arc<WatchGroup>>,
        subscriber: SubscriberId,
    ) -> Arc<WatchGroup> {
        let group = groups.entry(subscriber).or_insert_with(|| {
            tracing::debug!(%subscriber, "Creating watch group");
            Arc::new(WatchGroup::new(subscriber, self.inner.policy))
        });
        let group = Arc::clone(group);
        set_gauge(GaugeMetric::ActiveGroups, groups.len() as f64);
        group
    }

    async fn drop_group_if_empty(
        groups: &mut HashMap<SubscriberId, Arc<WatchGroup>>,
        group: &Arc<WatchGroup>,
    ) -> bool {
        if !group.stop_if_empty().await {
            return false;
        }

        let subscriber = group.subscriber();
        if groups
            .get(&subscriber)
            .is_some_and(|g| Arc::ptr_eq(g, group))
        {
            groups.remove(&subscriber);
        }
        set_gauge(GaugeMetric::ActiveGroups, groups.len() as f64);
        tracing::debug!(%subscriber, "Watch group removed");
        true
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}
