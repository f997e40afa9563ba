//! Registry bookkeeping: group creation, cancellation and shutdown

use crate::common::{snapshot, FakeFetcher};
use auction_watch::config::WatchConfig;
use auction_watch::listing::ListingId;
use auction_watch::watch::{Registry, SubscriberId, WatchError, WatchEvent};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

const U1: SubscriberId = SubscriberId(1);
const L1: ListingId = ListingId(101);
const L2: ListingId = ListingId(102);

fn registry(fetcher: &Arc<FakeFetcher>) -> (Registry, mpsc::Receiver<WatchEvent>) {
    Registry::new(fetcher.clone(), &WatchConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_watch_starts_group() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Ok(snapshot(101, dec!(10), 45 * MINUTE))]);
    let (registry, _rx) = registry(&fetcher);

    let initial = registry.watch(U1, L1).await.unwrap();
    assert_eq!(initial.current_price, dec!(10));

    let group = registry.group(U1).await.unwrap();
    assert_eq!(group.len().await, 1);
    assert!(group.is_running().await);
    assert_eq!(group.interval().await, Some(Duration::from_secs(900)));
    assert_eq!(registry.group_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_watch_is_idempotent() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Ok(snapshot(101, dec!(10), 45 * MINUTE))]);
    let (registry, _rx) = registry(&fetcher);

    registry.watch(U1, L1).await.unwrap();
    let again = registry.watch(U1, L1).await.unwrap();

    assert_eq!(again.id, L1);
    let group = registry.group(U1).await.unwrap();
    assert_eq!(group.len().await, 1);
    assert_eq!(fetcher.calls(101), 1);
}

#[tokio::test(start_paused = true)]
async fn test_watch_transport_error_leaves_no_group() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Err(503)]);
    let (registry, _rx) = registry(&fetcher);

    let result = registry.watch(U1, L1).await;

    assert!(matches!(
        result,
        Err(WatchError::Transport { listing, .. }) if listing == L1
    ));
    assert!(registry.group(U1).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_watch_already_ended_listing() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Ok(snapshot(101, dec!(40), 0))]);
    let (registry, _rx) = registry(&fetcher);

    let result = registry.watch(U1, L1).await;

    match result {
        Err(WatchError::ListingEnded(snapshot)) => assert_eq!(snapshot.current_price, dec!(40)),
        other => panic!("expected ListingEnded, got {:?}", other),
    }
    assert!(registry.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_unwatch_unknown_listing() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Ok(snapshot(101, dec!(10), DAY))]);
    let (registry, _rx) = registry(&fetcher);

    let result = registry.unwatch(U1, L1).await;
    assert!(matches!(result, Err(WatchError::NotWatching { .. })));

    registry.watch(U1, L1).await.unwrap();
    let result = registry.unwatch(U1, L2).await;
    assert!(matches!(
        result,
        Err(WatchError::NotWatching { subscriber, listing })
            if subscriber == U1 && listing == L2
    ));

    let group = registry.group(U1).await.unwrap();
    assert_eq!(group.len().await, 1);
    assert!(group.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn test_unwatch_last_entry_stops_group() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Ok(snapshot(101, dec!(10), DAY))]);
    fetcher.script(102, vec![Ok(snapshot(102, dec!(5), 2 * DAY))]);
    let (registry, _rx) = registry(&fetcher);

    registry.watch(U1, L1).await.unwrap();
    registry.watch(U1, L2).await.unwrap();
    let group = registry.group(U1).await.unwrap();

    let removed = registry.unwatch(U1, L1).await.unwrap();
    assert_eq!(removed.id, L1);
    assert_eq!(group.len().await, 1);
    assert!(group.is_running().await);

    let removed = registry.unwatch(U1, L2).await.unwrap();
    assert_eq!(removed.current_price, dec!(5));
    assert!(group.is_empty().await);
    assert!(!group.is_running().await);
    assert!(registry.group(U1).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_watched_preserves_insertion_order() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(102, vec![Ok(snapshot(102, dec!(5), DAY))]);
    fetcher.script(101, vec![Ok(snapshot(101, dec!(10), DAY))]);
    let (registry, _rx) = registry(&fetcher);

    registry.watch(U1, L2).await.unwrap();
    registry.watch(U1, L1).await.unwrap();

    let ids: Vec<ListingId> = registry.watched(U1).await.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![L2, L1]);
    assert!(registry.watched(SubscriberId(99)).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_groups_are_per_subscriber() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Ok(snapshot(101, dec!(10), DAY))]);
    let (registry, _rx) = registry(&fetcher);
    let u2 = SubscriberId(2);

    registry.watch(U1, L1).await.unwrap();
    registry.watch(u2, L1).await.unwrap();
    assert_eq!(registry.group_count().await, 2);

    registry.unwatch(U1, L1).await.unwrap();
    assert!(registry.group(U1).await.is_none());
    let other = registry.group(u2).await.unwrap();
    assert!(other.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn test_drop_if_empty_keeps_populated_group() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Ok(snapshot(101, dec!(10), DAY))]);
    let (registry, _rx) = registry(&fetcher);

    assert!(!registry.drop_if_empty(U1).await);

    registry.watch(U1, L1).await.unwrap();
    assert!(!registry.drop_if_empty(U1).await);
    assert!(registry.group(U1).await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_all_groups() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Ok(snapshot(101, dec!(10), DAY))]);
    let (registry, _rx) = registry(&fetcher);

    registry.watch(U1, L1).await.unwrap();
    registry.watch(SubscriberId(2), L1).await.unwrap();
    let group = registry.group(U1).await.unwrap();

    registry.shutdown().await;

    assert!(registry.is_empty().await);
    assert!(!group.is_running().await);
    assert!(group.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_get_or_create_group() {
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.script(101, vec![Ok(snapshot(101, dec!(10), DAY))]);
    let (registry, _rx) = registry(&fetcher);

    let group = registry.get_or_create_group(U1).await;
    let again = registry.get_or_create_group(U1).await;
    assert!(Arc::ptr_eq(&group, &again));
    assert!(group.is_empty().await);
    assert!(!group.is_running().await);
    assert_eq!(registry.group_count().await, 1);

    registry.watch(U1, L1).await.unwrap();
    assert!(group.is_running().await);
    assert_eq!(group.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_drop_if_empty_removes_unused_group() {
    let fetcher = Arc::new(FakeFetcher::default());
    let (registry, _rx) = registry(&fetcher);

    let group = registry.get_or_create_group(U1).await;
    assert!(registry.drop_if_empty(U1).await);

    assert!(registry.group(U1).await.is_none());
    assert!(!group.is_running().await);
    assert!(registry.is_empty().await);
}
