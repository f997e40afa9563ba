//! Prometheus metrics

use ::metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Item-detail lookup latency
    Fetch,
    /// One scheduler cycle, fetches included
    Cycle,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Poll returned a fresh snapshot
    PollSucceeded,
    /// Poll failed at the transport layer
    PollFailed,
    /// Price change event emitted
    ChangeEvent,
    /// Auction ended event emitted
    EndedEvent,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Subscribers with a running watch group
    ActiveGroups,
    /// Listings watched across all groups
    WatchedListings,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Fetch => "auction_watch_fetch_latency_ms",
        LatencyMetric::Cycle => "auction_watch_cycle_latency_ms",
    };

    histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a counter by one
pub fn increment_counter(metric: CounterMetric) {
    let (metric_name, outcome) = match metric {
        CounterMetric::PollSucceeded => ("auction_watch_polls_total", "ok"),
        CounterMetric::PollFailed => ("auction_watch_polls_total", "error"),
        CounterMetric::ChangeEvent => ("auction_watch_events_total", "changed"),
        CounterMetric::EndedEvent => ("auction_watch_events_total", "ended"),
    };

    counter!(metric_name, "kind" => outcome).increment(1);
}

fn gauge_name(metric: GaugeMetric) -> &'static str {
    match metric {
        GaugeMetric::ActiveGroups => "auction_watch_active_groups",
        GaugeMetric::WatchedListings => "auction_watch_watched_listings",
    }
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    gauge!(gauge_name(metric)).set(value);
}

/// Move a gauge up or down by `delta`
pub fn adjust_gauge(metric: GaugeMetric, delta: f64) {
    gauge!(gauge_name(metric)).increment(delta);
}
