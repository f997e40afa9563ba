//! Watch command implementation

use crate::config::Config;
use crate::listing::{ListingClient, ListingId};
use crate::watch::{Registry, SubscriberId, WatchError, WatchEvent};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Subscriber the watches are grouped under
    #[arg(short, long, default_value = "0")]
    pub subscriber: u64,

    /// Listing identifiers to watch
    #[arg(required = true)]
    pub listings: Vec<u64>,
}

impl WatchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = ListingClient::with_config(config.api.client_config())?;
        let (registry, mut events) = Registry::new(Arc::new(client), &config.watch);
        let subscriber = SubscriberId(self.subscriber);

        for &listing in &self.listings {
            match registry.watch(subscriber, ListingId(listing)).await {
                Ok(snapshot) => println!(
                    "Watching {} \"{}\" at {} ({} remaining) {}",
                    snapshot.id,
                    snapshot.title,
                    snapshot.current_price,
                    snapshot.remaining,
                    snapshot.url
                ),
                Err(WatchError::ListingEnded(snapshot)) => println!(
                    "Listing {} has already ended, final price {}",
                    snapshot.id, snapshot.current_price
                ),
                Err(e) => tracing::warn!(listing, error = %e, "Could not watch listing"),
            }
        }

        if registry.is_empty().await {
            tracing::info!("Nothing to watch");
            return Ok(());
        }

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    render(&event);
                    if event.is_final() && registry.is_empty().await {
                        tracing::info!("All watched auctions have ended");
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping watches");
                    break;
                }
            }
        }

        registry.shutdown().await;
        Ok(())
    }
}

fn render(event: &WatchEvent) {
    let snapshot = event.snapshot();
    match event {
        WatchEvent::Changed { .. } => println!(
            "[{}] {} \"{}\" now {} ({} remaining)",
            event.subscriber(),
            snapshot.id,
            snapshot.title,
            snapshot.current_price,
            snapshot.remaining
        ),
        WatchEvent::Ended { .. } => println!(
            "[{}] {} \"{}\" has ended, winning bid is {}",
            event.subscriber(),
            snapshot.id,
            snapshot.title,
            snapshot.current_price
        ),
    }
}
