//! Fetch command implementation

use crate::config::Config;
use crate::listing::{ListingClient, ListingFetcher, ListingId};
use clap::Args;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Listing identifier
    pub listing: u64,
}

impl FetchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = ListingClient::with_config(config.api.client_config())?;
        let snapshot = client.fetch(ListingId(self.listing)).await?;

        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        Ok(())
    }
}
