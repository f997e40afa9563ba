//! Interval command implementation

use crate::config::Config;
use crate::listing::RemainingTime;
use crate::watch::IntervalPolicy;
use clap::Args;

#[derive(Args, Debug)]
pub struct IntervalArgs {
    /// Remaining-time text as reported by the API (e.g. "1d 4h", "12m 30s")
    pub remaining: String,
}

impl IntervalArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let remaining = RemainingTime::parse(&self.remaining);
        let policy = IntervalPolicy::new(config.watch.no_countdown_interval_secs);

        if remaining.is_ended() {
            println!("{:?} -> ended, no further polling", self.remaining);
        } else {
            println!(
                "{:?} -> {} remaining, poll every {}s",
                self.remaining,
                remaining,
                policy.interval_for(&remaining)
            );
        }
        Ok(())
    }
}
