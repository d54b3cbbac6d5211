//! Periodic aggregation over the source catalog.
//!
//! A single background task runs a pass immediately on start, then once per
//! interval until stopped. The pass runs inline in that task and missed timer
//! ticks are skipped, so two passes never run at the same time against the
//! sink.

mod pass;

pub use pass::{Aggregator, PassReport, SourceReport};

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::app::{NewsAggError, Result};

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pass interval in seconds (default: 600 = 10 minutes)
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_secs: 600 }
    }
}

impl SchedulerConfig {
    /// Builds a configuration from an interval string, rejecting zero.
    pub fn from_interval(s: &str) -> std::result::Result<Self, String> {
        let config = Self {
            interval_secs: Self::parse_interval(s)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.interval_secs == 0 {
            return Err("scheduler interval must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Parse interval string like "1h", "30m", "6h", "1d"
    pub fn parse_interval(s: &str) -> std::result::Result<u64, String> {
        let s = s.trim().to_lowercase();

        let (value, unit, multiplier) = if let Some(hours) = s.strip_suffix('h') {
            (hours, "hours", 3600)
        } else if let Some(minutes) = s.strip_suffix('m') {
            (minutes, "minutes", 60)
        } else if let Some(days) = s.strip_suffix('d') {
            (days, "days", 86400)
        } else if let Some(secs) = s.strip_suffix('s') {
            (secs, "seconds", 1)
        } else {
            return s
                .parse::<u64>()
                .map_err(|_| format!("Invalid interval: {}. Use format like '30s', '10m', '1h'", s));
        };

        value
            .parse::<u64>()
            .map_err(|_| format!("Invalid {}: {}", unit, value))?
            .checked_mul(multiplier)
            .ok_or_else(|| format!("Interval too large: {}", s))
    }

    /// Format interval for display
    pub fn format_interval(secs: u64) -> String {
        if secs >= 86400 && secs % 86400 == 0 {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

pub struct Scheduler {
    aggregator: Aggregator,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Fails with [`NewsAggError::Config`] when the interval is zero.
    pub fn new(aggregator: Aggregator, config: SchedulerConfig) -> Result<Self> {
        config.validate().map_err(NewsAggError::Config)?;
        Ok(Self { aggregator, config })
    }

    /// Spawns the scheduler loop and returns immediately.
    ///
    /// Dropping the returned handle stops the scheduler like [`SchedulerHandle::stop`].
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));

        SchedulerHandle { stop_tx, task }
    }

    async fn run(self, mut stop: watch::Receiver<bool>) {
        info!(
            "Scheduler started (interval: {})",
            SchedulerConfig::format_interval(self.config.interval_secs)
        );

        let mut timer = interval(self.config.interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        timer.tick().await; // the first tick completes immediately

        info!("Running initial pass...");
        self.aggregator.run_pass_until(&stop).await;

        loop {
            tokio::select! {
                _ = timer.tick() => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            if *stop.borrow() {
                break;
            }

            info!("Running scheduled pass...");
            self.aggregator.run_pass_until(&stop).await;
        }

        info!("Scheduler stopped");
    }
}

/// Control handle of a running scheduler.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Requests the scheduler to stop. No pass starts afterwards, and a pass
    /// in progress does not start another source. Safe to call repeatedly.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the scheduler task to exit. Call [`stop`](Self::stop) first.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!("Scheduler task failed: {}", e);
        }
    }
}
