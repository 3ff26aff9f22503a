//! Benchmark configuration.
//!
//! Defaults reproduce the canonical matrix: one million items split evenly
//! across the producers, producer and consumer counts drawn from {1, 2, 4}.
//! A configuration can also be read from JSON; missing fields keep their
//! defaults.

use crate::bench::registry::{self, QueueEntry};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Knobs for one benchmark session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Items pushed per run, split evenly across producers
    pub total_items: usize,
    /// Producer counts to sweep
    pub producer_counts: Vec<usize>,
    /// Consumer counts to sweep
    pub consumer_counts: Vec<usize>,
    /// Worker pool size; `None` uses the available parallelism. Never
    /// smaller than the largest producer count plus the largest consumer
    /// count, so every pooled job of a run can be in flight at once.
    pub pool_threads: Option<usize>,
    /// Sleep after a consumer finds the queue empty
    pub idle_sleep_micros: u64,
    /// Cancel a run that has not completed after this many milliseconds
    pub run_timeout_ms: Option<u64>,
    /// Keep every consumed item and check for loss, duplication and order
    pub verify: bool,
    /// Registry names to benchmark; `None` means all of them
    pub queues: Option<Vec<String>>,
}

impl BenchConfig {
    /// Canonical number of items per run
    pub const DEFAULT_TOTAL_ITEMS: usize = 1_000_000;

    /// Canonical producer and consumer counts
    pub const DEFAULT_COUNTS: [usize; 3] = [1, 2, 4];

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Set the number of items per run.
    pub fn with_total_items(mut self, total_items: usize) -> Self {
        self.total_items = total_items;
        self
    }

    /// Set the producer and consumer counts to sweep.
    pub fn with_counts(mut self, producers: &[usize], consumers: &[usize]) -> Self {
        self.producer_counts = producers.to_vec();
        self.consumer_counts = consumers.to_vec();
        self
    }

    /// Restrict the session to the named queues.
    pub fn with_queues<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queues = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the consumer idle sleep.
    pub fn with_idle_sleep(mut self, sleep: Duration) -> Self {
        self.idle_sleep_micros = sleep.as_micros() as u64;
        self
    }

    /// Cancel runs that exceed `timeout`, kept at millisecond precision.
    /// Anything shorter than a millisecond becomes one.
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.run_timeout_ms = Some(millis.max(1));
        self
    }

    /// Enable or disable item verification.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Check that every run the configuration describes can execute.
    pub fn validate(&self) -> Result<()> {
        if self.total_items == 0 {
            return Err(Error::Config("total_items must be positive".into()));
        }
        if self.total_items > u32::MAX as usize {
            return Err(Error::Config(format!(
                "total_items must not exceed {} so item tags stay unique",
                u32::MAX
            )));
        }
        for (field, counts) in [
            ("producer_counts", &self.producer_counts),
            ("consumer_counts", &self.consumer_counts),
        ] {
            if counts.is_empty() {
                return Err(Error::Config(format!("{field} must not be empty")));
            }
            if counts.contains(&0) {
                return Err(Error::Config(format!("{field} must not contain 0")));
            }
        }
        let max_producers = self.max_producers();
        if self.total_items < max_producers {
            return Err(Error::Config(format!(
                "total_items ({}) is smaller than the producer count {max_producers}",
                self.total_items
            )));
        }
        if self.pool_threads == Some(0) {
            return Err(Error::Config("pool_threads must be positive".into()));
        }
        if self.run_timeout_ms == Some(0) {
            return Err(Error::Config("run_timeout_ms must be positive".into()));
        }
        self.selected_queues().map(|_| ())
    }

    /// Items each producer pushes when `producers` share the total.
    ///
    /// Any remainder of the division is not pushed.
    pub fn items_per_producer(&self, producers: usize) -> usize {
        self.total_items / producers.max(1)
    }

    /// Consumer sleep after an empty poll
    pub fn idle_sleep(&self) -> Duration {
        Duration::from_micros(self.idle_sleep_micros)
    }

    /// Per-run timeout, if any
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_ms.map(Duration::from_millis)
    }

    /// Number of worker threads the pooled model needs.
    pub fn pool_size(&self) -> usize {
        let required = self.max_producers() + self.max_consumers();
        let requested = self.pool_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(required)
        });
        requested.max(required)
    }

    /// Registry entries to benchmark, in registry order unless names are given.
    pub fn selected_queues(&self) -> Result<Vec<&'static QueueEntry>> {
        match &self.queues {
            None => Ok(registry::QUEUES.iter().collect()),
            Some(names) if names.is_empty() => {
                Err(Error::Config("queues must not be empty".into()))
            }
            Some(names) => names.iter().map(|name| registry::lookup(name)).collect(),
        }
    }

    fn max_producers(&self) -> usize {
        self.producer_counts.iter().copied().max().unwrap_or(0)
    }

    fn max_consumers(&self) -> usize {
        self.consumer_counts.iter().copied().max().unwrap_or(0)
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            total_items: Self::DEFAULT_TOTAL_ITEMS,
            producer_counts: Self::DEFAULT_COUNTS.to_vec(),
            consumer_counts: Self::DEFAULT_COUNTS.to_vec(),
            pool_threads: None,
            idle_sleep_micros: 1_000,
            run_timeout_ms: None,
            verify: false,
            queues: None,
        }
    }
}
