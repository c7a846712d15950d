//! The contract between a sampler and the component that reads raw container
//! stats
//!
//! How stats are extracted (cgroup files, a container runtime API, ...) is up
//! to the supplier. The sampler only distinguishes the outcome classes below

use async_trait::async_trait;
use common::types::{ContainerHandle, ContainerStats, MetricKind};
use thiserror::Error;

/// A successful read of a container's stats
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatsReading {
    /// Every sub-metric was read
    Complete(ContainerStats),
    /// Some sub-metrics could not be read, the rest of the sample is valid
    Partial {
        /// The sample as read
        stats: ContainerStats,
        /// The sub-metrics that could not be read
        missing: Vec<MetricKind>,
    },
}

impl StatsReading {
    /// Convert the reading into the sample to record, clearing any sub-metric
    /// the supplier reported as missing
    pub fn into_sample(self) -> ContainerStats {
        match self {
            StatsReading::Complete(stats) => stats,
            StatsReading::Partial { stats, missing } => {
                missing.into_iter().fold(stats, ContainerStats::without)
            },
        }
    }
}

/// An unsuccessful read of a container's stats
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    /// The container's state does not exist yet
    ///
    /// Runtimes create this state asynchronously after the container starts,
    /// so this is expected shortly after tracking begins
    #[error("container state not yet available: {0}")]
    NotReady(String),
    /// Any other failure to read stats
    #[error("error reading container stats: {0}")]
    Failure(String),
}

/// Reads the current stats of a container
#[async_trait]
pub trait StatsSupplier: Send + Sync + 'static {
    /// Read the container's stats
    ///
    /// Called at most once per tick; the sampler never retries a failed read
    /// within the same tick
    async fn get_stats(&self, container: &ContainerHandle) -> Result<StatsReading, StatsError>;
}

#[cfg(any(test, feature = "mocks"))]
pub use mocks::{MockStatsSupplier, mock_stats};

/// A scripted supplier for testing samplers
#[cfg(any(test, feature = "mocks"))]
mod mocks {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex, PoisonError,
            atomic::{AtomicU64, Ordering},
        },
    };

    use async_trait::async_trait;
    use common::types::{ContainerHandle, ContainerStats, CpuUsage, MemoryUsage, NetworkStats};

    use super::{StatsError, StatsReading, StatsSupplier};

    /// Build a complete sample identified by its timestamp
    pub fn mock_stats(timestamp: u64) -> ContainerStats {
        let cpu = CpuUsage {
            total_usage_ns: timestamp * 1_000,
            kernel_usage_ns: timestamp * 400,
            user_usage_ns: timestamp * 600,
        };
        let memory = MemoryUsage {
            usage_bytes: timestamp * 4096,
            max_usage_bytes: timestamp * 8192,
            cache_bytes: 0,
        };
        let network =
            NetworkStats { rx_bytes: timestamp, tx_bytes: timestamp, ..Default::default() };

        ContainerStats::new(timestamp, cpu, memory).with_network(network)
    }

    /// A supplier that replays a script of outcomes, one per call
    ///
    /// Once the script is exhausted, every call returns a complete sample whose
    /// timestamp is the 1-based index of the call
    #[derive(Default)]
    pub struct MockStatsSupplier {
        /// The outcomes left to replay
        script: Mutex<VecDeque<Result<StatsReading, StatsError>>>,
        /// The number of calls made
        num_calls: AtomicU64,
    }

    impl MockStatsSupplier {
        /// Constructor
        pub fn new<I>(script: I) -> Self
        where
            I: IntoIterator<Item = Result<StatsReading, StatsError>>,
        {
            Self { script: Mutex::new(script.into_iter().collect()), num_calls: AtomicU64::new(0) }
        }

        /// The number of times `get_stats` has been called
        pub fn num_calls(&self) -> u64 {
            self.num_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatsSupplier for MockStatsSupplier {
        async fn get_stats(
            &self,
            _container: &ContainerHandle,
        ) -> Result<StatsReading, StatsError> {
            let call = self.num_calls.fetch_add(1, Ordering::SeqCst) + 1;
            let next = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();

            next.unwrap_or_else(|| Ok(StatsReading::Complete(mock_stats(call))))
        }
    }
}

#[cfg(test)]
mod test {
    use common::types::MetricKind;

    use super::{StatsReading, mock_stats};

    #[test]
    fn test_partial_reading_clears_missing() {
        let stats = mock_stats(7);
        let reading =
            StatsReading::Partial { stats: stats.clone(), missing: vec![MetricKind::Network] };

        let sample = reading.into_sample();
        assert_eq!(sample.network, None);
        assert_eq!(sample.cpu, stats.cpu);
        assert_eq!(sample.memory, stats.memory);
    }

    #[test]
    fn test_complete_reading_untouched() {
        let stats = mock_stats(7);
        assert_eq!(StatsReading::Complete(stats.clone()).into_sample(), stats);
    }
}
