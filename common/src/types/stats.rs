//! A single resource-usage sample for a container
//!
//! Samples are opaque to the sampler; it stores and forwards them as a unit

use serde::{Deserialize, Serialize};

/// Cumulative CPU time consumed by a container
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuUsage {
    /// Total CPU time consumed, in nanoseconds
    pub total_usage_ns: u64,
    /// CPU time consumed in kernel mode, in nanoseconds
    pub kernel_usage_ns: u64,
    /// CPU time consumed in user mode, in nanoseconds
    pub user_usage_ns: u64,
}

/// Memory consumed by a container
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Current memory usage, in bytes
    pub usage_bytes: u64,
    /// Maximum memory usage recorded, in bytes
    pub max_usage_bytes: u64,
    /// Page cache attributed to the container, in bytes
    pub cache_bytes: u64,
}

/// Network interface counters for a container
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Bytes received
    pub rx_bytes: u64,
    /// Packets received
    pub rx_packets: u64,
    /// Receive errors
    pub rx_errors: u64,
    /// Received packets dropped
    pub rx_dropped: u64,
    /// Bytes transmitted
    pub tx_bytes: u64,
    /// Packets transmitted
    pub tx_packets: u64,
    /// Transmit errors
    pub tx_errors: u64,
    /// Transmitted packets dropped
    pub tx_dropped: u64,
}

/// The sub-metrics of a sample that a supplier may report as unavailable
/// while still producing the rest of the sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// The network interface counters
    Network,
}

/// An immutable snapshot of a container's resource usage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStats {
    /// The unix timestamp in milliseconds at which the sample was taken
    pub timestamp: u64,
    /// CPU usage
    pub cpu: CpuUsage,
    /// Memory usage
    pub memory: MemoryUsage,
    /// Network counters, absent when they could not be read
    pub network: Option<NetworkStats>,
}

impl ContainerStats {
    /// Constructor, without network counters
    pub fn new(timestamp: u64, cpu: CpuUsage, memory: MemoryUsage) -> Self {
        Self { timestamp, cpu, memory, network: None }
    }

    /// Attach network counters to the sample
    pub fn with_network(mut self, network: NetworkStats) -> Self {
        self.network = Some(network);
        self
    }

    /// Clear the given sub-metric from the sample
    pub fn without(mut self, kind: MetricKind) -> Self {
        match kind {
            MetricKind::Network => self.network = None,
        }

        self
    }

    /// Whether the sample carries the given sub-metric
    pub fn has(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Network => self.network.is_some(),
        }
    }
}
