//! Types shared between the sampler, its supplier, and its consumers

use tokio::sync::watch::{
    Receiver as WatchReceiver, Sender as WatchSender, channel as watch_channel,
};

pub mod container;
pub mod stats;

pub use container::{ContainerHandle, ContainerId};
pub use stats::{ContainerStats, CpuUsage, MemoryUsage, MetricKind, NetworkStats};

/// A type alias for an empty channel used to signal cancellation to workers
pub type CancelChannel = WatchReceiver<()>;
/// The sending half of a cancel channel, held by whoever may cancel the worker
pub type CancelSender = WatchSender<()>;

/// Create a new cancel channel
pub fn new_cancel_channel() -> (CancelSender, CancelChannel) {
    watch_channel(())
}
