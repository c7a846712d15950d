//! Defines errors for the stats sampler

use common::types::ContainerId;
use thiserror::Error;

/// An error raised while configuring, starting, or stopping a sampler
///
/// Errors from an individual tick are never surfaced here; the sampler
/// absorbs them into its cadence
#[derive(Clone, Debug, Error)]
pub enum SamplerError {
    /// The sampler was configured with a non-positive interval or capacity
    #[error("invalid sampler configuration: {0}")]
    InvalidConfiguration(String),
    /// The container is already being sampled
    #[error("container {0} is already tracked")]
    AlreadyTracked(ContainerId),
    /// The container is not being sampled
    #[error("container {0} is not tracked")]
    NotTracked(ContainerId),
    /// The sampling task panicked or was aborted
    #[error("sampler task failed: {0}")]
    TaskFailed(String),
}
