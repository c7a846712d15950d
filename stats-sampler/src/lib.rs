//! Samples container resource usage at a fixed interval, retaining a bounded
//! window of recent samples in memory for each tracked container
//!
//! A [`tracker::StatsTracker`] owns one background sampler per container. Each
//! sampler polls a [`supplier::StatsSupplier`] once per tick and appends the
//! result to that container's [`buffer::StatsBuffer`], which consumers read
//! independently of the sampling cadence.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::needless_pass_by_ref_mut)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod buffer;
pub mod error;
pub mod labels;
pub mod sampler;
pub mod supplier;
pub mod tracker;

pub use buffer::StatsBuffer;
pub use error::SamplerError;
pub use sampler::{SamplerHandle, SamplerState, TickOutcome};
pub use supplier::{StatsError, StatsReading, StatsSupplier};
pub use tracker::StatsTracker;
