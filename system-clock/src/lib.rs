//! A clock that periodic workers use to pace themselves
//!
//! Workers never sleep on the runtime timer directly; they suspend through a
//! [`Clock`] so that tests may substitute a clock that only advances when told
//! to. The production implementation supports sub-second intervals, which the
//! stats sampler needs for its half-second cadence

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::needless_pass_by_ref_mut)]

use std::time::Duration;

use async_trait::async_trait;

#[cfg(any(test, feature = "mocks"))]
mod manual;
#[cfg(any(test, feature = "mocks"))]
pub use manual::ManualClock;

/// A source of suspension for periodic workers
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Suspend the caller for the given duration
    ///
    /// The returned future must be cancel safe; workers race it against their
    /// cancel channel and drop it when cancelled
    async fn sleep(&self, duration: Duration);
}

/// The system clock, backed by the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}
