//! A fixed-capacity ring of the most recent samples for a container
//!
//! The buffer is shared between its single writer, the container's sampler,
//! and any number of readers. Every access takes the lock for the duration of
//! one push or one copy, so readers never observe a write in progress and
//! neither side ever waits on the sampling interval

use std::{
    collections::VecDeque,
    sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard},
};

use common::{Shared, new_shared, types::ContainerStats};

use crate::error::SamplerError;

/// The error message emitted when a buffer is created without capacity
const ERR_ZERO_CAPACITY: &str = "buffer capacity must be positive";

/// A bounded, append-only history of samples, ordered oldest to newest
///
/// Cloning the buffer yields another handle on the same history
#[derive(Clone, Debug)]
pub struct StatsBuffer {
    /// The maximum number of samples retained
    capacity: usize,
    /// The retained samples
    samples: Shared<VecDeque<ContainerStats>>,
}

impl StatsBuffer {
    /// Create an empty buffer retaining at most `capacity` samples
    pub fn new(capacity: usize) -> Result<Self, SamplerError> {
        if capacity == 0 {
            return Err(SamplerError::InvalidConfiguration(ERR_ZERO_CAPACITY.to_string()));
        }

        Ok(Self { capacity, samples: new_shared(VecDeque::new()) })
    }

    // -----------
    // | Getters |
    // -----------

    /// The maximum number of samples retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of samples currently retained
    pub fn len(&self) -> usize {
        self.read_samples().len()
    }

    /// Whether no samples have been retained yet
    pub fn is_empty(&self) -> bool {
        self.read_samples().is_empty()
    }

    /// The most recently added sample
    pub fn latest(&self) -> Option<ContainerStats> {
        self.read_samples().back().cloned()
    }

    /// Copy out every retained sample, oldest first
    pub fn snapshot(&self) -> Vec<ContainerStats> {
        self.read_samples().iter().cloned().collect()
    }

    // -----------
    // | Setters |
    // -----------

    /// Append a sample, evicting the oldest one if the buffer is full
    pub fn add(&self, sample: ContainerStats) {
        let mut samples = self.write_samples();
        if samples.len() >= self.capacity {
            samples.pop_front();
        }

        samples.push_back(sample);
    }

    // -----------
    // | Helpers |
    // -----------

    /// Acquire a read lock on the samples
    ///
    /// A panicking holder cannot leave the deque half-written, so a poisoned
    /// lock is still safe to read
    fn read_samples(&self) -> RwLockReadGuard<'_, VecDeque<ContainerStats>> {
        self.samples.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire a write lock on the samples
    fn write_samples(&self) -> RwLockWriteGuard<'_, VecDeque<ContainerStats>> {
        self.samples.write().unwrap_or_else(PoisonError::into_inner)
    }
}
