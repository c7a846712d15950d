//! The per-container sampling loop
//!
//! Each tick the loop checks for cancellation, reads the container's stats
//! once, records the sample if there is one, and then waits one interval. The
//! wait is raced against the cancel channel, so a stopped sampler exits within
//! one interval even while suspended. A slow supplier call is never
//! interrupted; it delays the exit by at most its own duration

use std::{sync::Arc, time::Duration};

use common::types::{
    CancelChannel, CancelSender, ContainerHandle, MetricKind, new_cancel_channel,
};
use system_clock::Clock;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{Instrument, debug, info, info_span, warn};
use util::err_str;

use crate::{
    buffer::StatsBuffer,
    error::SamplerError,
    labels::{
        CONTAINER_ID_METRIC_TAG, NUM_STATS_SAMPLE_FAILURES_METRIC,
        NUM_STATS_SAMPLES_DEGRADED_METRIC, NUM_STATS_SAMPLES_NOT_READY_METRIC,
        NUM_STATS_SAMPLES_RECORDED_METRIC,
    },
    supplier::{StatsError, StatsReading, StatsSupplier},
};

/// The error message emitted when a sampler is configured with a zero interval
const ERR_ZERO_INTERVAL: &str = "sample interval must be positive";

// ---------
// | Types |
// ---------

/// The result of a single tick, as classified by the sampler
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A complete sample was recorded
    Recorded,
    /// A sample was recorded with the given sub-metrics cleared
    Degraded(Vec<MetricKind>),
    /// The container's state was not ready, nothing was recorded
    NotReady,
    /// The supplier failed, nothing was recorded
    Failed,
}

/// The lifecycle state of a sampler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerState {
    /// The sampling loop is live
    Running,
    /// The sampling loop has exited and will not touch its buffer again
    Stopped,
}

// ----------
// | Config |
// ----------

/// The configuration of a single container's sampler
pub struct StatsSamplerConfig {
    /// The container to sample
    pub container: ContainerHandle,
    /// The supplier from which stats are read
    pub supplier: Arc<dyn StatsSupplier>,
    /// The clock used to wait between ticks
    pub clock: Arc<dyn Clock>,
    /// The buffer into which samples are recorded
    pub buffer: StatsBuffer,
    /// The interval between ticks
    pub sample_interval: Duration,
    /// The channel on which the owner may cancel the sampler
    pub cancel_channel: CancelChannel,
}

// ------------
// | Executor |
// ------------

/// Runs the sampling loop for a single container
pub struct StatsSamplerExecutor {
    /// The container to sample
    container: ContainerHandle,
    /// The supplier from which stats are read
    supplier: Arc<dyn StatsSupplier>,
    /// The clock used to wait between ticks
    clock: Arc<dyn Clock>,
    /// The buffer into which samples are recorded, the executor is its only
    /// writer
    buffer: StatsBuffer,
    /// The interval between ticks
    sample_interval: Duration,
    /// The channel on which the owner may cancel the sampler
    cancel_channel: CancelChannel,
}

impl StatsSamplerExecutor {
    /// Constructor
    pub fn new(config: StatsSamplerConfig) -> Self {
        let StatsSamplerConfig {
            container,
            supplier,
            clock,
            buffer,
            sample_interval,
            cancel_channel,
        } = config;

        Self { container, supplier, clock, buffer, sample_interval, cancel_channel }
    }

    /// The main execution loop, samples until cancelled
    pub async fn execution_loop(mut self) {
        info!("starting stats sampler");

        loop {
            if self.is_cancelled() {
                break;
            }

            let outcome = self.sample().await;
            self.record_outcome_metrics(&outcome);

            // A stop requested during the tick exits before sleeping
            tokio::select! {
                biased;
                _ = self.cancel_channel.changed() => break,
                _ = self.clock.sleep(self.sample_interval) => {},
            }
        }

        info!("stats sampler stopped");
    }

    /// Execute a single tick: read the container's stats and record them
    pub async fn sample(&self) -> TickOutcome {
        let reading = self.supplier.get_stats(&self.container).await;
        match reading {
            Ok(StatsReading::Complete(stats)) => {
                self.buffer.add(stats);
                TickOutcome::Recorded
            },
            Ok(StatsReading::Partial { stats, missing }) => {
                debug!("recording stats without {missing:?}");
                let outcome = TickOutcome::Degraded(missing.clone());

                self.buffer.add(StatsReading::Partial { stats, missing }.into_sample());
                outcome
            },
            Err(StatsError::NotReady(e)) => {
                debug!("container stats not ready: {e}");
                TickOutcome::NotReady
            },
            Err(e @ StatsError::Failure(_)) => {
                warn!("error getting container stats: {e}");
                TickOutcome::Failed
            },
        }
    }

    /// Whether the owner has cancelled the sampler, without waiting
    ///
    /// A dropped cancel sender means the owner is gone, which is treated as
    /// a cancellation
    fn is_cancelled(&self) -> bool {
        !matches!(self.cancel_channel.has_changed(), Ok(false))
    }

    /// Count the outcome of a tick
    fn record_outcome_metrics(&self, outcome: &TickOutcome) {
        let metric = match outcome {
            TickOutcome::Recorded => NUM_STATS_SAMPLES_RECORDED_METRIC,
            TickOutcome::Degraded(_) => NUM_STATS_SAMPLES_DEGRADED_METRIC,
            TickOutcome::NotReady => NUM_STATS_SAMPLES_NOT_READY_METRIC,
            TickOutcome::Failed => NUM_STATS_SAMPLE_FAILURES_METRIC,
        };

        metrics::counter!(metric, CONTAINER_ID_METRIC_TAG => self.container.docker_id.clone())
            .increment(1);
    }
}

// ----------
// | Handle |
// ----------

/// A handle on a running sampler, pairing its cancel channel with the task
/// whose exit acknowledges the cancellation
///
/// Dropping the handle cancels the sampler
#[derive(Debug)]
pub struct SamplerHandle {
    /// The sending side of the sampler's cancel channel
    cancel: CancelSender,
    /// The sampling task, taken once joined
    join_handle: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Spawn a sampler for the given container onto the current tokio runtime
    ///
    /// Returns immediately, the first tick runs in the background. Fails if
    /// called outside of a tokio runtime
    pub fn spawn(
        container: ContainerHandle,
        supplier: Arc<dyn StatsSupplier>,
        clock: Arc<dyn Clock>,
        buffer: StatsBuffer,
        sample_interval: Duration,
    ) -> Result<Self, SamplerError> {
        if sample_interval.is_zero() {
            return Err(SamplerError::InvalidConfiguration(ERR_ZERO_INTERVAL.to_string()));
        }
        let runtime = Handle::try_current().map_err(err_str!(SamplerError::TaskFailed))?;

        let (cancel, cancel_channel) = new_cancel_channel();
        let span = info_span!("stats_sampler", container = %container.docker_id);
        let executor = StatsSamplerExecutor::new(StatsSamplerConfig {
            container,
            supplier,
            clock,
            buffer,
            sample_interval,
            cancel_channel,
        });

        let join_handle = runtime.spawn(executor.execution_loop().instrument(span));
        Ok(Self { cancel, join_handle: Some(join_handle) })
    }

    /// Signal the sampler to stop
    ///
    /// Does not wait for the loop to exit; see [`SamplerHandle::join`].
    /// Calling this more than once has no further effect
    pub fn stop(&self) {
        // The receiver is gone if the loop already exited
        let _ = self.cancel.send(());
    }

    /// Wait for the sampling loop to exit
    ///
    /// Once this returns the sampler will not write to its buffer again
    pub async fn join(&mut self) -> Result<(), SamplerError> {
        match self.join_handle.take() {
            Some(handle) => handle.await.map_err(err_str!(SamplerError::TaskFailed)),
            None => Ok(()),
        }
    }

    /// Stop the sampler and wait for it to exit
    pub async fn shutdown(&mut self) -> Result<(), SamplerError> {
        self.stop();
        self.join().await
    }

    /// The current state of the sampler
    pub fn state(&self) -> SamplerState {
        match &self.join_handle {
            Some(handle) if !handle.is_finished() => SamplerState::Running,
            _ => SamplerState::Stopped,
        }
    }
}
