//! Starts and stops sampling for containers, owning each container's buffer
//! and sampler for as long as it is tracked
//!
//! The tracker's registry is only touched when a container is tracked,
//! untracked, or looked up; samplers never take its lock

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLockReadGuard, RwLockWriteGuard},
};

use common::{
    Shared, new_shared,
    types::{ContainerHandle, ContainerId, ContainerStats},
};
use config::{SamplerConfig, validation::validate_sampler_config};
use system_clock::{Clock, SystemClock};
use tracing::{error, info};

use crate::{
    buffer::StatsBuffer,
    error::SamplerError,
    labels::NUM_TRACKED_CONTAINERS_METRIC,
    sampler::{SamplerHandle, SamplerState},
    supplier::StatsSupplier,
};

/// A container whose stats are being sampled
#[derive(Debug)]
struct TrackedContainer {
    /// The container's handle, as given to the supplier
    container: ContainerHandle,
    /// The container's sample history
    buffer: StatsBuffer,
    /// The container's sampler
    sampler: SamplerHandle,
}

/// The registry of tracked containers, indexed by docker ID
type ContainerRegistry = HashMap<ContainerId, TrackedContainer>;

/// Tracks the resource usage history of a set of containers
#[derive(Clone)]
pub struct StatsTracker {
    /// The pacing and retention applied to every container
    config: SamplerConfig,
    /// The supplier from which every sampler reads stats
    supplier: Arc<dyn StatsSupplier>,
    /// The clock every sampler waits on
    clock: Arc<dyn Clock>,
    /// The tracked containers
    containers: Shared<ContainerRegistry>,
}

impl StatsTracker {
    /// Constructor
    ///
    /// Fails if the config specifies a zero interval or capacity
    pub fn new(
        config: SamplerConfig,
        supplier: Arc<dyn StatsSupplier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SamplerError> {
        validate_sampler_config(&config).map_err(SamplerError::InvalidConfiguration)?;
        Ok(Self { config, supplier, clock, containers: new_shared(HashMap::new()) })
    }

    /// Construct a tracker whose samplers wait on the system clock
    pub fn with_system_clock(
        config: SamplerConfig,
        supplier: Arc<dyn StatsSupplier>,
    ) -> Result<Self, SamplerError> {
        Self::new(config, supplier, Arc::new(SystemClock::new()))
    }

    /// The sampler configuration applied to every container
    pub fn config(&self) -> SamplerConfig {
        self.config
    }

    // -------------
    // | Lifecycle |
    // -------------

    /// Begin sampling the given container
    ///
    /// Allocates the container's buffer, starts its sampler, and returns a
    /// handle on the buffer. Fails if called outside of a tokio runtime
    pub fn track(&self, container: ContainerHandle) -> Result<StatsBuffer, SamplerError> {
        let mut containers = self.write_containers();
        if containers.contains_key(&container.docker_id) {
            return Err(SamplerError::AlreadyTracked(container.docker_id));
        }

        let buffer = StatsBuffer::new(self.config.buffer_capacity)?;
        let sampler = SamplerHandle::spawn(
            container.clone(),
            self.supplier.clone(),
            self.clock.clone(),
            buffer.clone(),
            self.config.sample_interval,
        )?;

        info!(container = %container.docker_id, "tracking container stats");
        let docker_id = container.docker_id.clone();
        containers.insert(docker_id, TrackedContainer { container, buffer: buffer.clone(), sampler });
        record_tracked_count(containers.len());

        Ok(buffer)
    }

    /// Stop sampling the given container and release its history
    ///
    /// Waits for the container's sampler to exit before returning
    pub async fn untrack(&self, docker_id: &str) -> Result<(), SamplerError> {
        let tracked = {
            let mut containers = self.write_containers();
            let tracked = containers.remove(docker_id);
            record_tracked_count(containers.len());
            tracked
        }
        .ok_or_else(|| SamplerError::NotTracked(docker_id.to_string()))?;

        Self::release(tracked).await
    }

    /// Stop sampling every tracked container
    pub async fn stop_all(&self) {
        let tracked: Vec<TrackedContainer> = {
            let mut containers = self.write_containers();
            let drained = containers.drain().map(|(_, tracked)| tracked).collect();
            record_tracked_count(containers.len());
            drained
        };

        for container in tracked {
            if let Err(e) = Self::release(container).await {
                error!("error stopping stats sampler: {e}");
            }
        }
    }

    // -----------
    // | Getters |
    // -----------

    /// Whether the given container is tracked
    pub fn is_tracked(&self, docker_id: &str) -> bool {
        self.read_containers().contains_key(docker_id)
    }

    /// The number of tracked containers
    pub fn num_tracked(&self) -> usize {
        self.read_containers().len()
    }

    /// The docker IDs of every tracked container
    pub fn tracked_ids(&self) -> Vec<ContainerId> {
        self.read_containers().keys().cloned().collect()
    }

    /// The handle of a tracked container
    pub fn container(&self, docker_id: &str) -> Option<ContainerHandle> {
        self.read_containers().get(docker_id).map(|tracked| tracked.container.clone())
    }

    /// A handle on the sample history of a tracked container
    pub fn buffer(&self, docker_id: &str) -> Option<StatsBuffer> {
        self.read_containers().get(docker_id).map(|tracked| tracked.buffer.clone())
    }

    /// The retained samples of a tracked container, oldest first
    pub fn snapshot(&self, docker_id: &str) -> Option<Vec<ContainerStats>> {
        self.buffer(docker_id).map(|buffer| buffer.snapshot())
    }

    /// The state of a tracked container's sampler
    pub fn sampler_state(&self, docker_id: &str) -> Option<SamplerState> {
        self.read_containers().get(docker_id).map(|tracked| tracked.sampler.state())
    }

    // -----------
    // | Helpers |
    // -----------

    /// Stop a container's sampler and wait for it to exit, then drop its
    /// resources
    async fn release(mut tracked: TrackedContainer) -> Result<(), SamplerError> {
        tracked.sampler.shutdown().await?;
        info!(container = %tracked.container.docker_id, "stopped tracking container stats");

        Ok(())
    }

    /// Acquire a read lock on the registry
    fn read_containers(&self) -> RwLockReadGuard<'_, ContainerRegistry> {
        self.containers.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire a write lock on the registry
    fn write_containers(&self) -> RwLockWriteGuard<'_, ContainerRegistry> {
        self.containers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Record the number of tracked containers
fn record_tracked_count(n: usize) {
    metrics::gauge!(NUM_TRACKED_CONTAINERS_METRIC).set(n as f64);
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use common::types::ContainerHandle;
    use config::SamplerConfig;
    use system_clock::ManualClock;

    use super::StatsTracker;
    use crate::{
        error::SamplerError,
        sampler::SamplerState,
        supplier::{MockStatsSupplier, StatsError},
    };

    /// The docker graph path used in tests
    const GRAPH_PATH: &str = "/var/lib/docker";

    /// Build a container handle for the given ID
    fn container(id: &str) -> ContainerHandle {
        ContainerHandle::new(id, GRAPH_PATH)
    }

    /// Build a tracker over the given supplier, driven by the system clock
    fn system_tracker(supplier: Arc<MockStatsSupplier>, capacity: usize) -> StatsTracker {
        let config = SamplerConfig::new(Duration::from_millis(10), capacity);
        StatsTracker::with_system_clock(config, supplier).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let supplier = Arc::new(MockStatsSupplier::default());
        let clock = Arc::new(ManualClock::new());

        let zero_capacity = SamplerConfig::new(Duration::from_millis(10), 0);
        let res = StatsTracker::new(zero_capacity, supplier.clone(), clock.clone());
        assert!(matches!(res, Err(SamplerError::InvalidConfiguration(_))));

        let zero_interval = SamplerConfig::new(Duration::ZERO, 10);
        let res = StatsTracker::new(zero_interval, supplier, clock);
        assert!(matches!(res, Err(SamplerError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_default_config() {
        let supplier = Arc::new(MockStatsSupplier::default());
        let tracker = StatsTracker::with_system_clock(SamplerConfig::default(), supplier).unwrap();

        assert_eq!(tracker.config().sample_interval, Duration::from_millis(500));
        assert_eq!(tracker.config().buffer_capacity, 240);
    }

    /// Tests tracking and untracking a single container
    #[tokio::test(start_paused = true)]
    async fn test_track_untrack() {
        let supplier = Arc::new(MockStatsSupplier::default());
        let tracker = system_tracker(supplier.clone(), 1_000);

        let buffer = tracker.track(container("web")).unwrap();
        assert!(tracker.is_tracked("web"));
        assert_eq!(tracker.tracked_ids(), vec!["web".to_string()]);
        assert_eq!(tracker.sampler_state("web"), Some(SamplerState::Running));
        assert_eq!(tracker.container("web"), Some(container("web")));

        tokio::time::sleep(Duration::from_millis(55)).await;
        assert_eq!(tracker.snapshot("web").unwrap().len(), 6);

        tracker.untrack("web").await.unwrap();
        assert!(!tracker.is_tracked("web"));
        assert_eq!(tracker.snapshot("web"), None);

        // The sampler has exited, so the caller's handle stops growing
        let calls = supplier.num_calls();
        let len = buffer.len();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(supplier.num_calls(), calls);
        assert_eq!(buffer.len(), len);
    }

    #[tokio::test]
    async fn test_double_track_rejected() {
        let tracker = system_tracker(Arc::new(MockStatsSupplier::default()), 10);
        tracker.track(container("web")).unwrap();

        let res = tracker.track(container("web"));
        assert!(matches!(res, Err(SamplerError::AlreadyTracked(id)) if id == "web"));
        assert_eq!(tracker.num_tracked(), 1);

        tracker.stop_all().await;
    }

    /// Tests that untracking twice is safe
    #[tokio::test]
    async fn test_double_untrack() {
        let tracker = system_tracker(Arc::new(MockStatsSupplier::default()), 10);
        tracker.track(container("web")).unwrap();

        tracker.untrack("web").await.unwrap();
        let res = tracker.untrack("web").await;
        assert!(matches!(res, Err(SamplerError::NotTracked(id)) if id == "web"));
    }

    /// Tests that containers are sampled independently of one another
    #[tokio::test(start_paused = true)]
    async fn test_independent_containers() {
        let tracker = system_tracker(Arc::new(MockStatsSupplier::default()), 3);
        let web = tracker.track(container("web")).unwrap();
        let db = tracker.track(container("db")).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(web.len(), 3);
        assert_eq!(db.len(), 3);

        tracker.untrack("db").await.unwrap();
        assert!(tracker.is_tracked("web"));
        assert_eq!(tracker.sampler_state("web"), Some(SamplerState::Running));

        tracker.stop_all().await;
        assert_eq!(tracker.num_tracked(), 0);
    }

    /// Tests that a container that never becomes ready stays tracked with an
    /// empty history
    #[tokio::test]
    async fn test_never_ready_container() {
        let script: Vec<_> =
            (0..5).map(|_| Err(StatsError::NotReady("no state file".to_string()))).collect();
        let supplier = Arc::new(MockStatsSupplier::new(script));
        let clock = ManualClock::new();
        let config = SamplerConfig::new(Duration::from_millis(500), 10);
        let tracker = StatsTracker::new(config, supplier.clone(), Arc::new(clock.clone())).unwrap();

        tracker.track(container("web")).unwrap();
        for _ in 0..4 {
            clock.advance().await;
        }
        clock.wait_for_sleeper().await;

        assert_eq!(supplier.num_calls(), 5);
        assert_eq!(tracker.snapshot("web"), Some(vec![]));
        assert_eq!(tracker.sampler_state("web"), Some(SamplerState::Running));

        tracker.untrack("web").await.unwrap();
    }
}
