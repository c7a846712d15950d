//! A clock that only advances when a test tells it to
//!
//! Each call to `sleep` parks the caller until the controlling test releases
//! it with [`ManualClock::advance`]. The requested duration is ignored, so a
//! test can step a periodic worker one tick at a time

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{
    Mutex,
    mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    oneshot::{self, Sender as OneshotSender},
};

use crate::Clock;

/// The queue of parked sleepers, in the order they began sleeping
struct SleeperQueue {
    /// Sleepers that have not yet been observed by the controller
    queue: UnboundedReceiver<OneshotSender<()>>,
    /// A sleeper the controller has observed but not yet released
    parked: Option<OneshotSender<()>>,
}

/// A manually stepped clock
#[derive(Clone)]
pub struct ManualClock {
    /// The channel on which sleepers register their wakeup handle
    sleeper_tx: UnboundedSender<OneshotSender<()>>,
    /// The controller's view of the parked sleepers
    sleepers: Arc<Mutex<SleeperQueue>>,
    /// The total number of times `sleep` has been called
    num_sleeps: Arc<AtomicU64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Constructor
    pub fn new() -> Self {
        let (sleeper_tx, queue) = unbounded_channel();
        let sleepers = SleeperQueue { queue, parked: None };

        Self {
            sleeper_tx,
            sleepers: Arc::new(Mutex::new(sleepers)),
            num_sleeps: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The number of times a worker has begun sleeping on this clock
    pub fn num_sleeps(&self) -> u64 {
        self.num_sleeps.load(Ordering::SeqCst)
    }

    /// Wait until some worker is sleeping on the clock, without releasing it
    pub async fn wait_for_sleeper(&self) {
        let mut sleepers = self.sleepers.lock().await;
        if sleepers.parked.is_none() {
            sleepers.parked = sleepers.queue.recv().await;
        }
    }

    /// Wait until some worker is sleeping on the clock, then release it
    pub async fn advance(&self) {
        let mut sleepers = self.sleepers.lock().await;
        let next = match sleepers.parked.take() {
            Some(sleeper) => Some(sleeper),
            None => sleepers.queue.recv().await,
        };

        // The sleeper may have been dropped by a cancelled worker
        if let Some(sleeper) = next {
            let _ = sleeper.send(());
        }
    }
}

#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, _duration: Duration) {
        let (wake_tx, wake_rx) = oneshot::channel();
        self.num_sleeps.fetch_add(1, Ordering::SeqCst);
        if self.sleeper_tx.send(wake_tx).is_err() {
            return;
        }

        let _ = wake_rx.await;
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::ManualClock;
    use crate::Clock;

    /// Tests that a sleeper stays parked until the clock is advanced
    #[tokio::test]
    async fn test_sleeper_released_on_advance() {
        let clock = ManualClock::new();
        let worker_clock = clock.clone();
        let handle = tokio::spawn(async move {
            worker_clock.sleep(Duration::from_secs(3600)).await;
        });

        clock.wait_for_sleeper().await;
        assert_eq!(clock.num_sleeps(), 1);
        assert!(!handle.is_finished());

        clock.advance().await;
        handle.await.unwrap();
    }

    /// Tests stepping a looping worker a fixed number of ticks
    #[tokio::test]
    async fn test_step_loop() {
        let clock = ManualClock::new();
        let worker_clock = clock.clone();
        let (tick_tx, mut tick_rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(async move {
            for i in 0..u64::MAX {
                tick_tx.send(i).unwrap();
                worker_clock.sleep(Duration::from_millis(500)).await;
            }
        });

        for _ in 0..3 {
            clock.advance().await;
        }
        clock.wait_for_sleeper().await;

        let mut ticks = Vec::new();
        while let Ok(tick) = tick_rx.try_recv() {
            ticks.push(tick);
        }
        assert_eq!(ticks, vec![0, 1, 2, 3]);
    }
}
