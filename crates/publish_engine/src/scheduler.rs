use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub type Tick = Box<dyn Fn() + Send + Sync>;

/// Shortest period `TokioScheduler` runs at; tokio intervals reject zero.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Repeating timer driving status polls. At most one interval runs at a time;
/// `start` replaces any running one.
pub trait Scheduler: Send + Sync {
    fn start(&self, every: Duration, tick: Tick);
    fn stop(&self);
}

/// Interval timer on the ambient tokio runtime.
#[derive(Default)]
pub struct TokioScheduler {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for TokioScheduler {
    /// Must be called from within a tokio runtime.
    fn start(&self, every: Duration, tick: Tick) {
        let every = every.max(MIN_INTERVAL);
        let handle = tokio::spawn(async move {
            // First tick fires after one full period, like a browser interval.
            let mut interval = interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });
        if let Some(previous) = self.slot().replace(handle) {
            previous.abort();
        }
    }

    fn stop(&self) {
        if let Some(task) = self.slot().take() {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scheduler that only ticks when told to, for deterministic tests and
/// step-by-step drivers.
#[derive(Default)]
pub struct ManualScheduler {
    active: Mutex<Option<(Duration, Arc<dyn Fn() + Send + Sync>)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the registered tick once. Returns false when nothing is running.
    pub fn fire(&self) -> bool {
        let tick = self.slot().as_ref().map(|(_, tick)| Arc::clone(tick));
        match tick {
            Some(tick) => {
                tick();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.slot().as_ref().map(|(every, _)| *every)
    }

    fn slot(&self) -> MutexGuard<'_, Option<(Duration, Arc<dyn Fn() + Send + Sync>)>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn start(&self, every: Duration, tick: Tick) {
        *self.slot() = Some((every, Arc::from(tick)));
    }

    fn stop(&self) {
        self.slot().take();
    }
}
