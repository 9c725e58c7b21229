// Timer Registry - owns every recurring timer of a session
//
// One heartbeat (shared by all server-tracked jobs) and at most one duration
// ticker per job. Starts are idempotent, stops are safe to repeat, and a
// timer that decides to stop releases only its own slot (generation check),
// never a successor started under the same key.

mod panic_guard;

pub use panic_guard::{execute_guarded, execute_guarded_async, PanicGuardResult};

use crate::domain::JobId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Decision returned by a timer callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Work driven by the heartbeat
#[async_trait]
pub trait HeartbeatTarget: Send + Sync {
    /// One heartbeat cycle
    async fn on_heartbeat(&self) -> TickControl;

    /// Re-checked under the registry lock before the heartbeat releases its
    /// slot; returning false keeps the heartbeat alive
    fn is_idle(&self) -> bool;

    /// Called once after the heartbeat released its slot
    fn on_stopped(&self) {}
}

struct TimerSlot {
    generation: u64,
    handle: JoinHandle<()>,
}

impl TimerSlot {
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

#[derive(Default)]
struct RegistryInner {
    heartbeat: Option<TimerSlot>,
    tickers: HashMap<JobId, TimerSlot>,
    next_generation: u64,
    closed: bool,
}

impl RegistryInner {
    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

fn lock(inner: &Mutex<RegistryInner>) -> MutexGuard<'_, RegistryInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Timer Registry
pub struct TimerRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner::default())),
        }
    }

    /// Start the shared heartbeat. No-op (returns false) if it already runs,
    /// the registry is shut down, the period is zero or there is no runtime.
    pub fn start_heartbeat(&self, period: Duration, target: Arc<dyn HeartbeatTarget>) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            warn!("Heartbeat not started: no async runtime");
            return false;
        };
        if period.is_zero() {
            warn!("Heartbeat not started: zero period");
            return false;
        }

        let mut inner = lock(&self.inner);
        if inner.closed {
            debug!("Heartbeat not started: registry shut down");
            return false;
        }
        if inner.heartbeat.as_ref().is_some_and(TimerSlot::is_live) {
            return false;
        }

        let generation = inner.next_generation();
        let registry = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(run_heartbeat(registry, generation, period, target));
        inner.heartbeat = Some(TimerSlot { generation, handle });

        info!(period_ms = period.as_millis() as u64, "Heartbeat started");
        true
    }

    /// Stop the heartbeat; false if none was running
    pub fn stop_heartbeat(&self) -> bool {
        let slot = lock(&self.inner).heartbeat.take();
        match slot {
            Some(slot) => {
                slot.handle.abort();
                info!("Heartbeat stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_heartbeat_running(&self) -> bool {
        lock(&self.inner)
            .heartbeat
            .as_ref()
            .is_some_and(TimerSlot::is_live)
    }

    /// Start the duration ticker of a job. No-op (returns false) if one
    /// already runs for this job.
    ///
    /// The first tick fires one period after the start.
    pub fn start_ticker<F>(&self, job_id: JobId, period: Duration, on_tick: F) -> bool
    where
        F: FnMut() -> TickControl + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!(job_id = %job_id, "Ticker not started: no async runtime");
            return false;
        };
        if period.is_zero() {
            warn!(job_id = %job_id, "Ticker not started: zero period");
            return false;
        }

        let mut inner = lock(&self.inner);
        if inner.closed {
            debug!(job_id = %job_id, "Ticker not started: registry shut down");
            return false;
        }
        if inner.tickers.get(&job_id).is_some_and(TimerSlot::is_live) {
            return false;
        }

        let generation = inner.next_generation();
        let registry = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(run_ticker(
            registry,
            job_id.clone(),
            generation,
            period,
            on_tick,
        ));
        inner.tickers.insert(job_id.clone(), TimerSlot { generation, handle });

        debug!(job_id = %job_id, "Ticker started");
        true
    }

    /// Stop a job's ticker; false if none was running
    pub fn stop_ticker(&self, job_id: &JobId) -> bool {
        let slot = lock(&self.inner).tickers.remove(job_id);
        match slot {
            Some(slot) => {
                slot.handle.abort();
                debug!(job_id = %job_id, "Ticker stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_ticking(&self, job_id: &JobId) -> bool {
        lock(&self.inner)
            .tickers
            .get(job_id)
            .is_some_and(TimerSlot::is_live)
    }

    /// Number of live duration tickers
    pub fn active_tickers(&self) -> usize {
        lock(&self.inner)
            .tickers
            .values()
            .filter(|slot| slot.is_live())
            .count()
    }

    /// Cancel every timer and refuse new ones. Returns how many were live.
    pub fn shutdown(&self) -> usize {
        let mut inner = lock(&self.inner);
        inner.closed = true;

        let mut cancelled = 0;
        if let Some(slot) = inner.heartbeat.take() {
            if slot.is_live() {
                cancelled += 1;
            }
            slot.handle.abort();
        }
        for (_, slot) in inner.tickers.drain() {
            if slot.is_live() {
                cancelled += 1;
            }
            slot.handle.abort();
        }

        if cancelled > 0 {
            info!(cancelled, "Timer registry shut down");
        }
        cancelled
    }

    pub fn is_shut_down(&self) -> bool {
        lock(&self.inner).closed
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Release the heartbeat slot if the target is still idle.
///
/// Runs under the registry lock, so a job created and followed by
/// `start_heartbeat` either is seen here (heartbeat continues) or finds the
/// slot already empty (and starts a fresh heartbeat).
fn release_heartbeat_if_idle(
    registry: &Mutex<RegistryInner>,
    generation: u64,
    target: &dyn HeartbeatTarget,
) -> bool {
    let mut inner = lock(registry);
    if !target.is_idle() {
        return false;
    }
    if inner
        .heartbeat
        .as_ref()
        .is_some_and(|slot| slot.generation == generation)
    {
        inner.heartbeat = None;
    }
    true
}

async fn run_heartbeat(
    registry: Weak<Mutex<RegistryInner>>,
    generation: u64,
    period: Duration,
    target: Arc<dyn HeartbeatTarget>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let control = match execute_guarded_async("heartbeat", target.on_heartbeat()).await {
            PanicGuardResult::Success(control) => control,
            PanicGuardResult::Panicked(_) => TickControl::Stop,
        };
        if control == TickControl::Continue {
            continue;
        }

        let Some(registry) = registry.upgrade() else {
            return;
        };
        if !release_heartbeat_if_idle(&registry, generation, target.as_ref()) {
            debug!("Heartbeat kept alive by new work");
            continue;
        }

        info!("Heartbeat stopped: no active server-tracked jobs");
        target.on_stopped();
        return;
    }
}

async fn run_ticker<F>(
    registry: Weak<Mutex<RegistryInner>>,
    job_id: JobId,
    generation: u64,
    period: Duration,
    mut on_tick: F,
) where
    F: FnMut() -> TickControl + Send + 'static,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // interval fires immediately; the first update is due one period later
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let control = match execute_guarded("ticker", &mut on_tick) {
            PanicGuardResult::Success(control) => control,
            PanicGuardResult::Panicked(_) => TickControl::Stop,
        };
        if control == TickControl::Continue {
            continue;
        }

        if let Some(registry) = registry.upgrade() {
            let mut inner = lock(&registry);
            if inner
                .tickers
                .get(&job_id)
                .is_some_and(|slot| slot.generation == generation)
            {
                inner.tickers.remove(&job_id);
            }
        }
        debug!(job_id = %job_id, "Ticker released itself");
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingTarget {
        beats: AtomicUsize,
        stop_after: usize,
        idle: AtomicBool,
        stopped: AtomicUsize,
    }

    impl CountingTarget {
        fn new(stop_after: usize) -> Arc<Self> {
            Arc::new(Self {
                beats: AtomicUsize::new(0),
                stop_after,
                idle: AtomicBool::new(true),
                stopped: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl HeartbeatTarget for CountingTarget {
        async fn on_heartbeat(&self) -> TickControl {
            let beats = self.beats.fetch_add(1, Ordering::SeqCst) + 1;
            if beats >= self.stop_after {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        }

        fn is_idle(&self) -> bool {
            self.idle.load(Ordering::SeqCst)
        }

        fn on_stopped(&self) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_start_is_idempotent() {
        let registry = TimerRegistry::new();
        let target = CountingTarget::new(usize::MAX);

        assert!(registry.start_heartbeat(Duration::from_millis(1000), target.clone()));
        assert!(!registry.start_heartbeat(Duration::from_millis(1000), target.clone()));

        // first beat is immediate, then one per second
        advance(2500).await;
        assert_eq!(target.beats.load(Ordering::SeqCst), 3);
        assert!(registry.is_heartbeat_running());

        assert!(registry.stop_heartbeat());
        assert!(!registry.stop_heartbeat());
        advance(3000).await;
        assert_eq!(target.beats.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_stops_itself_when_idle() {
        let registry = TimerRegistry::new();
        let target = CountingTarget::new(2);

        registry.start_heartbeat(Duration::from_millis(1000), target.clone());
        advance(1500).await;

        assert_eq!(target.beats.load(Ordering::SeqCst), 2);
        assert!(!registry.is_heartbeat_running());
        assert_eq!(target.stopped.load(Ordering::SeqCst), 1);

        // can be started again afterwards
        assert!(registry.start_heartbeat(Duration::from_millis(1000), target.clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_kept_alive_when_work_appears() {
        let registry = TimerRegistry::new();
        let target = CountingTarget::new(1);
        target.idle.store(false, Ordering::SeqCst);

        registry.start_heartbeat(Duration::from_millis(1000), target.clone());
        advance(2500).await;

        // every beat asked to stop, the idle re-check refused each time
        assert_eq!(target.beats.load(Ordering::SeqCst), 3);
        assert!(registry.is_heartbeat_running());
        assert_eq!(target.stopped.load(Ordering::SeqCst), 0);

        target.idle.store(true, Ordering::SeqCst);
        advance(1000).await;
        assert!(!registry.is_heartbeat_running());
        assert_eq!(target.stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_idempotent_and_stoppable() {
        let registry = TimerRegistry::new();
        let job = JobId::remote("job-1");
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = ticks.clone();
        assert!(registry.start_ticker(job.clone(), Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        }));
        let counter = ticks.clone();
        assert!(!registry.start_ticker(job.clone(), Duration::from_millis(100), move || {
            counter.fetch_add(100, Ordering::SeqCst);
            TickControl::Continue
        }));

        advance(350).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert_eq!(registry.active_tickers(), 1);

        assert!(registry.stop_ticker(&job));
        assert!(!registry.stop_ticker(&job));
        advance(500).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(!registry.is_ticking(&job));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_self_cancel_keeps_successor() {
        let registry = TimerRegistry::new();
        let job = JobId::remote("job-1");

        registry.start_ticker(job.clone(), Duration::from_millis(100), || TickControl::Stop);
        advance(150).await;
        assert!(!registry.is_ticking(&job));

        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        assert!(registry.start_ticker(job.clone(), Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        }));
        advance(250).await;
        assert!(registry.is_ticking(&job));
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_ticker_releases_slot() {
        let registry = TimerRegistry::new();
        let job = JobId::local("1");

        registry.start_ticker(job.clone(), Duration::from_millis(100), || panic!("tick failed"));
        advance(150).await;
        assert!(!registry.is_ticking(&job));
        assert_eq!(registry.active_tickers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_everything() {
        let registry = TimerRegistry::new();
        let target = CountingTarget::new(usize::MAX);
        registry.start_heartbeat(Duration::from_millis(1000), target.clone());
        registry.start_ticker(JobId::remote("a"), Duration::from_millis(100), || {
            TickControl::Continue
        });
        registry.start_ticker(JobId::remote("b"), Duration::from_millis(100), || {
            TickControl::Continue
        });
        advance(10).await;

        assert_eq!(registry.shutdown(), 3);
        assert_eq!(registry.active_tickers(), 0);
        assert!(!registry.is_heartbeat_running());
        assert!(!registry.start_ticker(JobId::remote("c"), Duration::from_millis(100), || {
            TickControl::Continue
        }));
        assert!(!registry.start_heartbeat(Duration::from_millis(1000), target));
    }

    #[test]
    fn test_start_without_runtime_is_refused() {
        let registry = TimerRegistry::new();
        assert!(!registry.start_ticker(JobId::remote("a"), Duration::from_millis(100), || {
            TickControl::Continue
        }));
        assert_eq!(registry.active_tickers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_refused() {
        let registry = TimerRegistry::new();
        let target = CountingTarget::new(usize::MAX);

        assert!(!registry.start_heartbeat(Duration::ZERO, target.clone()));
        assert!(!registry.is_heartbeat_running());
        assert!(!registry.start_ticker(JobId::remote("a"), Duration::ZERO, || {
            TickControl::Continue
        }));
        assert_eq!(registry.active_tickers(), 0);

        // a valid period still starts afterwards
        assert!(registry.start_heartbeat(Duration::from_millis(1000), target));
    }
}
