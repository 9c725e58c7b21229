// Tracking Session - composition of store, timers, dispatcher and drivers
//
// A session lives as long as the client does. Dropping it (or calling
// `shutdown`) cancels every timer it started.

use crate::application::config::TrackerConfig;
use crate::application::constants::NOTIFICATION_CAPACITY;
use crate::application::events::{ClientEvent, Dispatcher, Notification};
use crate::application::poll_driver::PollDriver;
use crate::application::presenter::LiveDurations;
use crate::application::shutdown::ShutdownToken;
use crate::application::submission::{BatchInput, BatchReceipt, LocalFile, SubmissionService};
use crate::application::timer::{HeartbeatTarget, TimerRegistry};
use crate::application::JobStore;
use crate::domain::{Job, JobId};
use crate::error::Result;
use crate::port::{IdProvider, RecognitionBackend, TimeProvider};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info};

/// Tracking Session
pub struct TrackerSession {
    config: TrackerConfig,
    clock: Arc<dyn TimeProvider>,
    store: Arc<JobStore>,
    timers: Arc<TimerRegistry>,
    live: LiveDurations,
    dispatcher: Arc<Dispatcher>,
    poll_driver: Arc<PollDriver>,
    submissions: SubmissionService,
}

impl TrackerSession {
    pub fn new(
        config: TrackerConfig,
        backend: Arc<dyn RecognitionBackend>,
        clock: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        let config = config.normalized();
        let store = Arc::new(JobStore::new(Arc::clone(&clock)));
        let timers = Arc::new(TimerRegistry::new());
        let live = LiveDurations::new();
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::clone(&timers),
            Arc::clone(&clock),
            live.clone(),
            config.ticker_interval,
            NOTIFICATION_CAPACITY,
        );
        let poll_driver = Arc::new(PollDriver::new(
            Arc::clone(&store),
            Arc::clone(&backend),
            Arc::clone(&dispatcher),
        ));
        let submissions = SubmissionService::new(backend, Arc::clone(&dispatcher), id_provider);

        Self {
            config,
            clock,
            store,
            timers,
            live,
            dispatcher,
            poll_driver,
            submissions,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    pub fn live(&self) -> &LiveDurations {
        &self.live
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.dispatcher.subscribe()
    }

    /// Recognize one file synchronously; the job is never polled
    pub async fn submit_sync(&self, file: LocalFile, language: &str) -> Result<JobId> {
        self.submissions.submit_sync(file, language).await
    }

    /// Submit a batch; the heartbeat starts if it is not already running
    pub async fn submit_batch(&self, inputs: Vec<BatchInput>, language: &str) -> Result<BatchReceipt> {
        let receipt = self.submissions.submit_batch(inputs, language).await?;
        // job is in the store at this point, see TimerRegistry::start_heartbeat
        self.ensure_heartbeat();
        Ok(receipt)
    }

    pub async fn languages(&self) -> Result<BTreeMap<String, String>> {
        self.submissions.languages().await
    }

    /// Start the heartbeat if there is pollable work and none runs yet
    pub fn ensure_heartbeat(&self) -> bool {
        if !self.poll_driver.has_pollable_work() {
            return false;
        }
        let target: Arc<dyn HeartbeatTarget> = self.poll_driver.clone();
        self.timers.start_heartbeat(self.config.poll_interval, target)
    }

    /// Focus a job explicitly
    pub fn select(&self, job_id: &JobId) -> Result<()> {
        self.dispatcher.dispatch(ClientEvent::FocusRequested {
            job_id: job_id.clone(),
        })?;
        Ok(())
    }

    pub fn focused(&self) -> Option<Job> {
        self.dispatcher
            .focused()
            .and_then(|job_id| self.store.get(&job_id))
    }

    /// Jobs in dashboard order
    pub fn jobs(&self) -> Vec<Job> {
        self.store.list_sorted_by_submission()
    }

    /// Wait until no job is active. Returns false if teardown came first.
    pub async fn wait_until_idle(&self, mut shutdown: ShutdownToken) -> bool {
        let mut notifications = self.subscribe();
        loop {
            if !self.store.has_active() {
                return true;
            }
            if shutdown.is_shutdown() {
                return false;
            }
            tokio::select! {
                received = notifications.recv() => match received {
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => return !self.store.has_active(),
                },
                _ = shutdown.wait() => {
                    debug!("Idle wait interrupted by shutdown");
                    return false;
                }
            }
        }
    }

    /// Cancel every timer; the session accepts no new timers afterwards
    pub fn shutdown(&self) {
        let cancelled = self.timers.shutdown();
        info!(
            cancelled,
            jobs = self.store.len(),
            "Tracking session shut down"
        );
    }
}

impl Drop for TrackerSession {
    fn drop(&mut self) {
        if !self.timers.is_shut_down() {
            self.timers.shutdown();
        }
    }
}
