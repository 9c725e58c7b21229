// Poll Driver - refreshes every active server-tracked job once per heartbeat
//
// Requests for distinct jobs run concurrently; each response is merged the
// moment it arrives, so one slow job never holds back the others. A failed
// request marks only its own job failed and is not retried.

use crate::application::events::{ClientEvent, Dispatched, Dispatcher};
use crate::application::timer::{HeartbeatTarget, TickControl};
use crate::application::JobStore;
use crate::domain::JobId;
use crate::port::{BackendError, RecognitionBackend};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Summary of one refresh cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Status requests sent
    pub polled: usize,
    /// Responses merged
    pub refreshed: usize,
    /// Jobs marked failed by a transport error or unknown id
    pub failed: usize,
    /// Jobs that reached a terminal status in this cycle
    pub newly_terminal: Vec<JobId>,
    /// Pollable work remains after the cycle
    pub still_active: bool,
}

impl CycleReport {
    /// Heartbeat decision for this cycle
    pub fn control(&self) -> TickControl {
        if self.still_active {
            TickControl::Continue
        } else {
            TickControl::Stop
        }
    }
}

/// Poll Driver
pub struct PollDriver {
    store: Arc<JobStore>,
    backend: Arc<dyn RecognitionBackend>,
    dispatcher: Arc<Dispatcher>,
}

impl PollDriver {
    pub fn new(
        store: Arc<JobStore>,
        backend: Arc<dyn RecognitionBackend>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            store,
            backend,
            dispatcher,
        }
    }

    /// Any active job the heartbeat has to keep refreshing
    pub fn has_pollable_work(&self) -> bool {
        self.store.has_pollable_active()
    }

    /// One refresh cycle over all active server-tracked jobs
    pub async fn refresh_cycle(&self) -> CycleReport {
        let targets = self.store.pollable_active_ids();
        let mut report = CycleReport {
            polled: targets.len(),
            ..Default::default()
        };
        if targets.is_empty() {
            return report;
        }

        debug!(jobs = targets.len(), "Refreshing active jobs");
        if let Err(e) = self.dispatcher.dispatch(ClientEvent::CycleStarted) {
            warn!(error = %e, "Failed to open refresh cycle");
        }

        let mut in_flight: FuturesUnordered<_> = targets
            .into_iter()
            .filter_map(|job_id| {
                let remote = job_id.remote_id()?.to_string();
                let backend = Arc::clone(&self.backend);
                Some(async move {
                    let answer = backend.job_status(&remote).await;
                    (job_id, answer)
                })
            })
            .collect();

        while let Some((job_id, answer)) = in_flight.next().await {
            let event = match answer {
                Ok(snapshot) => {
                    report.refreshed += 1;
                    ClientEvent::StatusRefreshed {
                        job_id: job_id.clone(),
                        update: snapshot.into_update(),
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    match &e {
                        BackendError::NotFound(_) => {
                            warn!(job_id = %job_id, "Backend no longer knows the job")
                        }
                        _ => warn!(job_id = %job_id, error = %e, "Status refresh failed"),
                    }
                    ClientEvent::TransportFailed {
                        job_id: job_id.clone(),
                        reason: e.reason(),
                    }
                }
            };

            match self.dispatcher.dispatch(event) {
                Ok(Dispatched::Merged(outcome)) if outcome.became_terminal => {
                    report.newly_terminal.push(job_id);
                }
                Ok(_) => {}
                Err(e) => warn!(job_id = %job_id, error = %e, "Refresh result dropped"),
            }
        }

        if let Err(e) = self.dispatcher.dispatch(ClientEvent::CycleCompleted) {
            warn!(error = %e, "Failed to close refresh cycle");
        }

        report.still_active = self.store.has_pollable_active();
        if !report.newly_terminal.is_empty() {
            info!(
                finished = report.newly_terminal.len(),
                still_active = report.still_active,
                "Refresh cycle finished jobs"
            );
        }
        report
    }
}

#[async_trait]
impl HeartbeatTarget for PollDriver {
    async fn on_heartbeat(&self) -> TickControl {
        self.refresh_cycle().await.control()
    }

    fn is_idle(&self) -> bool {
        !self.has_pollable_work()
    }

    fn on_stopped(&self) {
        if let Err(e) = self.dispatcher.dispatch(ClientEvent::HeartbeatStopped) {
            warn!(error = %e, "Failed to publish heartbeat stop");
        }
    }
}
