// Client events and the dispatcher that applies them
//
// Every state change of a session goes through `Dispatcher::dispatch`:
// job creation, merges, transport failures, ticker ticks and focus changes.
// Dispatch is synchronous; applied changes are rebroadcast as notifications.

use crate::application::presenter::{FocusTracker, LiveDurations};
use crate::application::timer::{TickControl, TimerRegistry};
use crate::application::JobStore;
use crate::domain::{Job, JobId, JobStatus, JobUpdate, MergeOutcome, SubmittedFile};
use crate::error::{AppError, Result};
use crate::port::TimeProvider;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Input to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Insert a job and start its duration ticker
    JobCreated {
        job_id: JobId,
        files: Vec<SubmittedFile>,
        status: JobStatus,
        message: Option<String>,
    },
    /// Backend answer for a job
    StatusRefreshed { job_id: JobId, update: JobUpdate },
    /// Request for a job never completed (or was rejected)
    TransportFailed { job_id: JobId, reason: String },
    /// Duration ticker fired
    TimerTick { job_id: JobId },
    /// Start of a heartbeat refresh cycle
    CycleStarted,
    /// End of a heartbeat refresh cycle
    CycleCompleted,
    /// Explicit user selection
    FocusRequested { job_id: JobId },
    HeartbeatStopped,
}

/// Output of the dispatcher, one per applied change
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    JobChanged {
        job_id: JobId,
        status: JobStatus,
        became_terminal: bool,
    },
    Elapsed {
        job_id: JobId,
        elapsed_ms: f64,
    },
    FocusChanged {
        job_id: JobId,
    },
    HeartbeatStopped,
}

/// What a dispatch did
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Created(Job),
    Merged(MergeOutcome),
    Ticked(TickControl),
    Done,
}

/// Single dispatch point of a session
pub struct Dispatcher {
    store: Arc<JobStore>,
    timers: Arc<TimerRegistry>,
    clock: Arc<dyn TimeProvider>,
    live: LiveDurations,
    focus: Mutex<FocusTracker>,
    ticker_interval: Duration,
    notifications: broadcast::Sender<Notification>,
    this: Weak<Dispatcher>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<JobStore>,
        timers: Arc<TimerRegistry>,
        clock: Arc<dyn TimeProvider>,
        live: LiveDurations,
        ticker_interval: Duration,
        notification_capacity: usize,
    ) -> Arc<Self> {
        let (notifications, _) = broadcast::channel(notification_capacity);
        Arc::new_cyclic(|this| Self {
            store,
            timers,
            clock,
            live,
            focus: Mutex::new(FocusTracker::new()),
            ticker_interval,
            notifications,
            this: this.clone(),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn focused(&self) -> Option<JobId> {
        self.focus().focused().cloned()
    }

    fn focus(&self) -> MutexGuard<'_, FocusTracker> {
        self.focus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, notification: Notification) {
        // no receiver is fine
        let _ = self.notifications.send(notification);
    }

    /// Apply one event
    ///
    /// # Errors
    /// - AppError::Conflict for a duplicate job id
    /// - AppError::NotFound for events about unknown jobs
    pub fn dispatch(&self, event: ClientEvent) -> Result<Dispatched> {
        match event {
            ClientEvent::JobCreated {
                job_id,
                files,
                status,
                message,
            } => self.on_created(job_id, files, status, message),
            ClientEvent::StatusRefreshed { job_id, update } => self.on_update(&job_id, update),
            ClientEvent::TransportFailed { job_id, reason } => {
                let update = JobUpdate::failed(reason, self.clock.now_millis());
                self.on_update(&job_id, update)
            }
            ClientEvent::TimerTick { job_id } => Ok(Dispatched::Ticked(self.on_tick(&job_id))),
            ClientEvent::CycleStarted => {
                self.focus().begin_batch();
                Ok(Dispatched::Done)
            }
            ClientEvent::CycleCompleted => {
                let (before, after) = {
                    let mut focus = self.focus();
                    let before = focus.focused().cloned();
                    let after = focus.end_batch().cloned();
                    (before, after)
                };
                if let Some(job_id) = after.filter(|after| before.as_ref() != Some(after)) {
                    self.notify(Notification::FocusChanged { job_id });
                }
                Ok(Dispatched::Done)
            }
            ClientEvent::FocusRequested { job_id } => {
                if self.store.get(&job_id).is_none() {
                    return Err(AppError::NotFound(format!("Job {} not found", job_id)));
                }
                self.focus().select(job_id.clone());
                self.notify(Notification::FocusChanged { job_id });
                Ok(Dispatched::Done)
            }
            ClientEvent::HeartbeatStopped => {
                self.notify(Notification::HeartbeatStopped);
                Ok(Dispatched::Done)
            }
        }
    }

    fn on_created(
        &self,
        job_id: JobId,
        files: Vec<SubmittedFile>,
        status: JobStatus,
        message: Option<String>,
    ) -> Result<Dispatched> {
        let mut job = self.store.create(job_id.clone(), files, status)?;
        if let Some(message) = message {
            self.store
                .merge_status(&job_id, JobUpdate::default().with_message(message.clone()))?;
            job.message = Some(message);
        }

        let dispatcher = self.this.clone();
        let ticking = job_id.clone();
        self.timers
            .start_ticker(job_id.clone(), self.ticker_interval, move || {
                match dispatcher.upgrade() {
                    Some(dispatcher) => match dispatcher.dispatch(ClientEvent::TimerTick {
                        job_id: ticking.clone(),
                    }) {
                        Ok(Dispatched::Ticked(control)) => control,
                        _ => TickControl::Stop,
                    },
                    None => TickControl::Stop,
                }
            });

        self.notify(Notification::JobChanged {
            job_id,
            status: job.status,
            became_terminal: false,
        });
        Ok(Dispatched::Created(job))
    }

    fn on_update(&self, job_id: &JobId, update: JobUpdate) -> Result<Dispatched> {
        let outcome = self.store.merge_status(job_id, update)?;

        if outcome.became_terminal {
            self.timers.stop_ticker(job_id);
            self.live.remove(job_id);
            self.offer_focus(job_id);
        }

        if outcome.became_terminal || outcome.previous != outcome.current {
            self.notify(Notification::JobChanged {
                job_id: job_id.clone(),
                status: outcome.current,
                became_terminal: outcome.became_terminal,
            });
        } else {
            debug!(job_id = %job_id, status = %outcome.current, "Refresh without status change");
        }
        Ok(Dispatched::Merged(outcome))
    }

    fn offer_focus(&self, job_id: &JobId) {
        let Some(job) = self.store.get(job_id) else {
            return;
        };
        let position = self.store.position(job_id).unwrap_or_default();
        let ended_at = job.ended_at.unwrap_or(job.started_at);

        let focused_now = {
            let mut focus = self.focus();
            let before = focus.focused().cloned();
            focus.offer(job_id.clone(), ended_at, position);
            let after = focus.focused().cloned();
            after.filter(|after| before.as_ref() != Some(after))
        };
        if let Some(job_id) = focused_now {
            self.notify(Notification::FocusChanged { job_id });
        }
    }

    fn on_tick(&self, job_id: &JobId) -> TickControl {
        let Some(job) = self.store.get(job_id) else {
            warn!(job_id = %job_id, "Ticker fired for unknown job");
            return TickControl::Stop;
        };
        if job.is_terminal() {
            self.live.remove(job_id);
            return TickControl::Stop;
        }

        let elapsed_ms = (self.clock.now_millis() - job.started_at).max(0) as f64;
        self.live.publish(job_id, elapsed_ms);
        self.notify(Notification::Elapsed {
            job_id: job_id.clone(),
            elapsed_ms,
        });
        TickControl::Continue
    }
}
