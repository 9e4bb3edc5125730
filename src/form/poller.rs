//! Background polling of `GET /api/agents/{name}/processing-status`.
//!
//! A `Poller` owns one spawned task per processing session. The task checks
//! once immediately, then on a fixed interval, and reports back over an
//! unbounded channel. Every event carries its session id so the controller
//! can drop anything a stopped session still manages to send.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::models::FileStatusEntry;
use crate::api::{AgentApi, AgentRecord, ProcessingStatus};

use super::staging::DisplayStatus;

pub type SessionId = u64;

#[derive(Debug)]
pub enum PollEvent {
    /// One successful status check.
    Status {
        session: SessionId,
        files: BTreeMap<String, FileStatusEntry>,
        any_processing: bool,
    },
    /// Processing finished; `record` is the re-fetched agent, if that worked.
    Completed {
        session: SessionId,
        record: Option<AgentRecord>,
    },
    /// Nothing was in flight when the session started; polling stopped.
    Idle { session: SessionId },
}

impl PollEvent {
    pub fn session(&self) -> SessionId {
        match self {
            PollEvent::Status { session, .. }
            | PollEvent::Completed { session, .. }
            | PollEvent::Idle { session } => *session,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Completed,
    Idle,
}

/// Detects the processing -> done edge across ticks.
///
/// `saw_processing` latches once any tick reports a pending/processing file
/// (or the session was started right after an upload) and only the first
/// tick that reports nothing in flight *and* `processing_complete` ends the
/// session.
#[derive(Debug, Clone)]
pub struct CompletionTracker {
    saw_processing: bool,
    finished: bool,
}

impl CompletionTracker {
    pub fn new(started_processing: bool) -> Self {
        Self {
            saw_processing: started_processing,
            finished: false,
        }
    }

    pub fn observe(&mut self, status: &ProcessingStatus) -> (bool, TickOutcome) {
        let any_processing = any_processing(status);
        if self.finished {
            return (any_processing, TickOutcome::Continue);
        }
        let outcome = if any_processing {
            self.saw_processing = true;
            TickOutcome::Continue
        } else if !self.saw_processing {
            self.finished = true;
            TickOutcome::Idle
        } else if status.processing_complete {
            self.finished = true;
            TickOutcome::Completed
        } else {
            TickOutcome::Continue
        };
        (any_processing, outcome)
    }
}

pub fn any_processing(status: &ProcessingStatus) -> bool {
    status
        .file_status
        .values()
        .any(|entry| DisplayStatus::parse(&entry.status).is_in_flight())
}

/// Handle to a running poll task. Dropping it stops the task.
pub struct Poller {
    session: SessionId,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn spawn(
        api: Arc<dyn AgentApi>,
        identifier: String,
        interval: Duration,
        session: SessionId,
        started_processing: bool,
        events: UnboundedSender<PollEvent>,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        debug!("starting processing session {} for {}", session, identifier);
        let handle = tokio::spawn(run(
            api,
            identifier,
            interval,
            session,
            CompletionTracker::new(started_processing),
            events,
            stop_rx,
        ));
        Self {
            session,
            stop_tx,
            handle,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    api: Arc<dyn AgentApi>,
    identifier: String,
    interval: Duration,
    session: SessionId,
    mut tracker: CompletionTracker,
    events: UnboundedSender<PollEvent>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        let status = match api.processing_status(&identifier).await {
            Ok(status) => status,
            Err(err) => {
                warn!("status check for {} failed: {}", identifier, err);
                continue;
            }
        };

        let (any_processing, outcome) = tracker.observe(&status);
        let update = PollEvent::Status {
            session,
            files: status.file_status,
            any_processing,
        };
        if events.send(update).is_err() {
            break;
        }

        match outcome {
            TickOutcome::Continue => {}
            TickOutcome::Idle => {
                debug!("session {}: nothing processing for {}", session, identifier);
                let _ = events.send(PollEvent::Idle { session });
                break;
            }
            TickOutcome::Completed => {
                info!("processing complete for {}", identifier);
                let record = match api.get_agent(&identifier).await {
                    Ok(record) => Some(record),
                    Err(err) => {
                        warn!("re-fetching {} after processing failed: {}", identifier, err);
                        None
                    }
                };
                let _ = events.send(PollEvent::Completed { session, record });
                break;
            }
        }
    }
}
