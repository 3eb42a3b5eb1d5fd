//! Analysis task polling
//!
//! Submissions return an opaque `task_id` for server-side scoring. The
//! poller fetches the task status on a fixed interval until it reaches
//! `completed` or `failed`, the caller cancels, or the deadline passes.
//!
//! [`PollSlot`] keeps at most one outstanding poll per view: tracking a new
//! task cancels the previous loop, and the abandoned task's outcome is never
//! delivered.

use crate::api::ApiClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use skillcoach_common::api::{AnalysisResult, AnalysisStatus, TaskStatus};
use skillcoach_common::config::ClientConfig;
use skillcoach_common::events::{ClientEvent, EventBus};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Anything that can report the status of an analysis task
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn task_status(&self, task_id: &str) -> Result<AnalysisStatus>;
}

/// Terminal result of a polled task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Scoring finished; rendered once, never re-polled
    Completed(AnalysisResult),
    /// Scoring failed server-side
    Failed { task_id: String },
}

impl TaskOutcome {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            TaskOutcome::Completed(result) => Some(result),
            TaskOutcome::Failed { .. } => None,
        }
    }
}

/// Polling cadence and deadline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollOptions {
    pub interval: Duration,
    /// `None` polls until a terminal status or cancellation
    pub timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl From<&ClientConfig> for PollOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.poll_timeout(),
        }
    }
}

/// Fixed-interval status poller
pub struct TaskPoller<S> {
    source: Arc<S>,
    options: PollOptions,
    events: EventBus,
}

impl<S> Clone for TaskPoller<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            options: self.options,
            events: self.events.clone(),
        }
    }
}

impl TaskPoller<ApiClient> {
    /// Poller using the client's configured interval, deadline and event bus
    pub fn for_client(client: Arc<ApiClient>) -> Self {
        let options = PollOptions::from(client.config());
        let events = client.events().clone();
        Self::new(client, options).with_events(events)
    }
}

impl<S: TaskStatusSource> TaskPoller<S> {
    pub fn new(source: Arc<S>, options: PollOptions) -> Self {
        Self {
            source,
            options,
            events: EventBus::default(),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn options(&self) -> PollOptions {
        self.options
    }

    /// Poll `task_id` until it finishes.
    ///
    /// The first request goes out one interval after the call. Transport
    /// failures and 5xx responses are logged and polling continues; other
    /// API errors (unknown task, expired session) end the loop with a
    /// `PollAborted` event, distinct from a server-side `failed`. Once the
    /// token is cancelled no further request is made and an in-flight
    /// response is discarded.
    pub async fn wait(&self, task_id: &str, cancel: &CancellationToken) -> Result<TaskOutcome> {
        let started = Instant::now();
        let deadline = self.options.timeout.map(|t| started + t);
        let mut ticker = tokio::time::interval_at(started + self.options.interval, self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_status: Option<TaskStatus> = None;

        debug!(task_id = %task_id, interval_ms = self.options.interval.as_millis() as u64, "Polling analysis task");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.abandon(task_id)),
                _ = sleep_until_deadline(deadline) => return Err(self.timed_out(task_id, started)),
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.abandon(task_id)),
                fetched = self.source.task_status(task_id) => fetched,
            };

            let status = match fetched {
                Ok(status) => status,
                Err(e) if e.is_transient() => {
                    warn!(task_id = %task_id, "Polling failed, will retry: {}", e);
                    self.events.emit_lossy(ClientEvent::PollError {
                        task_id: task_id.to_string(),
                        message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    continue;
                }
                Err(e) => return Err(self.aborted(task_id, e)),
            };

            if last_status.as_ref() != Some(&status.status) {
                debug!(task_id = %task_id, status = %status.status, "Task status changed");
                self.events.emit_lossy(ClientEvent::TaskStatusChanged {
                    task_id: task_id.to_string(),
                    status: status.status.clone(),
                    timestamp: Utc::now(),
                });
                last_status = Some(status.status.clone());
            }

            match status.status {
                TaskStatus::Completed => match status.result {
                    Some(result) => {
                        info!(task_id = %task_id, "Analysis completed");
                        self.events.emit_lossy(ClientEvent::TaskCompleted {
                            task_id: task_id.to_string(),
                            scores: result.scores.clone(),
                            timestamp: Utc::now(),
                        });
                        return Ok(TaskOutcome::Completed(result));
                    }
                    // Result row not visible yet
                    None => debug!(task_id = %task_id, "Completed without result, polling again"),
                },
                TaskStatus::Failed => {
                    warn!(task_id = %task_id, "Analysis failed");
                    self.events.emit_lossy(ClientEvent::TaskFailed {
                        task_id: task_id.to_string(),
                        timestamp: Utc::now(),
                    });
                    return Ok(TaskOutcome::Failed {
                        task_id: task_id.to_string(),
                    });
                }
                _ => {}
            }
        }
    }

    fn aborted(&self, task_id: &str, error: Error) -> Error {
        let status = match &error {
            Error::Api { status, .. } => Some(*status),
            Error::Unauthorized(_) => Some(401),
            _ => None,
        };
        warn!(task_id = %task_id, status = ?status, "Polling stopped: {}", error);
        self.events.emit_lossy(ClientEvent::PollAborted {
            task_id: task_id.to_string(),
            status,
            message: error.to_string(),
            timestamp: Utc::now(),
        });
        error
    }

    fn abandon(&self, task_id: &str) -> Error {
        debug!(task_id = %task_id, "Polling cancelled");
        self.events.emit_lossy(ClientEvent::TaskAbandoned {
            task_id: task_id.to_string(),
            timestamp: Utc::now(),
        });
        Error::Cancelled(task_id.to_string())
    }

    fn timed_out(&self, task_id: &str, started: Instant) -> Error {
        let waited_secs = started.elapsed().as_secs();
        warn!(task_id = %task_id, waited_secs, "Gave up waiting for analysis");
        self.events.emit_lossy(ClientEvent::TaskAbandoned {
            task_id: task_id.to_string(),
            timestamp: Utc::now(),
        });
        Error::PollTimeout {
            task_id: task_id.to_string(),
            waited_secs,
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Receiver side of a tracked task
pub struct PollHandle {
    task_id: String,
    rx: oneshot::Receiver<Result<TaskOutcome>>,
}

impl PollHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Wait for the outcome; a replaced or cancelled task yields `Cancelled`
    pub async fn outcome(self) -> Result<TaskOutcome> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::Cancelled(self.task_id)),
        }
    }
}

struct ActivePoll {
    task_id: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Single-task poll owner for one view
///
/// Dropping the slot cancels the outstanding poll.
pub struct PollSlot<S> {
    poller: TaskPoller<S>,
    current: Mutex<Option<ActivePoll>>,
}

impl<S: TaskStatusSource + 'static> PollSlot<S> {
    pub fn new(poller: TaskPoller<S>) -> Self {
        Self {
            poller,
            current: Mutex::new(None),
        }
    }

    /// Start polling `task_id`, abandoning whatever was tracked before
    pub fn track(&self, task_id: impl Into<String>) -> PollHandle {
        let task_id = task_id.into();
        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();

        let poller = self.poller.clone();
        let loop_id = task_id.clone();
        let loop_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let outcome = poller.wait(&loop_id, &loop_cancel).await;
            if !loop_cancel.is_cancelled() {
                let _ = tx.send(outcome);
            }
        });

        let previous = self.lock().replace(ActivePoll {
            task_id: task_id.clone(),
            cancel,
            handle,
        });
        if let Some(previous) = previous {
            debug!(old = %previous.task_id, new = %task_id, "Replacing tracked task");
            previous.cancel.cancel();
        }

        PollHandle { task_id, rx }
    }

    /// Task currently being polled, if its loop is still running
    pub fn current_task(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .filter(|active| !active.handle.is_finished())
            .map(|active| active.task_id.clone())
    }

    /// Stop polling (view closed)
    pub fn cancel(&self) {
        if let Some(active) = self.lock().take() {
            active.cancel.cancel();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActivePoll>> {
        // A poisoned lock only means a panic elsewhere; the slot data is still valid
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S> Drop for PollSlot<S> {
    fn drop(&mut self) {
        let current = match self.current.get_mut() {
            Ok(current) => current.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(active) = current {
            active.cancel.cancel();
        }
    }
}
