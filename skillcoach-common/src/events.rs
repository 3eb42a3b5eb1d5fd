//! Client event system
//!
//! Long-running client activities (analysis polling, voice recording,
//! uploads) report progress as [`ClientEvent`]s on an [`EventBus`]. Front
//! ends subscribe to render status without being coupled to the loops.

use crate::api::TaskStatus;
use crate::SkillScores;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// SkillCoach client event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Polled task reported a status different from the previous poll
    TaskStatusChanged {
        task_id: String,
        status: TaskStatus,
        timestamp: DateTime<Utc>,
    },

    /// Task finished with scores
    TaskCompleted {
        task_id: String,
        scores: SkillScores,
        timestamp: DateTime<Utc>,
    },

    /// Task finished without scores
    TaskFailed {
        task_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A single poll failed; polling continues
    PollError {
        task_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Polling gave up on an error that retrying cannot fix (unknown task,
    /// expired session). `status` is the HTTP status when the backend answered.
    PollAborted {
        task_id: String,
        status: Option<u16>,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Polling stopped before a terminal status (replaced or cancelled)
    TaskAbandoned {
        task_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Microphone capture began
    RecordingStarted {
        device: String,
        sample_rate: u32,
        timestamp: DateTime<Utc>,
    },

    /// Microphone capture ended
    RecordingStopped {
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Voice upload answered by the backend
    UploadCompleted {
        endpoint: String,
        bytes: usize,
        timestamp: DateTime<Utc>,
    },
}

impl ClientEvent {
    /// Task id for task-related events
    pub fn task_id(&self) -> Option<&str> {
        match self {
            ClientEvent::TaskStatusChanged { task_id, .. }
            | ClientEvent::TaskCompleted { task_id, .. }
            | ClientEvent::TaskFailed { task_id, .. }
            | ClientEvent::PollError { task_id, .. }
            | ClientEvent::PollAborted { task_id, .. }
            | ClientEvent::TaskAbandoned { task_id, .. } => Some(task_id),
            _ => None,
        }
    }
}

/// Broadcast bus for client events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ClientEvent,
    ) -> Result<usize, broadcast::error::SendError<ClientEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
