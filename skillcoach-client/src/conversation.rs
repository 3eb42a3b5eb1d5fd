//! Local conversation state for chat and simulations
//!
//! Voice turns are shown immediately as a pending placeholder; the backend
//! reply later fills in the recognized text and appends the partner's line.

use serde::{Deserialize, Serialize};
use skillcoach_common::api::{SimulationMessage, VoiceReply};
use std::fmt;
use uuid::Uuid;

/// Placeholder text of a voice turn awaiting recognition
pub const VOICE_PLACEHOLDER: &str = "(voice)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Speaker prefix in a submitted transcript
    pub fn speaker(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Partner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    /// Waiting for the backend to fill in the text
    pub pending: bool,
    /// Analysis task started by this message, if any
    pub task_id: Option<String>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            pending: false,
            task_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Append a typed user line; returns its id
    pub fn push_user(&mut self, text: impl Into<String>) -> Uuid {
        self.push(Message::new(Role::User, text))
    }

    /// Append a partner line; returns its id
    pub fn push_assistant(&mut self, text: impl Into<String>) -> Uuid {
        self.push(Message::new(Role::Assistant, text))
    }

    /// Append a placeholder for a voice turn being uploaded
    pub fn push_pending_voice(&mut self) -> Uuid {
        let mut message = Message::new(Role::User, VOICE_PLACEHOLDER);
        message.pending = true;
        self.push(message)
    }

    /// Attach the result of a voice upload to the turn that sent it.
    ///
    /// The recognized text replaces the placeholder; the reply, when present,
    /// becomes a new partner message. Returns the id of that new message.
    pub fn apply_voice_reply(&mut self, origin_id: Uuid, reply: &VoiceReply) -> Option<Uuid> {
        if let Some(origin) = self.messages.iter_mut().find(|m| m.id == origin_id) {
            if let Some(text) = reply.recognized_text() {
                origin.text = text.to_string();
            }
            origin.pending = false;
            if origin.task_id.is_none() {
                origin.task_id = reply.task_id.clone();
            }
        }

        reply.reply_text().map(|text| self.push_assistant(text))
    }

    /// Append a partner reply to a typed turn
    pub fn apply_text_reply(&mut self, reply: impl Into<String>) -> Option<Uuid> {
        let reply = reply.into();
        if reply.trim().is_empty() {
            return None;
        }
        Some(self.push_assistant(reply))
    }

    /// Record the analysis task started by a message
    pub fn set_task_id(&mut self, id: Uuid, task_id: impl Into<String>) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.task_id = Some(task_id.into());
                true
            }
            None => false,
        }
    }

    /// Mark a pending voice turn as failed, keeping the placeholder text
    pub fn settle_pending(&mut self, id: Uuid) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.pending = false;
        }
    }

    /// History for the simulation reply endpoints; pending turns are left out
    pub fn history(&self) -> Vec<SimulationMessage> {
        self.messages
            .iter()
            .filter(|m| !m.pending)
            .map(|m| SimulationMessage {
                role: m.role.as_str().to_string(),
                text: m.text.clone(),
            })
            .collect()
    }

    /// Transcript submitted for scoring, one `Speaker: text` line per message
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .filter(|m| !m.pending)
            .map(|m| format!("{}: {}", m.role.speaker(), m.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, message: Message) -> Uuid {
        let id = message.id;
        self.messages.push(message);
        id
    }
}
