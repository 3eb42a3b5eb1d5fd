//! Chat, test, case and simulation types

use super::{SubmittedTask, Timestamp};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ========================================
// Chat
// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Reply to a text chat message; scoring continues in the background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl SubmittedTask for ChatResponse {
    fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }
}

/// Reply to an uploaded voice turn.
///
/// Chat voice responses use `user_text`/`response`, simulation voice
/// responses use `transcript`/`reply`; both spellings are accepted. Either
/// part may be missing (speech not recognized, or no reply produced).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceReply {
    #[serde(default, alias = "user_text", alias = "text")]
    pub transcript: Option<String>,
    #[serde(default, alias = "response")]
    pub reply: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl VoiceReply {
    /// Recognized text, ignoring blank strings
    pub fn recognized_text(&self) -> Option<&str> {
        self.transcript.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Reply text, ignoring blank strings
    pub fn reply_text(&self) -> Option<&str> {
        self.reply.as_deref().filter(|t| !t.trim().is_empty())
    }
}

impl SubmittedTask for VoiceReply {
    fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }
}

/// Stored chat message from `/chat/me/messages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub id: i64,
    pub message: String,
    pub is_user: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub analysis_task_id: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

// ========================================
// Tests and questions
// ========================================

/// Kind of test content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Quiz,
    Case,
    Simulation,
    #[serde(other)]
    Other,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestKind::Quiz => "quiz",
            TestKind::Case => "case",
            TestKind::Simulation => "simulation",
            TestKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Selectable answer of a multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    #[serde(default)]
    pub test_id: Option<i64>,
    pub text: String,
    /// `text` or `multiple_choice`
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default)]
    pub options: Option<Vec<QuestionOption>>,
}

impl Question {
    pub fn is_multiple_choice(&self) -> bool {
        self.question_type == "multiple_choice"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TestKind,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Answers keyed by question id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSubmitRequest {
    pub answers: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSubmitResponse {
    pub result_id: i64,
    pub task_id: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmittedTask for TestSubmitResponse {
    fn task_id(&self) -> Option<&str> {
        Some(&self.task_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSubmitRequest {
    pub solution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSubmitResponse {
    pub solution_id: i64,
    pub task_id: String,
    pub status: String,
}

impl SubmittedTask for CaseSubmitResponse {
    fn task_id(&self) -> Option<&str> {
        Some(&self.task_id)
    }
}

/// Stored quiz result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTestResult {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    #[serde(default)]
    pub answers: Map<String, Value>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub ai_analysis: Option<String>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

/// Stored case or simulation solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSolution {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub solution: String,
    #[serde(default)]
    pub analysis_task_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

// ========================================
// Simulations
// ========================================

/// Role-play scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Interview,
    Conflict,
    Negotiation,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Interview, Scenario::Conflict, Scenario::Negotiation];

    /// Path segment used in `/tests/simulations/{scenario}/...`
    pub fn slug(&self) -> &'static str {
        match self {
            Scenario::Interview => "interview",
            Scenario::Conflict => "conflict",
            Scenario::Negotiation => "negotiation",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Scenario::Interview => "Job interview",
            Scenario::Conflict => "Team conflict",
            Scenario::Negotiation => "Negotiation",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Scenario::ALL
            .iter()
            .copied()
            .find(|scenario| scenario.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown simulation: {}", s)))
    }
}

/// One turn of simulation history; `role` is `user` or the partner role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMessage {
    pub role: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReplyRequest {
    pub messages: Vec<SimulationMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReply {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSubmitRequest {
    pub conversation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSubmitResponse {
    pub test_id: i64,
    pub solution_id: i64,
    pub task_id: String,
    pub status: String,
}

impl SubmittedTask for SimulationSubmitResponse {
    fn task_id(&self) -> Option<&str> {
        Some(&self.task_id)
    }
}
