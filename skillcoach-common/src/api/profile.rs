//! Skill profile types

use super::Timestamp;
use crate::SkillScores;
use serde::{Deserialize, Serialize};

/// Current aggregated scores of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftSkillsProfile {
    pub id: i64,
    pub user_id: i64,
    #[serde(flatten)]
    pub scores: SkillScores,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Snapshot of a profile at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileHistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub profile_id: i64,
    #[serde(flatten)]
    pub scores: SkillScores,
    pub created_at: Timestamp,
}

/// Body of `/profiles/me/history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileWithHistory {
    pub current: SkillScores,
    #[serde(default)]
    pub history: Vec<ProfileHistoryEntry>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

impl ProfileWithHistory {
    /// Change of the average score from the oldest snapshot to the current one
    pub fn average_trend(&self) -> Option<f64> {
        let oldest = self.history.iter().min_by_key(|entry| entry.created_at)?;
        Some(self.current.average() - oldest.scores.average())
    }
}
