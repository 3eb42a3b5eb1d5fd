//! Soft-skill model
//!
//! The coaching backend scores every analysed response on the same five
//! skills, each on a 0-100 scale. Profiles, analysis results and plan
//! weaknesses all refer to skills by their snake_case wire names.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of every skill score
pub const MAX_SCORE: f64 = 100.0;

/// One of the five scored soft skills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Communication,
    EmotionalIntelligence,
    CriticalThinking,
    TimeManagement,
    Leadership,
}

impl Skill {
    /// All skills in canonical order
    pub const ALL: [Skill; 5] = [
        Skill::Communication,
        Skill::EmotionalIntelligence,
        Skill::CriticalThinking,
        Skill::TimeManagement,
        Skill::Leadership,
    ];

    /// Wire name used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::Communication => "communication",
            Skill::EmotionalIntelligence => "emotional_intelligence",
            Skill::CriticalThinking => "critical_thinking",
            Skill::TimeManagement => "time_management",
            Skill::Leadership => "leadership",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Skill::Communication => "Communication",
            Skill::EmotionalIntelligence => "Emotional intelligence",
            Skill::CriticalThinking => "Critical thinking",
            Skill::TimeManagement => "Time management",
            Skill::Leadership => "Leadership",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Skill {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let name = trimmed.strip_suffix("_score").unwrap_or(trimmed);
        Skill::ALL
            .iter()
            .copied()
            .find(|skill| skill.as_str() == name)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown skill: {}", s)))
    }
}

/// Scores for all five skills plus optional coach feedback.
///
/// Deserializes from both the plain skill names and the backend's
/// `<skill>_score` column names, so it can be flattened into analysis
/// results and profiles alike.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillScores {
    #[serde(alias = "communication_score")]
    pub communication: f64,
    #[serde(alias = "emotional_intelligence_score")]
    pub emotional_intelligence: f64,
    #[serde(alias = "critical_thinking_score")]
    pub critical_thinking: f64,
    #[serde(alias = "time_management_score")]
    pub time_management: f64,
    #[serde(alias = "leadership_score")]
    pub leadership: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl SkillScores {
    /// Score for a single skill
    pub fn get(&self, skill: Skill) -> f64 {
        match skill {
            Skill::Communication => self.communication,
            Skill::EmotionalIntelligence => self.emotional_intelligence,
            Skill::CriticalThinking => self.critical_thinking,
            Skill::TimeManagement => self.time_management,
            Skill::Leadership => self.leadership,
        }
    }

    /// (skill, score) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Skill, f64)> + '_ {
        Skill::ALL.iter().map(move |&skill| (skill, self.get(skill)))
    }

    /// Mean of the five scores
    pub fn average(&self) -> f64 {
        self.iter().map(|(_, score)| score).sum::<f64>() / Skill::ALL.len() as f64
    }

    /// Reject scores outside 0..=100 (NaN included)
    pub fn validate(&self) -> Result<()> {
        for (skill, score) in self.iter() {
            if !(0.0..=MAX_SCORE).contains(&score) {
                return Err(Error::InvalidInput(format!(
                    "{} score out of range: {}",
                    skill, score
                )));
            }
        }
        Ok(())
    }

    /// Highest-scoring skills, best first. Equal scores keep canonical order.
    pub fn strengths(&self, n: usize) -> Vec<Skill> {
        self.ranked().into_iter().take(n).collect()
    }

    /// Lowest-scoring skills, weakest first.
    ///
    /// Takes the tail of the descending ranking and reverses it, so equal
    /// scores come out in reverse canonical order.
    pub fn weaknesses(&self, n: usize) -> Vec<Skill> {
        let ranked = self.ranked();
        let start = ranked.len().saturating_sub(n);
        ranked[start..].iter().rev().copied().collect()
    }

    fn ranked(&self) -> Vec<Skill> {
        let mut pairs: Vec<(Skill, f64)> = self.iter().collect();
        // Stable sort keeps canonical order among ties
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        pairs.into_iter().map(|(skill, _)| skill).collect()
    }
}
