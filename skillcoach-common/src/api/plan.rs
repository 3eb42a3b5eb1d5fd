//! Development plan types
//!
//! A plan targets the user's weakest skills with learning materials,
//! practical tasks and recommended tests. Completing tasks drives the
//! progress counter; block achievements and the final stage are reported
//! by the backend when present.

use super::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialItem {
    pub id: String,
    pub title: String,
    pub url: String,
    /// `article`, `video` or `course`
    #[serde(rename = "type")]
    pub material_type: String,
    pub skill: String,
    /// `beginner`, `intermediate` or `advanced`
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    pub description: String,
    pub skill: String,
    #[serde(default = "default_task_status")]
    pub status: String,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

fn default_task_status() -> String {
    "pending".to_string()
}

impl TaskItem {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecommendation {
    pub test_id: i64,
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProgressItem {
    pub material_id: String,
    #[serde(default)]
    pub linked_test_id: Option<i64>,
    #[serde(default)]
    pub article_opened: bool,
    #[serde(default)]
    pub test_completed: bool,
    #[serde(default)]
    pub percentage: f64,
}

/// Achievement unlocked by finishing a block of the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAchievement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub achieved_at: Option<Timestamp>,
}

impl BlockAchievement {
    pub fn is_achieved(&self) -> bool {
        self.achieved_at.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalStageProgress {
    #[serde(default)]
    pub final_test_id: Option<i64>,
    #[serde(default)]
    pub final_simulation_id: Option<i64>,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub final_test_completed: bool,
    #[serde(default)]
    pub final_simulation_completed: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub achievement_title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanProgress {
    pub completed: u32,
    pub total: u32,
    pub percentage: f64,
}

impl PlanProgress {
    /// Progress over a task list, percentage rounded to two decimals
    pub fn from_tasks(tasks: &[TaskItem]) -> Self {
        let total = tasks.len() as u32;
        let completed = tasks.iter().filter(|t| t.is_completed()).count() as u32;
        let percentage = if total > 0 {
            (completed as f64 / total as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        Self { completed, total, percentage }
    }
}

/// Active plan with progress (`/plans/me/active`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentPlan {
    pub id: i64,
    pub user_id: i64,
    pub generated_at: Timestamp,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub materials: Vec<MaterialItem>,
    #[serde(default)]
    pub material_progress: Vec<MaterialProgressItem>,
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
    #[serde(default)]
    pub recommended_tests: Vec<TestRecommendation>,
    #[serde(default)]
    pub final_stage: Option<FinalStageProgress>,
    #[serde(default)]
    pub block_achievements: Vec<BlockAchievement>,
    #[serde(default)]
    pub progress: PlanProgress,
}

impl DevelopmentPlan {
    pub fn pending_tasks(&self) -> impl Iterator<Item = &TaskItem> {
        self.tasks.iter().filter(|t| !t.is_completed())
    }

    pub fn achievements(&self) -> impl Iterator<Item = &BlockAchievement> {
        self.block_achievements.iter().filter(|a| a.is_achieved())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub task_id: String,
    pub status: String,
    pub completed_at: String,
    pub plan_progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanGenerationResponse {
    pub message: String,
    pub status: String,
}
