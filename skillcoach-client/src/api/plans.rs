//! `/plans` endpoints

use super::ApiClient;
use crate::error::Result;
use skillcoach_common::api::{DevelopmentPlan, PlanGenerationResponse, TaskCompletion};

impl ApiClient {
    /// Active plan with progress, `None` when no plan was generated yet
    pub async fn active_plan(&self) -> Result<Option<DevelopmentPlan>> {
        self.get_json("/plans/me/active", &[]).await
    }

    /// Mark a plan task as done
    pub async fn complete_task(&self, task_id: &str) -> Result<TaskCompletion> {
        self.post_empty(&format!("/plans/me/tasks/{}/complete", task_id))
            .await
    }

    /// Request plan generation; the plan appears under `active_plan` later
    pub async fn generate_plan(&self) -> Result<PlanGenerationResponse> {
        self.post_empty("/plans/me/generate").await
    }
}
