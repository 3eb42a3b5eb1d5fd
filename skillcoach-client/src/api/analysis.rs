//! `/analysis` endpoints

use super::ApiClient;
use crate::error::{Error, Result};
use crate::poller::TaskStatusSource;
use async_trait::async_trait;
use skillcoach_common::api::{AnalysisResult, AnalysisStatus};

impl ApiClient {
    /// Current status of a scoring task; carries the result once completed
    pub async fn analysis_status(&self, task_id: &str) -> Result<AnalysisStatus> {
        if task_id.trim().is_empty() {
            return Err(Error::BadRequest("task id is empty".to_string()));
        }
        self.get_json(&format!("/analysis/status/{}", task_id), &[])
            .await
    }

    /// Past analysis results, newest first
    pub async fn my_analysis_results(&self, limit: u32) -> Result<Vec<AnalysisResult>> {
        self.get_json("/analysis/me/results", &[("limit", limit.to_string())])
            .await
    }
}

#[async_trait]
impl TaskStatusSource for ApiClient {
    async fn task_status(&self, task_id: &str) -> Result<AnalysisStatus> {
        self.analysis_status(task_id).await
    }
}
