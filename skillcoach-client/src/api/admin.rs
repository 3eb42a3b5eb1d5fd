//! `/admin` endpoints (administrators only)

use super::ApiClient;
use crate::error::Result;
use skillcoach_common::api::{
    AdminPlan, AdminUserStats, AnalysisResult, CaseSolution, MaterialItem, MaterialUpdate,
    Question, QuestionCreate, QuestionUpdate, SetPasswordRequest, SoftSkillsProfile,
    StatusMessage, TaskItem, TaskUpdate, Test, TestCreate, TestUpdate, User, UserTestResult,
};

impl ApiClient {
    /// Re-queue failed analysis tasks
    pub async fn retry_failed(&self) -> Result<StatusMessage> {
        self.post_empty("/admin/retry-failed").await
    }

    // ---- users ----

    pub async fn list_users(&self, limit: u32) -> Result<Vec<AdminUserStats>> {
        self.get_json("/admin/users", &[("limit", limit.to_string())])
            .await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        self.get_json(&format!("/admin/users/{}", user_id), &[]).await
    }

    pub async fn set_user_password(&self, user_id: i64, new_password: &str) -> Result<StatusMessage> {
        let request = SetPasswordRequest {
            new_password: new_password.to_string(),
        };
        self.post_json(&format!("/admin/users/{}/password", user_id), &request)
            .await
    }

    pub async fn user_profile(&self, user_id: i64) -> Result<Option<SoftSkillsProfile>> {
        self.get_json(&format!("/admin/users/{}/profile", user_id), &[])
            .await
    }

    pub async fn user_analysis(&self, user_id: i64, limit: u32) -> Result<Vec<AnalysisResult>> {
        self.get_json(
            &format!("/admin/users/{}/analysis", user_id),
            &[("limit", limit.to_string())],
        )
        .await
    }

    pub async fn user_tests(&self, user_id: i64, limit: u32) -> Result<Vec<UserTestResult>> {
        self.get_json(
            &format!("/admin/users/{}/tests", user_id),
            &[("limit", limit.to_string())],
        )
        .await
    }

    pub async fn user_cases(&self, user_id: i64, limit: u32) -> Result<Vec<CaseSolution>> {
        self.get_json(
            &format!("/admin/users/{}/cases", user_id),
            &[("limit", limit.to_string())],
        )
        .await
    }

    pub async fn delete_user_test_results(&self, user_id: i64) -> Result<StatusMessage> {
        self.delete_json(&format!("/admin/users/{}/test-results", user_id))
            .await
    }

    /// Remove the built-in demo tests and everything attached to them
    pub async fn delete_seed_tests(&self) -> Result<StatusMessage> {
        self.delete_json("/admin/seed/tests").await
    }

    // ---- tests and questions ----

    pub async fn admin_tests(&self, limit: u32) -> Result<Vec<Test>> {
        self.get_json("/admin/tests", &[("limit", limit.to_string())])
            .await
    }

    pub async fn create_test(&self, test: &TestCreate) -> Result<Test> {
        self.post_json("/admin/tests", test).await
    }

    pub async fn update_test(&self, test_id: i64, update: &TestUpdate) -> Result<Test> {
        self.patch_json(&format!("/admin/tests/{}", test_id), update)
            .await
    }

    pub async fn delete_test(&self, test_id: i64) -> Result<StatusMessage> {
        self.delete_json(&format!("/admin/tests/{}", test_id)).await
    }

    pub async fn test_questions(&self, test_id: i64) -> Result<Vec<Question>> {
        self.get_json(&format!("/admin/tests/{}/questions", test_id), &[])
            .await
    }

    pub async fn create_question(&self, test_id: i64, question: &QuestionCreate) -> Result<Question> {
        self.post_json(&format!("/admin/tests/{}/questions", test_id), question)
            .await
    }

    pub async fn update_question(&self, question_id: i64, update: &QuestionUpdate) -> Result<Question> {
        self.patch_json(&format!("/admin/questions/{}", question_id), update)
            .await
    }

    pub async fn delete_question(&self, question_id: i64) -> Result<StatusMessage> {
        self.delete_json(&format!("/admin/questions/{}", question_id))
            .await
    }

    // ---- plan content ----

    pub async fn user_plan(&self, user_id: i64) -> Result<AdminPlan> {
        self.get_json(&format!("/admin/users/{}/plan", user_id), &[])
            .await
    }

    pub async fn add_material(&self, user_id: i64, material: &MaterialItem) -> Result<MaterialItem> {
        self.post_json(&format!("/admin/users/{}/materials", user_id), material)
            .await
    }

    pub async fn update_material(
        &self,
        user_id: i64,
        material_id: &str,
        update: &MaterialUpdate,
    ) -> Result<MaterialItem> {
        self.patch_json(
            &format!("/admin/users/{}/materials/{}", user_id, material_id),
            update,
        )
        .await
    }

    pub async fn delete_material(&self, user_id: i64, material_id: &str) -> Result<StatusMessage> {
        self.delete_json(&format!("/admin/users/{}/materials/{}", user_id, material_id))
            .await
    }

    pub async fn add_plan_task(&self, user_id: i64, task: &TaskItem) -> Result<TaskItem> {
        self.post_json(&format!("/admin/users/{}/tasks", user_id), task)
            .await
    }

    pub async fn update_plan_task(
        &self,
        user_id: i64,
        task_id: &str,
        update: &TaskUpdate,
    ) -> Result<TaskItem> {
        self.patch_json(&format!("/admin/users/{}/tasks/{}", user_id, task_id), update)
            .await
    }

    pub async fn delete_plan_task(&self, user_id: i64, task_id: &str) -> Result<StatusMessage> {
        self.delete_json(&format!("/admin/users/{}/tasks/{}", user_id, task_id))
            .await
    }
}
