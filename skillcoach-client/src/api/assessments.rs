//! `/tests` endpoints: quizzes and case studies

use super::ApiClient;
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use skillcoach_common::api::{
    CaseSolution, CaseSubmitRequest, CaseSubmitResponse, Test, TestSubmitRequest,
    TestSubmitResponse, UserTestResult,
};

impl ApiClient {
    pub async fn list_tests(&self, skip: u32, limit: u32) -> Result<Vec<Test>> {
        self.get_json(
            "/tests/",
            &[("skip", skip.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn get_test(&self, test_id: i64) -> Result<Test> {
        self.get_json(&format!("/tests/{}", test_id), &[]).await
    }

    /// Submit quiz answers keyed by question id
    pub async fn submit_test(
        &self,
        test_id: i64,
        answers: Map<String, Value>,
    ) -> Result<TestSubmitResponse> {
        if answers.is_empty() {
            return Err(Error::BadRequest("no answers to submit".to_string()));
        }
        let request = TestSubmitRequest { answers };
        self.post_json(&format!("/tests/{}/submit", test_id), &request)
            .await
    }

    /// Submit a free-text case solution
    pub async fn submit_case(&self, test_id: i64, solution: &str) -> Result<CaseSubmitResponse> {
        if solution.trim().is_empty() {
            return Err(Error::BadRequest("case solution is empty".to_string()));
        }
        let request = CaseSubmitRequest {
            solution: solution.to_string(),
        };
        self.post_json(&format!("/tests/{}/case/submit", test_id), &request)
            .await
    }

    pub async fn my_test_results(&self, limit: u32) -> Result<Vec<UserTestResult>> {
        self.get_json("/tests/me/results", &[("limit", limit.to_string())])
            .await
    }

    pub async fn my_case_solutions(&self, limit: u32) -> Result<Vec<CaseSolution>> {
        self.get_json("/tests/me/case-solutions", &[("limit", limit.to_string())])
            .await
    }
}
