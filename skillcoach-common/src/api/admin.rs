//! Administrative console types

use super::{Timestamp, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User with activity counters (`/admin/users`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUserStats {
    pub user: User,
    #[serde(default)]
    pub analysis_count: u32,
    #[serde(default)]
    pub test_results_count: u32,
    #[serde(default)]
    pub case_solutions_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCreate {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Partial test update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionCreate {
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Map<String, Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Map<String, Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub material_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Raw stored plan as seen by the admin console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminPlan {
    pub id: i64,
    pub user_id: i64,
    pub generated_at: Timestamp,
    #[serde(default)]
    pub is_archived: bool,
    pub content: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update_skips_absent_fields() {
        let update = TestUpdate {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Renamed"}));
    }

    #[test]
    fn test_question_create_type_field() {
        let create = QuestionCreate {
            text: "Why?".to_string(),
            question_type: "text".to_string(),
            options: None,
            correct_answer: None,
        };
        let json = serde_json::to_value(&create).unwrap();
        assert_eq!(json["type"], "text");
        assert!(json.get("options").is_none());
    }
}
