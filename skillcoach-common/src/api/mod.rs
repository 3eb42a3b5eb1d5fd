//! Backend API request/response types
//!
//! Mirrors the JSON bodies of the coaching backend under `/api/v1`.
//! Types are grouped by the backend router they belong to.

pub mod admin;
pub mod analysis;
pub mod auth;
pub mod content;
pub mod plan;
pub mod profile;
pub mod timestamp;

pub use admin::*;
pub use analysis::*;
pub use auth::*;
pub use content::*;
pub use plan::*;
pub use profile::*;
pub use timestamp::Timestamp;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Generic `{"status": ...}` acknowledgement returned by mutating endpoints.
///
/// Extra counters (e.g. `deleted`, `deleted_tests`) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
