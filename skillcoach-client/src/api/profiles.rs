//! `/profiles` endpoints

use super::ApiClient;
use crate::error::{Error, Result};
use skillcoach_common::api::{ProfileWithHistory, SoftSkillsProfile};

/// Accepted range of the history window, in months
pub const HISTORY_MONTHS: std::ops::RangeInclusive<u32> = 1..=24;

impl ApiClient {
    /// Current profile; the backend creates an empty one on first access
    pub async fn my_profile(&self) -> Result<SoftSkillsProfile> {
        self.get_json("/profiles/me", &[]).await
    }

    /// Profile with snapshots from the last `months` months
    pub async fn my_profile_history(&self, months: u32) -> Result<ProfileWithHistory> {
        if !HISTORY_MONTHS.contains(&months) {
            return Err(Error::BadRequest(format!(
                "months must be between {} and {}, got {}",
                HISTORY_MONTHS.start(),
                HISTORY_MONTHS.end(),
                months
            )));
        }
        self.get_json("/profiles/me/history", &[("months", months.to_string())])
            .await
    }
}
