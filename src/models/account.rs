//! Account-level models.

use serde::{Deserialize, Serialize};

/// The user owning the API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub current_team_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Plan limits and current consumption.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageLimits {
    pub max_projects_num: Option<u64>,
    pub current_projects_num: Option<u64>,
    pub max_total_storage_credits: Option<u64>,
    pub current_total_storage_credits: Option<u64>,
    pub max_queries: Option<u64>,
    pub current_queries: Option<u64>,
}

impl UsageLimits {
    /// Queries left in the current period, when both numbers are known.
    pub fn remaining_queries(&self) -> Option<u64> {
        Some(self.max_queries?.saturating_sub(self.current_queries?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_remaining() {
        let usage: UsageLimits =
            serde_json::from_value(json!({"max_queries": 1000, "current_queries": 250})).unwrap();
        assert_eq!(usage.remaining_queries(), Some(750));
        assert_eq!(UsageLimits::default().remaining_queries(), None);
    }
}
