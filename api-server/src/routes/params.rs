//! Query parameter helpers shared by list endpoints.
//!
//! The structs follow Rocket's `FromForm` conventions and derive `JsonSchema`
//! so the generated OpenAPI document lists the parameters and their defaults.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

const fn default_feed_limit() -> i64 {
    50
}

const MAX_FEED_LIMIT: i64 = 100;

/// Department value that disables filtering.
pub const ALL_DEPARTMENTS: &str = "all";

/// Parameters accepted by the shoutout feed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::FromForm)]
pub struct FeedParams {
    /// Department to filter by; `all` or empty shows every department.
    #[serde(default)]
    pub department: Option<String>,
    /// Maximum number of shoutouts (clamped between 1 and 100, default 50).
    #[field(default = 50)]
    #[serde(default = "default_feed_limit")]
    pub limit: i64,
}

impl Default for FeedParams {
    fn default() -> Self {
        Self {
            department: None,
            limit: default_feed_limit(),
        }
    }
}

impl FeedParams {
    /// Department filter, or `None` when every department is requested.
    pub fn department(&self) -> Option<&str> {
        self.department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case(ALL_DEPARTMENTS))
    }

    /// Limit capped at [`MAX_FEED_LIMIT`].
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_FEED_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(department: Option<&str>, limit: i64) -> FeedParams {
        FeedParams {
            department: department.map(str::to_string),
            limit,
        }
    }

    #[test]
    fn all_and_blank_disable_the_filter() {
        assert_eq!(params(None, 10).department(), None);
        assert_eq!(params(Some("all"), 10).department(), None);
        assert_eq!(params(Some("ALL"), 10).department(), None);
        assert_eq!(params(Some("  "), 10).department(), None);
        assert_eq!(params(Some(" Design "), 10).department(), Some("Design"));
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(params(None, 0).limit(), 1);
        assert_eq!(params(None, 500).limit(), 100);
        assert_eq!(FeedParams::default().limit(), 50);
    }
}
