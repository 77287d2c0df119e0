//! User profiles and platform statistics

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::model::{deserialize_timestamp, null_as_default};

/// Public user profile
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

/// Profile fields the user can change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub skills: Vec<String>,
}

/// Platform wide counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub developers: u64,
    pub active_projects: u64,
}
