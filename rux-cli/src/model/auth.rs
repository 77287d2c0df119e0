//! Authentication payloads

use serde::{Deserialize, Serialize};

/// New account registration
#[derive(Debug, Clone, Serialize)]
pub struct Signup {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login credentials
///
/// Backend accepts either email or username, email takes precedence when both are given.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Login {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
}

/// One time password sent to the user email
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Otp {
    pub otp_code: String,
}

/// Answer of the auth endpoints
///
/// Auth endpoints answer with a single entry map. Failures that are not authentication errors
/// (wrong or expired OTP, unknown user) still come with the success status and an `error` entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Issued bearer token
    pub token: Option<String>,
    /// Human readable confirmation
    pub success: Option<String>,
    /// Rejection reason
    pub error: Option<String>,
    /// Username reported by token validation
    pub username: Option<String>,
    /// Token validation outcome
    pub status: Option<String>,
    /// Additional message
    pub message: Option<String>,
}

/// Answer of the user id lookup
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdResponse {
    pub user_id: String,
}
