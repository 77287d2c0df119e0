//! Project posts and applications

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{deserialize_timestamp, null_as_default};

/// Post visibility in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostStatus {
    Open,
    Closed,
}

impl PostStatus {
    /// The opposite status
    pub fn toggled(self) -> Self {
        match self {
            PostStatus::Open => PostStatus::Closed,
            PostStatus::Closed => PostStatus::Open,
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Open => write!(f, "OPEN"),
            PostStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Decision on an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicantStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicantStatus::Pending => write!(f, "PENDING"),
            ApplicantStatus::Accepted => write!(f, "ACCEPTED"),
            ApplicantStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Role wanted by a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequirement {
    /// Role identifier, eg. `BACKEND_DEVELOPER`
    pub role: String,
    /// Skills identifiers, eg. `SPRING_BOOT`
    #[serde(default, deserialize_with = "null_as_default")]
    pub required_skills: Vec<String>,
    /// Number of people wanted
    #[serde(
        default = "RoleRequirement::default_openings",
        deserialize_with = "RoleRequirement::deserialize_openings"
    )]
    pub openings: u32,
}

impl RoleRequirement {
    fn default_openings() -> u32 {
        1
    }

    fn deserialize_openings<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let openings: Option<u32> = Deserialize::deserialize(deserializer)?;
        Ok(openings.unwrap_or_else(Self::default_openings))
    }
}

/// Application for a role in a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub user_id: String,
    pub role_applied: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    pub status: ApplicantStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_pitch: Option<String>,
}

/// Project post as returned by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tech_stack: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles_required: Vec<RoleRequirement>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub status: PostStatus,
    /// Author user id
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applicants: Vec<Applicant>,
    /// Number of applications
    #[serde(default)]
    pub applied: u64,
}

/// Post content sent on create and update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub roles_required: Vec<RoleRequirement>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Notification mail sent along with the applicant status change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailData {
    pub receiver_mail: String,
    pub subject: String,
    pub body: String,
}

/// Applicant status change request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantStatusUpdate {
    pub applicant_status: Applicant,
    #[serde(rename = "mailDto", skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_backend_post() {
        let post: Post = serde_json::from_value(json!({
            "id": "p1",
            "title": "Rust CLI",
            "description": null,
            "techStack": ["RUST", "DOCKER"],
            "rolesRequired": [
                { "role": "BACKEND_DEVELOPER", "requiredSkills": ["RUST"], "openings": 2 },
                { "role": "DESIGNER", "openings": null }
            ],
            "tags": null,
            "status": "OPEN",
            "createdBy": "u1",
            "createdAt": [2025, 1, 2, 3, 4, 5, 0],
            "applicants": [
                { "userId": "u2", "roleApplied": "DESIGNER", "status": "PENDING", "applicantPitch": "hi" }
            ],
            "applied": 1
        }))
        .unwrap_or_else(|err| panic!("{err}"));

        assert_eq!(post.status, PostStatus::Open);
        assert_eq!(post.description, None);
        assert!(post.tags.is_empty());
        assert_eq!(post.roles_required[0].openings, 2);
        assert_eq!(post.roles_required[1].openings, 1);
        assert!(post.roles_required[1].required_skills.is_empty());
        assert_eq!(post.applicants[0].status, ApplicantStatus::Pending);
        assert_eq!(post.applicants[0].applicant_pitch.as_deref(), Some("hi"));
        assert!(post.created_at.is_some());
        assert!(post.updated_at.is_none());
    }

    #[test]
    fn status_toggling() {
        assert_eq!(PostStatus::Open.toggled(), PostStatus::Closed);
        assert_eq!(PostStatus::Closed.toggled(), PostStatus::Open);
        assert_eq!(PostStatus::Closed.to_string(), "CLOSED");
    }

    #[test]
    fn applicant_update_body() {
        let update = ApplicantStatusUpdate {
            applicant_status: Applicant {
                user_id: "u2".to_owned(),
                role_applied: "DESIGNER".to_owned(),
                skills: vec![],
                status: ApplicantStatus::Accepted,
                applicant_pitch: None,
            },
            mail: Some(MailData {
                receiver_mail: "b@x.com".to_owned(),
                subject: "Welcome".to_owned(),
                body: "You are in".to_owned(),
            }),
        };

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "applicantStatus": {
                    "userId": "u2",
                    "roleApplied": "DESIGNER",
                    "skills": [],
                    "status": "ACCEPTED"
                },
                "mailDto": {
                    "receiverMail": "b@x.com",
                    "subject": "Welcome",
                    "body": "You are in"
                }
            })
        );
    }
}
