//! Project posts and applications endpoints

use reqwest::Method;
use serde::Serialize;
use tracing::info;

use crate::api::{Client, Error, Result};
use crate::model::{
    Applicant, ApplicantStatus, ApplicantStatusUpdate, MailData, Post, PostDraft, PostStatus,
    RoleRequirement,
};

/// Server side feed filtering
///
/// Values are upper snake case identifiers, as in `BACKEND_DEVELOPER` or `SPRING_BOOT`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
}

impl Client {
    /// Publishes a new post
    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        let path = "/post/create-post";
        let request = self.request(Method::POST, path).json(draft);
        let post: Post = self.send_json(path, request).await?;

        info!(post_id = %post.id, "Post created");
        Ok(post)
    }

    /// Replaces the post content
    pub async fn update_post(&self, post_id: &str, draft: &PostDraft) -> Result<Post> {
        let path = format!("/post/update-post/{post_id}");
        let request = self.request(Method::PUT, &path).json(draft);
        self.send_json(&path, request).await
    }

    /// Fetches single post
    pub async fn post(&self, post_id: &str) -> Result<Post> {
        let path = format!("/post/get-post/{post_id}");
        let request = self.request(Method::GET, &path);
        self.send_json(&path, request).await
    }

    /// Posts created by the user
    pub async fn user_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        let path = format!("/post/get-user-post/{user_id}");
        let request = self.request(Method::GET, &path);
        self.send_json(&path, request).await
    }

    /// Posts the user applied to
    pub async fn applied_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        let path = format!("/post/applied/{user_id}");
        let request = self.request(Method::GET, &path);
        self.send_json(&path, request).await
    }

    /// All posts, optionally narrowed to a role and a skill
    pub async fn all_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let path = "/post/get-all-post";
        let request = self.request(Method::GET, path).query(query);
        self.send_json(path, request).await
    }

    /// Deletes the post
    pub async fn delete_post(&self, post_id: &str) -> Result<String> {
        let path = format!("/post/delete-post/{post_id}");
        let request = self.request(Method::DELETE, &path);
        let message = self.send_text(&path, request).await?;

        info!(%post_id, "Post deleted");
        Ok(message)
    }

    /// Skills known to the platform
    pub async fn all_skills(&self) -> Result<Vec<String>> {
        let path = "/post/get-all-skills";
        let request = self.request(Method::GET, path);
        self.send_json(path, request).await
    }

    /// Roles known to the platform
    pub async fn all_roles(&self) -> Result<Vec<String>> {
        let path = "/post/get-all-roles";
        let request = self.request(Method::GET, path);
        self.send_json(path, request).await
    }

    /// Replaces the post tech stack
    pub async fn update_tech_stack(&self, post_id: &str, tech_stack: &[String]) -> Result<Post> {
        let path = format!("/post/update-techstack/{post_id}");
        let request = self.request(Method::PUT, &path).json(tech_stack);
        self.send_json(&path, request).await
    }

    /// Replaces the roles the post is looking for
    pub async fn update_roles_required(
        &self,
        post_id: &str,
        roles: &[RoleRequirement],
    ) -> Result<Post> {
        let path = format!("/post/roles-required/{post_id}");
        let request = self.request(Method::PUT, &path).json(roles);
        self.send_json(&path, request).await
    }

    /// Applies the logged in user for a role in the post
    pub async fn apply(
        &self,
        post_id: &str,
        role: &str,
        skills: Vec<String>,
        pitch: Option<String>,
    ) -> Result<Post> {
        let user_id = self.session().user_id().ok_or(Error::NotSignedIn)?;
        let applicant = Applicant {
            user_id,
            role_applied: role.to_owned(),
            skills,
            status: ApplicantStatus::Pending,
            applicant_pitch: pitch,
        };

        let path = format!("/post/add-applicants/{post_id}");
        let request = self.request(Method::POST, &path).json(&applicant);
        let post = self.send_json(&path, request).await?;

        info!(%post_id, role, "Applied for a role");
        Ok(post)
    }

    /// Withdraws the application of the user
    pub async fn withdraw(&self, post_id: &str, user_id: &str) -> Result<String> {
        let path = format!("/post/{post_id}/remove-applicants/{user_id}");
        let request = self.request(Method::DELETE, &path);
        self.send_text(&path, request).await
    }

    /// Accepts or rejects the applicant, optionally mailing them about it
    pub async fn update_applicant_status(
        &self,
        post_id: &str,
        mut applicant: Applicant,
        status: ApplicantStatus,
        mail: Option<MailData>,
    ) -> Result<serde_json::Value> {
        let path = format!(
            "/post/{post_id}/applicant/update-status/{}",
            applicant.user_id
        );
        applicant.status = status;
        let update = ApplicantStatusUpdate {
            applicant_status: applicant,
            mail,
        };

        let request = self.request(Method::PATCH, &path).json(&update);
        self.send_json(&path, request).await
    }

    /// Opens or closes the post
    pub async fn update_post_status(
        &self,
        post_id: &str,
        status: PostStatus,
    ) -> Result<serde_json::Value> {
        let path = format!("/post/update-status/{post_id}");
        let request = self.request(Method::PATCH, &path).json(&status);
        let response = self.send_json(&path, request).await?;

        info!(%post_id, %status, "Post status changed");
        Ok(response)
    }
}
