//! User profile and platform endpoints

use std::collections::{BTreeSet, HashMap};

use futures::future::join_all;
use reqwest::Method;
use tracing::warn;

use crate::api::{Client, Error, Result};
use crate::feed::ANONYMOUS;
use crate::model::{PlatformStats, Post, ProfileUpdate, UserProfile};

impl Client {
    /// Fetches user profile
    pub async fn profile(&self, user_id: &str) -> Result<UserProfile> {
        let path = format!("/user/{user_id}");
        let request = self.request(Method::GET, &path);
        self.send_json(&path, request).await
    }

    /// Usernames of the posts authors, keyed by user id
    ///
    /// Every author is looked up once, all lookups run concurrently. Authors which cannot be
    /// resolved are shown as [`ANONYMOUS`].
    pub async fn author_names(&self, posts: &[Post]) -> HashMap<String, String> {
        let authors: BTreeSet<&str> = posts
            .iter()
            .filter_map(|post| post.created_by.as_deref())
            .filter(|author| !author.is_empty())
            .collect();

        let lookups = authors.into_iter().map(|author| async move {
            let username = match self.profile(author).await {
                Ok(profile) if !profile.username.is_empty() => profile.username,
                Ok(_) => ANONYMOUS.to_owned(),
                Err(err) => {
                    warn!(author, error = %err, "Cannot resolve post author");
                    ANONYMOUS.to_owned()
                }
            };
            (author.to_owned(), username)
        });

        join_all(lookups).await.into_iter().collect()
    }

    /// Profile of the logged in user
    pub async fn my_profile(&self) -> Result<UserProfile> {
        let user_id = self.session().user_id().ok_or(Error::NotSignedIn)?;
        self.profile(&user_id).await
    }

    /// Updates bio and skills of the logged in user
    pub async fn update_profile(
        &self,
        bio: Option<String>,
        skills: Vec<String>,
    ) -> Result<UserProfile> {
        let id = self.session().user_id().ok_or(Error::NotSignedIn)?;
        let update = ProfileUpdate { id, bio, skills };

        let path = "/user/update-user";
        let request = self.request(Method::PUT, path).json(&update);
        self.send_json(path, request).await
    }

    /// Skills of the user
    pub async fn user_skills(&self, user_id: &str) -> Result<Vec<String>> {
        let path = format!("/user/get-skills/{user_id}");
        let request = self.request(Method::GET, &path);
        self.send_json(&path, request).await
    }

    /// Adds skills to the user
    ///
    /// Returns the complete skill list after the update. Unknown skills fail the whole request with
    /// `400 Bad Request` listing them.
    pub async fn add_skills(&self, user_id: &str, skills: &[String]) -> Result<Vec<String>> {
        let path = format!("/user/add-skills/{user_id}");
        let request = self.request(Method::PUT, &path).json(skills);
        let mut response: HashMap<String, Vec<String>> = self.send_json(&path, request).await?;
        Ok(response.remove("Updated Skills").unwrap_or_default())
    }

    /// Platform wide statistics
    ///
    /// Backend keeps a list of snapshots; the last one is the current state.
    pub async fn platform_stats(&self) -> Result<Option<PlatformStats>> {
        let path = "/platform/stats";
        let request = self.request(Method::GET, path);
        let stats: Vec<PlatformStats> = self.send_json(path, request).await?;
        Ok(stats.last().copied())
    }
}
