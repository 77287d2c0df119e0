//! Feed presentation helpers
//!
//! Backend identifies roles, skills and tags with upper snake case identifiers (`SPRING_BOOT`),
//! while users see and type them as labels (`Spring Boot`).

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::api::PostQuery;
use crate::model::{Applicant, Post, PostStatus};

/// Most suggestions offered while searching options
pub const MAX_SUGGESTIONS: usize = 8;

/// Shown in place of authors whose username is unknown
pub const ANONYMOUS: &str = "Anonymous";

/// Turns an identifier into a label, `SPRING_BOOT` becomes `Spring Boot`
pub fn format_enum_label(value: &str) -> String {
    value
        .to_lowercase()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns a label back into an identifier, `Spring Boot` becomes `SPRING_BOOT`
pub fn reverse_enum_label(label: &str) -> String {
    label.to_uppercase().replace(' ', "_")
}

/// Roles and skills picked in the feed, as labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub roles: Vec<String>,
    pub skills: Vec<String>,
}

impl FeedFilter {
    /// Server side query for the filter
    ///
    /// Backend filters on a single role and a single skill, so only the first pick of each counts.
    pub fn query(&self) -> PostQuery {
        PostQuery {
            role: self.roles.first().map(|role| reverse_enum_label(role)),
            skill: self.skills.first().map(|skill| reverse_enum_label(skill)),
        }
    }
}

/// Posts visible in the feed
pub fn open_posts(posts: impl IntoIterator<Item = Post>) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|post| post.status == PostStatus::Open)
        .collect()
}

/// Application of the user for the post, if any
pub fn my_application<'a>(post: &'a Post, user_id: &str) -> Option<&'a Applicant> {
    post.applicants
        .iter()
        .find(|applicant| applicant.user_id == user_id)
}

pub fn has_applied(post: &Post, user_id: &str) -> bool {
    my_application(post, user_id).is_some()
}

/// Author username as resolved in `authors`
pub fn author_name<'a>(authors: &'a HashMap<String, String>, post: &Post) -> &'a str {
    post.created_by
        .as_ref()
        .and_then(|author| authors.get(author))
        .map_or(ANONYMOUS, String::as_str)
}

/// Options offered for the search `input`
///
/// Already selected options are skipped, the rest is matched against its label ignoring case.
pub fn matching_options<'a>(
    options: &'a [String],
    selected: &[String],
    input: &str,
) -> Vec<&'a str> {
    let input = input.to_lowercase();
    options
        .iter()
        .filter(|option| !selected.contains(*option))
        .filter(|option| format_enum_label(option).to_lowercase().contains(&input))
        .map(String::as_str)
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Short description of how long ago `created_at` was
pub fn time_ago(created_at: NaiveDateTime, now: NaiveDateTime) -> String {
    let seconds = (now - created_at).num_seconds();
    match seconds {
        ..60 => "Just now".to_owned(),
        ..3_600 => format!("{}m ago", seconds / 60),
        ..86_400 => format!("{}h ago", seconds / 3_600),
        ..604_800 => format!("{}d ago", seconds / 86_400),
        _ => created_at.format("%Y-%m-%d").to_string(),
    }
}
