//! Subcommands execution

use std::collections::HashMap;
use std::slice;

use chrono::Local;
use color_eyre::Result;
use color_eyre::eyre::eyre;

use crate::api::{self, Client};
use crate::feed::{self, FeedFilter, format_enum_label, reverse_enum_label};
use crate::model::{
    AuthResponse, Login, MailData, Post, PostDraft, PostStatus, Signup, UserProfile,
};
use crate::opt::Command;

/// Runs the subcommand, printing its outcome
pub async fn execute(client: &Client, command: Command) -> Result<()> {
    match command {
        Command::Signup {
            username,
            email,
            password,
        } => {
            let signup = Signup {
                username,
                email,
                password,
            };
            print_message(client.signup(&signup).await?);
            println!("Confirm it with `rux verify-otp <code>`");
        }
        Command::VerifyOtp { code } => {
            client.verify_otp(&code).await?;
            whoami(client);
        }
        Command::ResendOtp => print_message(client.resend_otp().await?),
        Command::Login {
            email,
            username,
            password,
        } => {
            let login = Login {
                email,
                username,
                password,
            };
            client.login(&login).await?;
            whoami(client);
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Command::Whoami => whoami(client),
        Command::Validate => print_message(client.validate_token().await?),
        Command::ForgotPassword { email } => print_message(client.forgot_password(&email).await?),
        Command::ResetPassword { token, password } => {
            print_message(client.reset_password(&token, &password).await?)
        }
        Command::Feed { role, skill } => {
            let filter = FeedFilter {
                roles: role,
                skills: skill,
            };
            let posts = feed::open_posts(client.all_posts(&filter.query()).await?);
            let authors = client.author_names(&posts).await;
            let user_id = client.session().user_id();
            print_posts(&posts, &authors, user_id.as_deref());
        }
        Command::Post { id } => {
            let post = client.post(&id).await?;
            let authors = client.author_names(slice::from_ref(&post)).await;
            print_post_details(&post, &authors);
        }
        Command::MyPosts => {
            let user_id = signed_in_user(client)?;
            let posts = client.user_posts(&user_id).await?;
            let authors = client.author_names(&posts).await;
            print_posts(&posts, &authors, None);
        }
        Command::Applied => {
            let user_id = signed_in_user(client)?;
            print_applications(&client.applied_posts(&user_id).await?, &user_id);
        }
        Command::CreatePost {
            title,
            description,
            tech_stack,
            roles,
            tags,
        } => {
            let draft = PostDraft {
                title,
                description,
                tech_stack: identifiers(&tech_stack),
                roles_required: roles,
                tags: identifiers(&tags),
                status: PostStatus::Open,
                created_by: Some(signed_in_user(client)?),
            };
            let post = client.create_post(&draft).await?;
            println!("Created post {}", post.id);
        }
        Command::EditPost {
            id,
            title,
            description,
            tech_stack,
            roles,
        } => {
            let mut post = client.post(&id).await?;
            if title.is_some() || description.is_some() {
                let draft = PostDraft {
                    title: title.unwrap_or(post.title),
                    description: description.or(post.description).unwrap_or_default(),
                    tech_stack: post.tech_stack,
                    roles_required: post.roles_required,
                    tags: post.tags,
                    status: post.status,
                    created_by: post.created_by,
                };
                post = client.update_post(&id, &draft).await?;
            }
            if !tech_stack.is_empty() {
                post = client
                    .update_tech_stack(&id, &identifiers(&tech_stack))
                    .await?;
            }
            if !roles.is_empty() {
                post = client.update_roles_required(&id, &roles).await?;
            }
            let authors = client.author_names(slice::from_ref(&post)).await;
            print_post_details(&post, &authors);
        }
        Command::DeletePost { id } => println!("{}", client.delete_post(&id).await?),
        Command::ToggleStatus { id } => {
            let status = client.post(&id).await?.status.toggled();
            client.update_post_status(&id, status).await?;
            println!("Post {id} is {status} now");
        }
        Command::Apply {
            post_id,
            role,
            skills,
            pitch,
        } => {
            let role = reverse_enum_label(&role);
            client
                .apply(&post_id, &role, identifiers(&skills), pitch)
                .await?;
            println!(
                "Applied as {} for post {post_id}",
                format_enum_label(&role)
            );
        }
        Command::Withdraw { post_id } => {
            let user_id = signed_in_user(client)?;
            println!("{}", client.withdraw(&post_id, &user_id).await?);
        }
        Command::ApplicantStatus {
            post_id,
            applicant_id,
            status,
            subject,
            body,
        } => {
            let post = client.post(&post_id).await?;
            let applicant = post
                .applicants
                .into_iter()
                .find(|applicant| applicant.user_id == applicant_id)
                .ok_or_else(|| eyre!("User {applicant_id} did not apply for post {post_id}"))?;

            let mail = match subject {
                Some(subject) => {
                    let profile = client.profile(&applicant_id).await?;
                    let receiver_mail = profile
                        .email
                        .ok_or_else(|| eyre!("User {applicant_id} has no email to notify"))?;
                    Some(MailData {
                        receiver_mail,
                        subject,
                        body: body.unwrap_or_default(),
                    })
                }
                None => None,
            };

            client
                .update_applicant_status(&post_id, applicant, status, mail)
                .await?;
            println!("Applicant {applicant_id} is {status}");
        }
        Command::Profile { id } => {
            let profile = match id {
                Some(id) => client.profile(&id).await?,
                None => client.my_profile().await?,
            };
            print_profile(&profile);
        }
        Command::UpdateProfile { bio, skills } => {
            let profile = client.update_profile(bio, identifiers(&skills)).await?;
            print_profile(&profile);
        }
        Command::AddSkills { skills } => {
            let user_id = signed_in_user(client)?;
            let skills = client.add_skills(&user_id, &identifiers(&skills)).await?;
            println!("Skills: {}", labels(&skills));
        }
        Command::Stats => match client.platform_stats().await? {
            Some(stats) => println!(
                "{} developers, {} active projects",
                stats.developers, stats.active_projects
            ),
            None => println!("No statistics collected yet"),
        },
        Command::Skills {
            user: Some(user_id),
            ..
        } => println!("Skills: {}", labels(&client.user_skills(&user_id).await?)),
        Command::Skills { user: None, search } => {
            print_options(&client.all_skills().await?, search)
        }
        Command::Roles { search } => print_options(&client.all_roles().await?, search),
    }

    Ok(())
}

fn signed_in_user(client: &Client) -> Result<String, api::Error> {
    client.session().user_id().ok_or(api::Error::NotSignedIn)
}

/// Accepts both labels and identifiers
fn identifiers(values: &[String]) -> Vec<String> {
    values.iter().map(|value| reverse_enum_label(value)).collect()
}

fn labels(values: &[String]) -> String {
    values
        .iter()
        .map(|value| format_enum_label(value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn whoami(client: &Client) {
    match client.session().claims() {
        Some(claims) => println!(
            "{} <{}> ({})",
            claims.username, claims.email, claims.subject
        ),
        None => println!("Not signed in"),
    }
}

fn print_message(response: AuthResponse) {
    let message = response
        .success
        .or(response.message)
        .or(response.status)
        .unwrap_or_else(|| "Done".to_owned());
    println!("{message}");
}

fn print_options(options: &[String], search: Option<String>) {
    match search {
        Some(search) => {
            for option in feed::matching_options(options, &[], &search) {
                println!("{}", format_enum_label(option));
            }
        }
        None => {
            for option in options {
                println!("{}", format_enum_label(option));
            }
        }
    }
}

fn print_posts(posts: &[Post], authors: &HashMap<String, String>, user_id: Option<&str>) {
    if posts.is_empty() {
        println!("No posts");
        return;
    }

    let now = Local::now().naive_local();
    for post in posts {
        let age = post
            .created_at
            .map(|created_at| feed::time_ago(created_at, now))
            .unwrap_or_default();
        let applied = match user_id {
            Some(user_id) if feed::has_applied(post, user_id) => " [applied]",
            _ => "",
        };

        println!(
            "{}  {}  {}  by {}  {age}{applied}",
            post.id,
            post.title,
            post.status,
            feed::author_name(authors, post)
        );

        let roles: Vec<_> = post
            .roles_required
            .iter()
            .map(|role| role.role.clone())
            .collect();
        if !roles.is_empty() {
            println!("    looking for: {}", labels(&roles));
        }
        if !post.tech_stack.is_empty() {
            println!("    tech stack: {}", labels(&post.tech_stack));
        }
    }
}

fn print_post_details(post: &Post, authors: &HashMap<String, String>) {
    println!("{} [{}]", post.title, post.status);
    println!("by {}", feed::author_name(authors, post));
    if let Some(description) = &post.description {
        println!("\n{description}\n");
    }
    if !post.tech_stack.is_empty() {
        println!("Tech stack: {}", labels(&post.tech_stack));
    }
    if !post.tags.is_empty() {
        println!("Tags: {}", labels(&post.tags));
    }

    for role in &post.roles_required {
        print!("Role: {} x{}", format_enum_label(&role.role), role.openings);
        if !role.required_skills.is_empty() {
            print!(" ({})", labels(&role.required_skills));
        }
        println!();
    }

    println!("Applications: {}", post.applied);
    for applicant in &post.applicants {
        println!(
            "  {} as {} [{}]",
            applicant.user_id,
            format_enum_label(&applicant.role_applied),
            applicant.status
        );
        if let Some(pitch) = &applicant.applicant_pitch {
            println!("    {pitch}");
        }
    }
}

/// Posts with the user's own application for each
fn print_applications(posts: &[Post], user_id: &str) {
    let applications: Vec<_> = posts
        .iter()
        .filter_map(|post| Some((post, feed::my_application(post, user_id)?)))
        .collect();
    if applications.is_empty() {
        println!("No applications");
        return;
    }

    for (post, application) in applications {
        println!("{}  {}  {}", post.id, post.title, post.status);
        println!(
            "    applied for: {} [{}]",
            format_enum_label(&application.role_applied),
            application.status
        );
    }
}

fn print_profile(profile: &UserProfile) {
    print!("{}", profile.username);
    if let Some(email) = &profile.email {
        print!(" <{email}>");
    }
    println!();

    if let Some(bio) = &profile.bio {
        println!("{bio}");
    }
    if !profile.skills.is_empty() {
        println!("Skills: {}", labels(&profile.skills));
    }
}
