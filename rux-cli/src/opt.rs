use clap::{Parser, Subcommand};
use clio::Input;

use crate::feed::reverse_enum_label;
use crate::model::{ApplicantStatus, RoleRequirement};

#[derive(Debug, Parser)]
#[command(name = "rux", about = "RuX project collaboration client", version)]
pub struct Opt {
    /// Config file path, built-in defaults are used without it
    #[arg(short, long, value_parser)]
    pub config: Option<Input>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Registers a new account, verification code is sent to the email
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Confirms the pending signup with the emailed code
    VerifyOtp { code: String },
    /// Sends a new verification code for the pending signup
    ResendOtp,
    /// Logs in with email or username
    Login {
        #[arg(long, required_unless_present = "username", conflicts_with = "username")]
        email: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: String,
    },
    /// Forgets the session token
    Logout,
    /// Shows the logged in user
    Whoami,
    /// Checks the session token against the server
    Validate,
    /// Starts password reset, the reset link is sent to the email
    ForgotPassword { email: String },
    /// Sets a new password with the token from the reset link
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long)]
        password: String,
    },
    /// Lists open posts
    Feed {
        /// Role to look for, only the first one is used by the server
        #[arg(long)]
        role: Vec<String>,
        /// Skill to look for, only the first one is used by the server
        #[arg(long)]
        skill: Vec<String>,
    },
    /// Shows a single post
    Post { id: String },
    /// Lists posts created by the logged in user
    MyPosts,
    /// Lists posts the logged in user applied to
    Applied,
    /// Publishes a new post
    CreatePost {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Technology used by the project
        #[arg(long = "tech")]
        tech_stack: Vec<String>,
        /// Wanted role as `ROLE[:SKILL,SKILL...][:OPENINGS]`
        #[arg(long = "role", value_parser = parse_role)]
        roles: Vec<RoleRequirement>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Changes an existing post, fields not given are kept
    EditPost {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Replaces the tech stack
        #[arg(long = "tech")]
        tech_stack: Vec<String>,
        /// Replaces wanted roles, as `ROLE[:SKILL,SKILL...][:OPENINGS]`
        #[arg(long = "role", value_parser = parse_role)]
        roles: Vec<RoleRequirement>,
    },
    /// Deletes a post
    DeletePost { id: String },
    /// Opens a closed post or closes an open one
    ToggleStatus { id: String },
    /// Applies for a role in a post
    Apply {
        post_id: String,
        #[arg(long)]
        role: String,
        #[arg(long = "skill")]
        skills: Vec<String>,
        /// Few words on why you fit
        #[arg(long)]
        pitch: Option<String>,
    },
    /// Withdraws the application for a post
    Withdraw { post_id: String },
    /// Accepts or rejects an applicant of your post
    ApplicantStatus {
        post_id: String,
        applicant_id: String,
        #[arg(value_enum)]
        status: ApplicantStatus,
        /// Subject of the notification mail, no mail is sent without it
        #[arg(long)]
        subject: Option<String>,
        #[arg(long, requires = "subject")]
        body: Option<String>,
    },
    /// Shows user profile, the logged in user by default
    Profile { id: Option<String> },
    /// Updates bio and skills of the logged in user
    UpdateProfile {
        #[arg(long)]
        bio: Option<String>,
        #[arg(long = "skill")]
        skills: Vec<String>,
    },
    /// Adds skills to the logged in user
    AddSkills {
        #[arg(required = true)]
        skills: Vec<String>,
    },
    /// Shows platform statistics
    Stats,
    /// Lists known skills
    Skills {
        /// Lists skills of this user instead
        #[arg(long, conflicts_with = "search")]
        user: Option<String>,
        /// Narrows the list to skills matching the text
        #[arg(long)]
        search: Option<String>,
    },
    /// Lists known roles
    Roles {
        /// Narrows the list to roles matching the text
        #[arg(long)]
        search: Option<String>,
    },
}

/// Parses `ROLE[:SKILL,SKILL...][:OPENINGS]`
///
/// Role and skills may be given either as identifiers or as labels.
fn parse_role(arg: &str) -> Result<RoleRequirement, String> {
    let mut parts = arg.split(':');
    let role = parts
        .next()
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .ok_or_else(|| "role name is missing".to_owned())?;

    let required_skills: Vec<String> = parts
        .next()
        .map(|skills| {
            skills
                .split(',')
                .map(str::trim)
                .filter(|skill| !skill.is_empty())
                .map(reverse_enum_label)
                .collect()
        })
        .unwrap_or_default();

    let openings = match parts.next() {
        Some(openings) => openings
            .trim()
            .parse::<u32>()
            .map_err(|err| format!("invalid openings `{openings}`: {err}"))?,
        None => 1,
    };

    if parts.next().is_some() {
        return Err(format!("too many parts in `{arg}`"));
    }

    Ok(RoleRequirement {
        role: reverse_enum_label(role),
        required_skills,
        openings,
    })
}
