use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::auth::responses::Role;

// ===== Users =====

/// Stored identity record. Carries the password hash, so it is never
/// serialized directly; use [`UserProfile`] for responses.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub profile_pic: Option<String>,
    /// `None` when the stored value is NULL or outside the known roles.
    pub role: Option<Role>,
    pub joined_at: Option<DateTime<Utc>>,
}

/// Input for creating a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub profile_pic: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub profile_pic: Option<String>,
    pub role: Option<Role>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            department: user.department.clone(),
            designation: user.designation.clone(),
            profile_pic: user.profile_pic.clone(),
            role: user.role,
            joined_at: user.joined_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct UserRef {
    pub id: i32,
    pub name: String,
}

// ===== Shoutouts =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Clap,
    Star,
}

impl ReactionType {
    pub const ALL: [ReactionType; 3] = [ReactionType::Like, ReactionType::Clap, ReactionType::Star];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Clap => "clap",
            ReactionType::Star => "star",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "like" => Some(ReactionType::Like),
            "clap" => Some(ReactionType::Clap),
            "star" => Some(ReactionType::Star),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReactionCounts {
    pub like: i64,
    pub clap: i64,
    pub star: i64,
}

impl ReactionCounts {
    pub fn add(&mut self, kind: ReactionType, count: i64) {
        match kind {
            ReactionType::Like => self.like += count,
            ReactionType::Clap => self.clap += count,
            ReactionType::Star => self.star += count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct Shoutout {
    pub id: i32,
    pub sender_id: i32,
    pub message: String,
    pub department: Option<String>,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FeedItem {
    #[serde(flatten)]
    pub shoutout: Shoutout,
    pub recipients: Vec<UserRef>,
    pub reactions: ReactionCounts,
    pub comments_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
}

// ===== Comments =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommentView {
    pub id: i32,
    pub shoutout_id: i32,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub user: Option<UserRef>,
}

// ===== Reports =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct Report {
    pub id: i32,
    pub shoutout_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub reported_by: i32,
    pub reason: String,
    pub created_at: Option<DateTime<Utc>>,
}

// ===== Admin analytics =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct UserCount {
    pub user_id: i32,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct DepartmentCount {
    pub department: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Analytics {
    pub top_contributors: Vec<UserCount>,
    pub most_tagged: Vec<UserCount>,
    pub active_departments: Vec<DepartmentCount>,
}

// ===== Generic responses =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}
