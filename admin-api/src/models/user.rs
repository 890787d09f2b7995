use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const USER_STATUS_ACTIVE: &str = "active";
pub const USER_STATUS_BANNED: &str = "banned";

/// Platform account (viewer or streamer) as seen by the admin backend
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub status: String,
    pub ban_reason: Option<String>,
    pub is_streamer: bool,
    pub followers_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_banned(&self) -> bool {
        self.status == USER_STATUS_BANNED
    }
}

#[derive(Debug)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub bio: Option<String>,
    pub is_streamer: bool,
}

#[derive(Debug, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub is_streamer: Option<bool>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.nickname.is_none()
            && self.bio.is_none()
            && self.is_streamer.is_none()
    }
}
