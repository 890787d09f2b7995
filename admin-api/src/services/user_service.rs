use pagination::{Page, PageRequest};
use uuid::Uuid;

use super::{hash_password, paginate};
use crate::db::{Database, UserFilter};
use crate::error::{AppError, Result};
use crate::models::{CreateUser, UpdateUser, User};
use crate::storage::{FileStorage, UploadedImage};

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub is_streamer: bool,
}

pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: UserFilter, request: PageRequest) -> Result<Page<User>> {
        let listing = self.db.users().listing();
        paginate(&self.db, &listing, &filter, request).await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.db
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn create(&self, input: NewUser) -> Result<User> {
        let password_hash = hash_password(&input.password)?;
        let username = input.username.trim().to_string();
        let nickname = input
            .nickname
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.clone());

        let user = self
            .db
            .users()
            .create(CreateUser {
                username,
                email: input.email.trim().to_lowercase(),
                password_hash,
                nickname,
                bio: input.bio,
                is_streamer: input.is_streamer,
            })
            .await?;

        self.db.dashboard_cache().invalidate().await;
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, mut changes: UpdateUser) -> Result<User> {
        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        changes.email = changes.email.map(|e| e.trim().to_lowercase());

        let user = self
            .db
            .users()
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.db.dashboard_cache().invalidate().await;
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid, storage: &FileStorage) -> Result<()> {
        let existing = self.get(id).await?;
        if !self.db.users().delete(id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if let Some(avatar) = existing.avatar {
            storage.remove(&avatar).await;
        }

        self.db.dashboard_cache().invalidate().await;
        Ok(())
    }

    pub async fn ban(&self, id: Uuid, reason: &str) -> Result<User> {
        let existing = self.get(id).await?;
        if existing.is_banned() {
            return Err(AppError::Conflict("User is already banned".to_string()));
        }

        let user = self
            .db
            .users()
            .ban(id, reason.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.db.dashboard_cache().invalidate().await;
        Ok(user)
    }

    pub async fn unban(&self, id: Uuid) -> Result<User> {
        let existing = self.get(id).await?;
        if !existing.is_banned() {
            return Err(AppError::Conflict("User is not banned".to_string()));
        }

        let user = self
            .db
            .users()
            .unban(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.db.dashboard_cache().invalidate().await;
        Ok(user)
    }

    pub async fn set_avatar(&self, id: Uuid, storage: &FileStorage, image: &UploadedImage) -> Result<User> {
        let existing = self.get(id).await?;
        let url = storage.save_image(image).await?;

        let updated = match self.db.users().set_avatar(id, &url).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                storage.remove(&url).await;
                return Err(AppError::NotFound("User not found".to_string()));
            }
            Err(e) => {
                storage.remove(&url).await;
                return Err(e);
            }
        };

        if let Some(old) = existing.avatar {
            storage.remove(&old).await;
        }

        Ok(updated)
    }
}
