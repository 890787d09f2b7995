use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::listing::{contains_pattern, ListFilter, PgListing};
use crate::error::{AppError, Result};
use crate::models::{CreateUser, UpdateUser, User, USER_STATUS_ACTIVE, USER_STATUS_BANNED};

const USER_COLUMNS: &str = "id, username, email, nickname, avatar, bio, status, ban_reason, \
     is_streamer, followers_count, created_at, updated_at";

#[derive(Debug, Default)]
pub struct UserFilter {
    pub status: Option<String>,
    pub is_streamer: Option<bool>,
    pub search: Option<String>,
}

impl ListFilter for UserFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(status) = &self.status {
            qb.push(" AND status = ");
            qb.push_bind(status.clone());
        }
        if let Some(is_streamer) = self.is_streamer {
            qb.push(" AND is_streamer = ");
            qb.push_bind(is_streamer);
        }
        if let Some(pattern) = self.search.as_deref().and_then(contains_pattern) {
            qb.push(" AND (username ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR nickname ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR email ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
    }
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn listing(&self) -> PgListing<User, UserFilter> {
        PgListing::new(self.pool.clone(), "users", USER_COLUMNS, "created_at DESC, id")
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    pub async fn create(&self, input: CreateUser) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, nickname, bio, is_streamer)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.nickname)
        .bind(&input.bio)
        .bind(input.is_streamer)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Username or email is already taken"))
    }

    pub async fn update(&self, id: Uuid, changes: UpdateUser) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                nickname = COALESCE($3, nickname),
                bio = COALESCE($4, bio),
                is_streamer = COALESCE($5, is_streamer),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.nickname)
        .bind(changes.bio)
        .bind(changes.is_streamer)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Email is already taken"))
    }

    pub async fn set_avatar(&self, id: Uuid, avatar: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(avatar)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn ban(&self, id: Uuid, reason: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET status = $2, ban_reason = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(USER_STATUS_BANNED)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn unban(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET status = $2, ban_reason = NULL, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(USER_STATUS_ACTIVE)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_conditions() {
        let filter = UserFilter {
            status: Some("banned".to_string()),
            is_streamer: Some(true),
            search: Some("neo".to_string()),
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        filter.push_conditions(&mut qb);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM users WHERE 1=1 AND status = $1 AND is_streamer = $2 \
             AND (username ILIKE $3 OR nickname ILIKE $4 OR email ILIKE $5)"
        );
    }

    #[test]
    fn test_streamer_flag_false_still_filters() {
        let filter = UserFilter {
            is_streamer: Some(false),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("SELECT 1 FROM users WHERE 1=1");
        filter.push_conditions(&mut qb);

        assert_eq!(qb.sql(), "SELECT 1 FROM users WHERE 1=1 AND is_streamer = $1");
    }
}
