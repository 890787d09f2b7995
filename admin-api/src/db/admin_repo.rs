//! Admin account database operations

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::listing::{contains_pattern, ListFilter, PgListing};
use crate::error::{AppError, Result};
use crate::models::{Admin, CreateAdmin, UpdateAdmin};

const ADMIN_COLUMNS: &str = "id, email, password_hash, name, role, avatar, status, \
     login_attempts, locked_until, last_login_at, created_at, updated_at";

#[derive(Debug, Default)]
pub struct AdminFilter {
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListFilter for AdminFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(role) = &self.role {
            qb.push(" AND role = ");
            qb.push_bind(role.clone());
        }
        if let Some(status) = &self.status {
            qb.push(" AND status = ");
            qb.push_bind(status.clone());
        }
        if let Some(pattern) = self.search.as_deref().and_then(contains_pattern) {
            qb.push(" AND (name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR email ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
    }
}

pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn listing(&self) -> PgListing<Admin, AdminFilter> {
        PgListing::new(self.pool.clone(), "admins", ADMIN_COLUMNS, "created_at DESC, id")
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {} FROM admins WHERE id = $1",
            ADMIN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {} FROM admins WHERE LOWER(email) = LOWER($1)",
            ADMIN_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    pub async fn create(&self, input: CreateAdmin) -> Result<Admin> {
        sqlx::query_as::<_, Admin>(&format!(
            r#"
            INSERT INTO admins (email, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ADMIN_COLUMNS
        ))
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.name)
        .bind(input.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Email is already registered"))
    }

    pub async fn update(&self, id: Uuid, changes: UpdateAdmin) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            r#"
            UPDATE admins SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                status = COALESCE($4, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ADMIN_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE admins SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_avatar(&self, id: Uuid, avatar: &str) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "UPDATE admins SET avatar = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ADMIN_COLUMNS
        ))
        .bind(id)
        .bind(avatar)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_role(&self, role: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admins WHERE role = $1 AND status = 'active'",
        )
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn clear_lock(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE admins SET locked_until = NULL, login_attempts = 0 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn record_failed_login(
        &self,
        id: Uuid,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query("UPDATE admins SET login_attempts = $2, locked_until = $3 WHERE id = $1")
            .bind(id)
            .bind(attempts)
            .bind(locked_until)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn record_successful_login(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE admins SET last_login_at = NOW(), login_attempts = 0, locked_until = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_binds_every_value() {
        let filter = AdminFilter {
            role: Some("admin".to_string()),
            status: Some("active".to_string()),
            search: Some("ali'; DROP TABLE admins; --".to_string()),
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM admins WHERE 1=1");
        filter.push_conditions(&mut qb);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM admins WHERE 1=1 AND role = $1 AND status = $2 \
             AND (name ILIKE $3 OR email ILIKE $4)"
        );
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = AdminFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("SELECT 1 FROM admins WHERE 1=1");
        filter.push_conditions(&mut qb);

        assert_eq!(qb.sql(), "SELECT 1 FROM admins WHERE 1=1");
    }
}
