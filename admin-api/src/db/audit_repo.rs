use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::listing::{ListFilter, PgListing};
use crate::error::Result;
use crate::models::{AuditLog, CreateAuditLog};

const AUDIT_COLUMNS: &str =
    "id, admin_id, action, resource_type, resource_id, details, ip_address, user_agent, created_at";

#[derive(Debug, Default)]
pub struct AuditLogFilter {
    pub admin_id: Option<Uuid>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
}

impl ListFilter for AuditLogFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(admin_id) = self.admin_id {
            qb.push(" AND admin_id = ");
            qb.push_bind(admin_id);
        }
        if let Some(action) = &self.action {
            qb.push(" AND action = ");
            qb.push_bind(action.clone());
        }
        if let Some(resource_type) = &self.resource_type {
            qb.push(" AND resource_type = ");
            qb.push_bind(resource_type.clone());
        }
    }
}

pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn listing(&self) -> PgListing<AuditLog, AuditLogFilter> {
        PgListing::new(self.pool.clone(), "audit_logs", AUDIT_COLUMNS, "created_at DESC, id")
    }

    pub async fn insert(&self, entry: CreateAuditLog) -> Result<AuditLog> {
        let log = sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            INSERT INTO audit_logs (admin_id, action, resource_type, resource_id, details, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            AUDIT_COLUMNS
        ))
        .bind(entry.admin_id)
        .bind(entry.action.as_str())
        .bind(entry.resource_type.as_str())
        .bind(entry.resource_id)
        .bind(entry.details)
        .bind(entry.ip_address)
        .bind(entry.user_agent)
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_conditions() {
        let filter = AuditLogFilter {
            admin_id: Some(Uuid::new_v4()),
            action: Some("ban_user".to_string()),
            resource_type: None,
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM audit_logs WHERE 1=1");
        filter.push_conditions(&mut qb);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM audit_logs WHERE 1=1 AND admin_id = $1 AND action = $2"
        );
    }
}
