use pagination::{Page, PageRequest};
use uuid::Uuid;

use super::paginate;
use crate::db::{AuditLogFilter, Database};
use crate::error::Result;
use crate::middleware::CurrentAdmin;
use crate::models::{AuditAction, AuditLog, CreateAuditLog, ResourceType};
use crate::utils::RequestMeta;

pub struct AuditService {
    db: Database,
}

impl AuditService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Write an audit entry. Failures are logged and swallowed.
    pub async fn log(&self, entry: CreateAuditLog) {
        let action = entry.action.as_str();
        let admin_id = entry.admin_id;
        if let Err(e) = self.db.audit_logs().insert(entry).await {
            tracing::warn!(%admin_id, action, "Failed to write audit log: {}", e);
        }
    }

    /// Shorthand for the common case of an admin acting on one resource.
    pub async fn record(
        &self,
        admin: &CurrentAdmin,
        meta: &RequestMeta,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: Option<Uuid>,
        details: Option<serde_json::Value>,
    ) {
        self.log(CreateAuditLog {
            admin_id: admin.id,
            action,
            resource_type,
            resource_id: resource_id.map(|id| id.to_string()),
            details,
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
        })
        .await;
    }

    pub async fn list(&self, filter: AuditLogFilter, request: PageRequest) -> Result<Page<AuditLog>> {
        let listing = self.db.audit_logs().listing();
        paginate(&self.db, &listing, &filter, request).await
    }
}
