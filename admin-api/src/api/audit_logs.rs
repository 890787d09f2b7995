use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use pagination::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::AuditLogFilter;
use crate::error::Result;
use crate::models::AuditLog;
use crate::services::AuditService;
use crate::utils::{lenient_int, non_empty};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub id: String,
    pub admin_id: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id.to_string(),
            admin_id: log.admin_id.to_string(),
            action: log.action,
            resource_type: log.resource_type,
            resource_id: log.resource_id,
            details: log.details,
            ip_address: log.ip_address,
            user_agent: log.user_agent,
            created_at: log.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListAuditLogsQuery {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
    pub admin_id: Option<Uuid>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
}

async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<ListAuditLogsQuery>,
) -> Result<Json<Page<AuditLogResponse>>> {
    let filter = AuditLogFilter {
        admin_id: query.admin_id,
        action: non_empty(query.action),
        resource_type: non_empty(query.resource_type),
    };

    let page = AuditService::new(state.db.clone())
        .list(filter, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(page.map(AuditLogResponse::from)))
}
