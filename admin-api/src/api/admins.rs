use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use pagination::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::AdminFilter;
use crate::error::{AppError, Result};
use crate::middleware::{AdminRole, CurrentAdmin};
use crate::models::{Admin, AuditAction, ResourceType, UpdateAdmin, ADMIN_STATUS_ACTIVE, ADMIN_STATUS_DISABLED};
use crate::services::{AdminService, AuditService};
use crate::utils::{lenient_int, non_empty, parse_id, RequestMeta};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_admins).post(create_admin))
        .route("/:id", get(get_admin).put(update_admin).delete(delete_admin))
        .route("/:id/password", put(change_password))
        .route("/:id/avatar", post(upload_avatar))
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub avatar: Option<String>,
    pub status: String,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id.to_string(),
            email: admin.email,
            name: admin.name,
            role: admin.role,
            avatar: admin.avatar,
            status: admin.status,
            last_login_at: admin.last_login_at.map(|t| t.to_rfc3339()),
            created_at: admin.created_at.to_rfc3339(),
            updated_at: admin.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListAdminsQuery {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

async fn list_admins(
    State(state): State<AppState>,
    Query(query): Query<ListAdminsQuery>,
) -> Result<Json<Page<AdminResponse>>> {
    let filter = AdminFilter {
        role: non_empty(query.role),
        status: non_empty(query.status),
        search: non_empty(query.search),
    };

    let page = AdminService::new(state.db.clone())
        .list(filter, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(page.map(AdminResponse::from)))
}

async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdminResponse>> {
    let admin_id = parse_id(&id, "admin")?;
    let admin = AdminService::new(state.db.clone()).get(admin_id).await?;
    Ok(Json(admin.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub role: AdminRole,
}

async fn create_admin(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Json(payload): Json<CreateAdminRequest>,
) -> Result<Json<AdminResponse>> {
    current_admin.require(current_admin.role.can_manage_admins())?;
    payload.validate()?;

    let admin = AdminService::new(state.db.clone())
        .create(&payload.email, &payload.password, &payload.name, payload.role)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::CreateAdmin,
            ResourceType::Admin,
            Some(admin.id),
            Some(serde_json::json!({ "email": admin.email, "role": admin.role })),
        )
        .await;

    Ok(Json(admin.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdminRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub role: Option<AdminRole>,
    pub status: Option<String>,
}

async fn update_admin(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAdminRequest>,
) -> Result<Json<AdminResponse>> {
    current_admin.require(current_admin.role.can_manage_admins())?;
    payload.validate()?;
    let admin_id = parse_id(&id, "admin")?;

    if let Some(status) = payload.status.as_deref() {
        if status != ADMIN_STATUS_ACTIVE && status != ADMIN_STATUS_DISABLED {
            return Err(AppError::BadRequest(format!("Unknown status '{}'", status)));
        }
    }

    let details = serde_json::json!({
        "name": payload.name,
        "role": payload.role.map(|r| r.as_str()),
        "status": payload.status,
    });
    let changes = UpdateAdmin {
        name: payload.name.map(|n| n.trim().to_string()),
        role: payload.role,
        status: payload.status,
    };

    let admin = AdminService::new(state.db.clone())
        .update(&current_admin, admin_id, changes)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::UpdateAdmin,
            ResourceType::Admin,
            Some(admin.id),
            Some(details),
        )
        .await;

    Ok(Json(admin.into()))
}

async fn delete_admin(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    current_admin.require(current_admin.role.can_manage_admins())?;
    let admin_id = parse_id(&id, "admin")?;

    AdminService::new(state.db.clone())
        .delete(&current_admin, admin_id, &state.storage)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::DeleteAdmin,
            ResourceType::Admin,
            Some(admin_id),
            None,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Admin deleted" })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

async fn change_password(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    let admin_id = parse_id(&id, "admin")?;
    if admin_id != current_admin.id {
        current_admin.require(current_admin.role.can_manage_admins())?;
    }

    AdminService::new(state.db.clone())
        .change_password(
            &current_admin,
            admin_id,
            payload.current_password.as_deref(),
            &payload.new_password,
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::ChangePassword,
            ResourceType::Admin,
            Some(admin_id),
            None,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Password updated" })))
}

async fn upload_avatar(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<AdminResponse>> {
    let admin_id = parse_id(&id, "admin")?;
    if admin_id != current_admin.id {
        current_admin.require(current_admin.role.can_manage_admins())?;
    }

    let image = state.storage.read_image(multipart, "file").await?;
    let admin = AdminService::new(state.db.clone())
        .set_avatar(admin_id, &state.storage, &image)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::UploadFile,
            ResourceType::Admin,
            Some(admin_id),
            Some(serde_json::json!({ "avatar": admin.avatar })),
        )
        .await;

    Ok(Json(admin.into()))
}
