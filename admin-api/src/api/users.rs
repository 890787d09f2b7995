use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use pagination::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::UserFilter;
use crate::error::{AppError, Result};
use crate::middleware::CurrentAdmin;
use crate::models::{AuditAction, ResourceType, UpdateUser, User, USER_STATUS_ACTIVE, USER_STATUS_BANNED};
use crate::services::{AuditService, NewUser, UserService};
use crate::utils::{lenient_int, non_empty, parse_id, RequestMeta};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/ban", post(ban_user))
        .route("/:id/unban", post(unban_user))
        .route("/:id/avatar", post(upload_avatar))
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub status: String,
    pub ban_reason: Option<String>,
    pub is_streamer: bool,
    pub followers_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            nickname: user.nickname,
            avatar: user.avatar,
            bio: user.bio,
            status: user.status,
            ban_reason: user.ban_reason,
            is_streamer: user.is_streamer,
            followers_count: user.followers_count,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub is_streamer: Option<bool>,
    pub search: Option<String>,
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Page<UserResponse>>> {
    let status = non_empty(query.status);
    if let Some(status) = status.as_deref() {
        if status != USER_STATUS_ACTIVE && status != USER_STATUS_BANNED {
            return Err(AppError::BadRequest(format!("Unknown status '{}'", status)));
        }
    }

    let filter = UserFilter {
        status,
        is_streamer: query.is_streamer,
        search: non_empty(query.search),
    };

    let page = UserService::new(state.db.clone())
        .list(filter, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(page.map(UserResponse::from)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user_id = parse_id(&id, "user")?;
    let user = UserService::new(state.db.clone()).get(user_id).await?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(max = 100))]
    pub nickname: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_streamer: bool,
}

async fn create_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    payload.validate()?;

    let user = UserService::new(state.db.clone())
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            nickname: payload.nickname,
            bio: payload.bio,
            is_streamer: payload.is_streamer,
        })
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::CreateUser,
            ResourceType::User,
            Some(user.id),
            Some(serde_json::json!({ "username": user.username })),
        )
        .await;

    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub nickname: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    pub is_streamer: Option<bool>,
}

async fn update_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    payload.validate()?;
    let user_id = parse_id(&id, "user")?;

    let details = serde_json::json!({
        "email": payload.email,
        "nickname": payload.nickname,
        "is_streamer": payload.is_streamer,
    });
    let user = UserService::new(state.db.clone())
        .update(
            user_id,
            UpdateUser {
                email: payload.email,
                nickname: payload.nickname,
                bio: payload.bio,
                is_streamer: payload.is_streamer,
            },
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::UpdateUser,
            ResourceType::User,
            Some(user.id),
            Some(details),
        )
        .await;

    Ok(Json(user.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    let user_id = parse_id(&id, "user")?;

    UserService::new(state.db.clone())
        .delete(user_id, &state.storage)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::DeleteUser,
            ResourceType::User,
            Some(user_id),
            None,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": format!("User {} has been deleted", id) })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BanRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

async fn ban_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<BanRequest>,
) -> Result<Json<UserResponse>> {
    current_admin.require(current_admin.role.can_ban_users())?;
    if payload.reason.trim().is_empty() {
        return Err(AppError::BadRequest("Reason is required".to_string()));
    }
    payload.validate()?;
    let user_id = parse_id(&id, "user")?;

    let user = UserService::new(state.db.clone())
        .ban(user_id, &payload.reason)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::BanUser,
            ResourceType::User,
            Some(user_id),
            Some(serde_json::json!({ "reason": payload.reason })),
        )
        .await;

    Ok(Json(user.into()))
}

async fn unban_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    current_admin.require(current_admin.role.can_ban_users())?;
    let user_id = parse_id(&id, "user")?;

    let user = UserService::new(state.db.clone()).unban(user_id).await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::UnbanUser,
            ResourceType::User,
            Some(user_id),
            None,
        )
        .await;

    Ok(Json(user.into()))
}

async fn upload_avatar(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<UserResponse>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    let user_id = parse_id(&id, "user")?;

    let image = state.storage.read_image(multipart, "file").await?;
    let user = UserService::new(state.db.clone())
        .set_avatar(user_id, &state.storage, &image)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::UploadFile,
            ResourceType::User,
            Some(user_id),
            Some(serde_json::json!({ "avatar": user.avatar })),
        )
        .await;

    Ok(Json(user.into()))
}
