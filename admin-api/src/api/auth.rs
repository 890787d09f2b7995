use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::admins::AdminResponse;
use crate::error::Result;
use crate::middleware::CurrentAdmin;
use crate::models::{AuditAction, CreateAuditLog, ResourceType};
use crate::services::{AdminService, AuditService, AuthService};
use crate::utils::RequestMeta;
use crate::AppState;

/// Routes reachable without a token
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
}

/// Routes that need an authenticated session
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_current_admin))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub admin: AdminResponse,
}

async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    payload.validate()?;

    let outcome = AuthService::from_state(&state)
        .login(&payload.email, &payload.password)
        .await?;

    AuditService::new(state.db.clone())
        .log(CreateAuditLog {
            admin_id: outcome.admin.id,
            action: AuditAction::Login,
            resource_type: ResourceType::Session,
            resource_id: Some(outcome.admin.id.to_string()),
            details: Some(serde_json::json!({
                "email": outcome.admin.email,
                "login_time": chrono::Utc::now().to_rfc3339()
            })),
            ip_address: meta.ip_address,
            user_agent: meta.user_agent,
        })
        .await;

    Ok(Json(LoginResponse {
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token,
        admin: outcome.admin.into(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>> {
    let access_token = AuthService::from_state(&state)
        .refresh(&payload.refresh_token)
        .await?;

    Ok(Json(RefreshResponse { access_token }))
}

async fn logout(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
) -> Result<Json<serde_json::Value>> {
    AuthService::from_state(&state).logout(&current_admin).await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::Logout,
            ResourceType::Session,
            Some(current_admin.id),
            Some(serde_json::json!({
                "logout_time": chrono::Utc::now().to_rfc3339()
            })),
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

async fn get_current_admin(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
) -> Result<Json<AdminResponse>> {
    let admin = AdminService::new(state.db.clone()).get(current_admin.id).await?;
    Ok(Json(admin.into()))
}
