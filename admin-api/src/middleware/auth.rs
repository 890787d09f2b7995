use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::Admin;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,       // Admin ID
    pub email: String,
    pub role: AdminRole,
    pub kind: TokenKind,
    pub jti: String,
    pub sid: String,       // Login session, shared by its access and refresh tokens
    pub exp: usize,        // Expiration time
    pub iat: usize,        // Issued at
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    Moderator,
}

impl AdminRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "super_admin" => Some(AdminRole::SuperAdmin),
            "admin" => Some(AdminRole::Admin),
            "moderator" => Some(AdminRole::Moderator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super_admin",
            AdminRole::Admin => "admin",
            AdminRole::Moderator => "moderator",
        }
    }

    pub fn can_manage_admins(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin)
    }

    pub fn can_ban_users(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin | AdminRole::Admin)
    }

    /// Create, update and delete users, categories and stream stats
    pub fn can_edit_catalog(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin | AdminRole::Admin)
    }
}

#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: Uuid,
    pub email: String,
    pub role: AdminRole,
    pub session_id: String,
}

impl CurrentAdmin {
    pub fn require(&self, allowed: bool) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Redis key marking a login session as ended
pub fn blacklist_key(session_id: &str) -> String {
    format!("session_blacklist:{}", session_id)
}

/// Verify signature and expiry, then check the token is of the expected kind.
pub fn decode_token(secret: &str, token: &str, expected: TokenKind) -> Result<Claims> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::Unauthorized
    })?
    .claims;

    if claims.kind != expected {
        return Err(AppError::Unauthorized);
    }

    Ok(claims)
}

pub async fn is_blacklisted(db: &Database, session_id: &str) -> Result<bool> {
    let mut conn = db
        .get_redis_conn()
        .await
        .map_err(|e| AppError::Unavailable(format!("redis: {}", e)))?;

    conn.exists(blacklist_key(session_id))
        .await
        .map_err(|e| AppError::Unavailable(format!("redis: {}", e)))
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::Unauthorized)?;

    let claims = decode_token(&state.config.jwt.secret, bearer.token(), TokenKind::Access)?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

    if is_blacklisted(&state.db, &claims.sid).await? {
        return Err(AppError::Unauthorized);
    }

    // Role and status come from the database, not the token
    let admin = state.db.admins().find_by_id(id).await?;
    let current_admin = resolve_current_admin(claims, admin)?;
    request.extensions_mut().insert(current_admin);

    Ok(next.run(request).await)
}

fn resolve_current_admin(claims: Claims, admin: Option<Admin>) -> Result<CurrentAdmin> {
    let admin = admin
        .filter(Admin::is_active)
        .ok_or(AppError::Unauthorized)?;

    Ok(CurrentAdmin {
        id: admin.id,
        role: admin.role(),
        email: admin.email,
        session_id: claims.sid,
    })
}
