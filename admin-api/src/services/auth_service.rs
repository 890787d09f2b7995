use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use redis::AsyncCommands;
use uuid::Uuid;

use crate::config::{Config, JwtConfig};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::middleware::{blacklist_key, decode_token, is_blacklisted, Claims, CurrentAdmin, TokenKind};
use crate::models::Admin;
use crate::AppState;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string())
}

/// `false` for a wrong password and for an unparseable stored hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("Stored password hash is invalid: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub admin: Admin,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    db: Database,
    config: Config,
}

impl AuthService {
    pub fn new(db: Database, config: Config) -> Self {
        Self { db, config }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.db.clone(), state.config.clone())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let admins = self.db.admins();
        let mut admin = admins.find_by_email(email).await?.ok_or(AppError::Unauthorized)?;

        let now = Utc::now();
        if let Some(locked_until) = admin.locked_until {
            if locked_until > now {
                return Err(AppError::AccountLocked(format_lock_time(locked_until)));
            }
            // Lock has expired, clear it
            admins.clear_lock(admin.id).await?;
            admin.login_attempts = 0;
            admin.locked_until = None;
        }

        if !verify_password(password, &admin.password_hash) {
            let attempts = admin.login_attempts + 1;
            let security = &self.config.security;

            if attempts >= security.max_login_attempts {
                let lock_until = now + Duration::minutes(security.lockout_duration_minutes);
                admins.record_failed_login(admin.id, attempts, Some(lock_until)).await?;
                tracing::warn!(admin_id = %admin.id, attempts, "Admin account locked after failed logins");
                return Err(AppError::AccountLocked(format_lock_time(lock_until)));
            }

            admins.record_failed_login(admin.id, attempts, None).await?;
            return Err(AppError::Unauthorized);
        }

        if !admin.is_active() {
            return Err(AppError::Unauthorized);
        }

        admins.record_successful_login(admin.id).await?;

        let session_id = Uuid::new_v4().to_string();
        let access_token = sign_token(&self.config.jwt, &admin, TokenKind::Access, &session_id)?;
        let refresh_token = sign_token(&self.config.jwt, &admin, TokenKind::Refresh, &session_id)?;

        Ok(LoginOutcome {
            admin,
            access_token,
            refresh_token,
        })
    }

    /// Trade a refresh token for a new access token carrying the admin's current role.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = decode_token(&self.config.jwt.secret, refresh_token, TokenKind::Refresh)?;
        if is_blacklisted(&self.db, &claims.sid).await? {
            return Err(AppError::Unauthorized);
        }

        let admin_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
        let admin = self
            .db
            .admins()
            .find_by_id(admin_id)
            .await?
            .filter(Admin::is_active)
            .ok_or(AppError::Unauthorized)?;

        sign_token(&self.config.jwt, &admin, TokenKind::Access, &claims.sid)
    }

    /// End the login session: its access and refresh tokens are both rejected
    /// from now on. The mark outlives the longest token of the session.
    pub async fn logout(&self, current: &CurrentAdmin) -> Result<()> {
        let ttl = session_ttl_secs(&self.config.jwt);

        let mut conn = self
            .db
            .get_redis_conn()
            .await
            .map_err(|e| AppError::Unavailable(format!("redis: {}", e)))?;
        conn.set_ex::<_, _, ()>(blacklist_key(&current.session_id), "1", ttl)
            .await
            .map_err(|e| AppError::Unavailable(format!("redis: {}", e)))?;

        tracing::info!(admin_id = %current.id, ttl, "Session blacklisted");
        Ok(())
    }
}

/// Lifetime of a login session, bounded by its refresh token
fn session_ttl_secs(jwt: &JwtConfig) -> u64 {
    (jwt.refresh_expiry_days * 24 * 60 * 60).max(1)
}

fn sign_token(jwt: &JwtConfig, admin: &Admin, kind: TokenKind, session_id: &str) -> Result<String> {
    let now = Utc::now();
    let exp = match kind {
        TokenKind::Access => now + Duration::hours(jwt.expiry_hours as i64),
        TokenKind::Refresh => now + Duration::days(jwt.refresh_expiry_days as i64),
    };

    let claims = Claims {
        sub: admin.id.to_string(),
        email: admin.email.clone(),
        role: admin.role(),
        kind,
        jti: Uuid::new_v4().to_string(),
        sid: session_id.to_string(),
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt.secret.as_bytes()))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token generation failed: {}", e)))
}

fn format_lock_time(until: DateTime<Utc>) -> String {
    until.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_format_lock_time() {
        let until = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_lock_time(until), "2024-03-01 12:30:00 UTC");
    }

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: "a-test-secret-that-is-long-enough-to-pass".to_string(),
            expiry_hours: 1,
            refresh_expiry_days: 30,
        }
    }

    fn admin() -> Admin {
        let now = Utc::now();
        Admin {
            id: Uuid::new_v4(),
            email: "ops@example.com".to_string(),
            password_hash: String::new(),
            name: "Ops".to_string(),
            role: "admin".to_string(),
            avatar: None,
            status: "active".to_string(),
            login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_logout_mark_covers_refresh_token() {
        let jwt = jwt();
        let admin = admin();
        let access = sign_token(&jwt, &admin, TokenKind::Access, "session-42").unwrap();
        let refresh = sign_token(&jwt, &admin, TokenKind::Refresh, "session-42").unwrap();

        let access = decode_token(&jwt.secret, &access, TokenKind::Access).unwrap();
        let refresh = decode_token(&jwt.secret, &refresh, TokenKind::Refresh).unwrap();

        // Logout blacklists the session of the access token; refresh checks the same key
        assert_ne!(access.jti, refresh.jti);
        assert_eq!(blacklist_key(&access.sid), blacklist_key(&refresh.sid));

        // And the mark lasts at least as long as the refresh token
        let refresh_lifetime = (refresh.exp - refresh.iat) as u64;
        assert!(session_ttl_secs(&jwt) >= refresh_lifetime);
    }

    #[test]
    fn test_token_lifetimes_follow_config() {
        let jwt = jwt();
        let token = sign_token(&jwt, &admin(), TokenKind::Access, "s").unwrap();
        let claims = decode_token(&jwt.secret, &token, TokenKind::Access).unwrap();

        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.role, crate::middleware::AdminRole::Admin);
    }
}
