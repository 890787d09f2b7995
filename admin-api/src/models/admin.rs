use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::middleware::AdminRole;

pub const ADMIN_STATUS_ACTIVE: &str = "active";
pub const ADMIN_STATUS_DISABLED: &str = "disabled";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub avatar: Option<String>,
    pub status: String,
    pub login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn role(&self) -> AdminRole {
        AdminRole::parse(&self.role).unwrap_or(AdminRole::Moderator)
    }

    pub fn is_active(&self) -> bool {
        self.status == ADMIN_STATUS_ACTIVE
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

#[derive(Debug)]
pub struct CreateAdmin {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: AdminRole,
}

#[derive(Debug, Default)]
pub struct UpdateAdmin {
    pub name: Option<String>,
    pub role: Option<AdminRole>,
    pub status: Option<String>,
}

impl UpdateAdmin {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn admin(role: &str) -> Admin {
        let now = Utc::now();
        Admin {
            id: Uuid::new_v4(),
            email: "ops@example.com".to_string(),
            password_hash: String::new(),
            name: "Ops".to_string(),
            role: role.to_string(),
            avatar: None,
            status: ADMIN_STATUS_ACTIVE.to_string(),
            login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_role_parsing_falls_back_to_moderator() {
        assert_eq!(admin("super_admin").role(), AdminRole::SuperAdmin);
        assert_eq!(admin("admin").role(), AdminRole::Admin);
        assert_eq!(admin("something_else").role(), AdminRole::Moderator);
    }

    #[test]
    fn test_lock_expiry() {
        let now = Utc::now();
        let mut a = admin("admin");
        assert!(!a.is_locked(now));

        a.locked_until = Some(now + Duration::minutes(5));
        assert!(a.is_locked(now));

        a.locked_until = Some(now - Duration::minutes(5));
        assert!(!a.is_locked(now));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(admin("admin")).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
