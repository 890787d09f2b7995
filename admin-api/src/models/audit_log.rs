use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CreateAuditLog {
    pub admin_id: Uuid,
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Auth
    Login,
    Logout,
    // Admin management
    CreateAdmin,
    UpdateAdmin,
    DeleteAdmin,
    ChangePassword,
    // User management
    CreateUser,
    UpdateUser,
    DeleteUser,
    BanUser,
    UnbanUser,
    // Catalog
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    // Stream statistics
    CreateStreamStat,
    UpdateStreamStat,
    DeleteStreamStat,
    // Files
    UploadFile,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::CreateAdmin => "create_admin",
            AuditAction::UpdateAdmin => "update_admin",
            AuditAction::DeleteAdmin => "delete_admin",
            AuditAction::ChangePassword => "change_password",
            AuditAction::CreateUser => "create_user",
            AuditAction::UpdateUser => "update_user",
            AuditAction::DeleteUser => "delete_user",
            AuditAction::BanUser => "ban_user",
            AuditAction::UnbanUser => "unban_user",
            AuditAction::CreateCategory => "create_category",
            AuditAction::UpdateCategory => "update_category",
            AuditAction::DeleteCategory => "delete_category",
            AuditAction::CreateStreamStat => "create_stream_stat",
            AuditAction::UpdateStreamStat => "update_stream_stat",
            AuditAction::DeleteStreamStat => "delete_stream_stat",
            AuditAction::UploadFile => "upload_file",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Admin,
    User,
    Category,
    StreamStat,
    Session,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Admin => "admin",
            ResourceType::User => "user",
            ResourceType::Category => "category",
            ResourceType::StreamStat => "stream_stat",
            ResourceType::Session => "session",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_serde_names() {
        for action in [AuditAction::BanUser, AuditAction::CreateStreamStat, AuditAction::UploadFile] {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, action.as_str());
        }
        for resource in [ResourceType::StreamStat, ResourceType::Category] {
            let json = serde_json::to_value(resource).unwrap();
            assert_eq!(json, resource.as_str());
        }
    }
}
