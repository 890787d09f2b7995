use pagination::{Page, PageRequest};
use uuid::Uuid;

use super::{hash_password, paginate, verify_password};
use crate::db::{AdminFilter, Database};
use crate::error::{AppError, Result};
use crate::middleware::{AdminRole, CurrentAdmin};
use crate::models::{Admin, CreateAdmin, UpdateAdmin, ADMIN_STATUS_ACTIVE};
use crate::storage::{FileStorage, UploadedImage};

pub struct AdminService {
    db: Database,
}

impl AdminService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: AdminFilter, request: PageRequest) -> Result<Page<Admin>> {
        let listing = self.db.admins().listing();
        paginate(&self.db, &listing, &filter, request).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Admin> {
        self.db
            .admins()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))
    }

    pub async fn create(&self, email: &str, password: &str, name: &str, role: AdminRole) -> Result<Admin> {
        let password_hash = hash_password(password)?;

        self.db
            .admins()
            .create(CreateAdmin {
                email: email.trim().to_lowercase(),
                password_hash,
                name: name.trim().to_string(),
                role,
            })
            .await
    }

    pub async fn update(&self, actor: &CurrentAdmin, id: Uuid, changes: UpdateAdmin) -> Result<Admin> {
        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let existing = self.get(id).await?;
        let demotes = changes.role.is_some_and(|r| r != AdminRole::SuperAdmin);
        let disables = changes
            .status
            .as_deref()
            .is_some_and(|s| s != ADMIN_STATUS_ACTIVE);

        if id == actor.id && (demotes || disables) {
            return Err(AppError::BadRequest(
                "Cannot demote or disable your own account".to_string(),
            ));
        }
        if is_active_super_admin(&existing) && (demotes || disables) {
            self.ensure_another_super_admin().await?;
        }

        self.db
            .admins()
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))
    }

    pub async fn delete(&self, actor: &CurrentAdmin, id: Uuid, storage: &FileStorage) -> Result<()> {
        if id == actor.id {
            return Err(AppError::BadRequest("Cannot delete your own account".to_string()));
        }

        let existing = self.get(id).await?;
        if is_active_super_admin(&existing) {
            self.ensure_another_super_admin().await?;
        }

        if !self.db.admins().delete(id).await? {
            return Err(AppError::NotFound("Admin not found".to_string()));
        }
        if let Some(avatar) = existing.avatar {
            storage.remove(&avatar).await;
        }

        Ok(())
    }

    /// Admins change their own password with the current one; super admins may reset anyone's.
    pub async fn change_password(
        &self,
        actor: &CurrentAdmin,
        id: Uuid,
        current_password: Option<&str>,
        new_password: &str,
    ) -> Result<()> {
        let target = self.get(id).await?;

        if actor.id == id {
            let current = current_password.ok_or_else(|| {
                AppError::BadRequest("current_password is required".to_string())
            })?;
            if !verify_password(current, &target.password_hash) {
                return Err(AppError::BadRequest("Current password is incorrect".to_string()));
            }
        } else {
            actor.require(actor.role.can_manage_admins())?;
        }

        let password_hash = hash_password(new_password)?;
        self.db.admins().update_password(id, &password_hash).await?;

        Ok(())
    }

    pub async fn set_avatar(&self, id: Uuid, storage: &FileStorage, image: &UploadedImage) -> Result<Admin> {
        let existing = self.get(id).await?;
        let url = storage.save_image(image).await?;

        let updated = match self.db.admins().set_avatar(id, &url).await {
            Ok(Some(admin)) => admin,
            Ok(None) => {
                storage.remove(&url).await;
                return Err(AppError::NotFound("Admin not found".to_string()));
            }
            Err(e) => {
                storage.remove(&url).await;
                return Err(e);
            }
        };

        if let Some(old) = existing.avatar {
            storage.remove(&old).await;
        }

        Ok(updated)
    }

    async fn ensure_another_super_admin(&self) -> Result<()> {
        let count = self
            .db
            .admins()
            .count_by_role(AdminRole::SuperAdmin.as_str())
            .await?;
        if count <= 1 {
            return Err(AppError::Conflict(
                "At least one active super admin must remain".to_string(),
            ));
        }
        Ok(())
    }
}

/// Only active super admins count towards the one that must remain
fn is_active_super_admin(admin: &Admin) -> bool {
    admin.is_active() && admin.role() == AdminRole::SuperAdmin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ADMIN_STATUS_DISABLED;

    fn admin(role: &str, status: &str) -> Admin {
        let now = chrono::Utc::now();
        Admin {
            id: Uuid::new_v4(),
            email: "ops@example.com".to_string(),
            password_hash: String::new(),
            name: "Ops".to_string(),
            role: role.to_string(),
            avatar: None,
            status: status.to_string(),
            login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_disabled_super_admin_not_guarded() {
        assert!(is_active_super_admin(&admin("super_admin", ADMIN_STATUS_ACTIVE)));
        assert!(!is_active_super_admin(&admin("super_admin", ADMIN_STATUS_DISABLED)));
        assert!(!is_active_super_admin(&admin("admin", ADMIN_STATUS_ACTIVE)));
    }
}
