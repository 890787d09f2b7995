use pagination::{Page, PageRequest};
use uuid::Uuid;

use super::paginate;
use crate::db::{CategoryFilter, Database};
use crate::error::{AppError, Result};
use crate::models::{slugify, Category, CreateCategory, UpdateCategory};
use crate::storage::{FileStorage, UploadedImage};

#[derive(Debug)]
pub struct NewCategory {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

pub struct CategoryService {
    db: Database,
}

impl CategoryService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: CategoryFilter, request: PageRequest) -> Result<Page<Category>> {
        let listing = self.db.categories().listing();
        paginate(&self.db, &listing, &filter, request).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Category> {
        self.db
            .categories()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    pub async fn create(&self, input: NewCategory) -> Result<Category> {
        let name = input.name.trim().to_string();
        let slug = resolve_slug(input.slug.as_deref().unwrap_or(&name))?;

        let category = self
            .db
            .categories()
            .create(CreateCategory {
                name,
                slug,
                description: input.description,
                sort_order: input.sort_order,
                is_active: input.is_active,
            })
            .await?;

        self.db.dashboard_cache().invalidate().await;
        Ok(category)
    }

    pub async fn update(&self, id: Uuid, mut changes: UpdateCategory) -> Result<Category> {
        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        changes.name = changes.name.map(|n| n.trim().to_string());
        changes.slug = changes.slug.as_deref().map(resolve_slug).transpose()?;

        let category = self
            .db
            .categories()
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        self.db.dashboard_cache().invalidate().await;
        Ok(category)
    }

    pub async fn delete(&self, id: Uuid, storage: &FileStorage) -> Result<()> {
        let existing = self.get(id).await?;
        if !self.db.categories().delete(id).await? {
            return Err(AppError::NotFound("Category not found".to_string()));
        }
        if let Some(cover) = existing.cover_image {
            storage.remove(&cover).await;
        }

        self.db.dashboard_cache().invalidate().await;
        Ok(())
    }

    pub async fn set_cover(&self, id: Uuid, storage: &FileStorage, image: &UploadedImage) -> Result<Category> {
        let existing = self.get(id).await?;
        let url = storage.save_image(image).await?;

        let updated = match self.db.categories().set_cover(id, &url).await {
            Ok(Some(category)) => category,
            Ok(None) => {
                storage.remove(&url).await;
                return Err(AppError::NotFound("Category not found".to_string()));
            }
            Err(e) => {
                storage.remove(&url).await;
                return Err(e);
            }
        };

        if let Some(old) = existing.cover_image {
            storage.remove(&old).await;
        }

        Ok(updated)
    }
}

fn resolve_slug(source: &str) -> Result<String> {
    let slug = slugify(source);
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "Slug must contain at least one ASCII letter or digit".to_string(),
        ));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_slug() {
        assert_eq!(resolve_slug("Just Chatting").unwrap(), "just-chatting");
        assert!(matches!(resolve_slug("!!!"), Err(AppError::BadRequest(_))));
    }
}
