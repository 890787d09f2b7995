use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::listing::{contains_pattern, ListFilter, PgListing};
use crate::error::{AppError, Result};
use crate::models::{Category, CreateCategory, UpdateCategory};

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, cover_image, sort_order, is_active, created_at, updated_at";

#[derive(Debug, Default)]
pub struct CategoryFilter {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl ListFilter for CategoryFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(is_active) = self.is_active {
            qb.push(" AND is_active = ");
            qb.push_bind(is_active);
        }
        if let Some(pattern) = self.search.as_deref().and_then(contains_pattern) {
            qb.push(" AND (name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR slug ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
    }
}

pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn listing(&self) -> PgListing<Category, CategoryFilter> {
        PgListing::new(
            self.pool.clone(),
            "categories",
            CATEGORY_COLUMNS,
            "sort_order ASC, name ASC, id",
        )
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn create(&self, input: CreateCategory) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (name, slug, description, sort_order, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.sort_order)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Slug is already in use"))
    }

    pub async fn update(&self, id: Uuid, changes: UpdateCategory) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                sort_order = COALESCE($5, sort_order),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.slug)
        .bind(changes.description)
        .bind(changes.sort_order)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Slug is already in use"))
    }

    pub async fn set_cover(&self, id: Uuid, cover_image: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories SET cover_image = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .bind(cover_image)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Fails with a conflict while stream stats still reference the category.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::conflict_on_foreign_key(e, "Category is still used by stream stats")
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_conditions() {
        let filter = CategoryFilter {
            is_active: Some(true),
            search: Some("music".to_string()),
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM categories WHERE 1=1");
        filter.push_conditions(&mut qb);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM categories WHERE 1=1 AND is_active = $1 \
             AND (name ILIKE $2 OR slug ILIKE $3)"
        );
    }
}
