use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use pagination::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::CategoryFilter;
use crate::error::Result;
use crate::middleware::CurrentAdmin;
use crate::models::{AuditAction, Category, ResourceType, UpdateCategory};
use crate::services::{AuditService, CategoryService, NewCategory};
use crate::utils::{lenient_int, non_empty, parse_id, RequestMeta};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/:id/cover", post(upload_cover))
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name,
            slug: category.slug,
            description: category.description,
            cover_image: category.cover_image,
            sort_order: category.sort_order,
            is_active: category.is_active,
            created_at: category.created_at.to_rfc3339(),
            updated_at: category.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<Page<CategoryResponse>>> {
    let filter = CategoryFilter {
        is_active: query.is_active,
        search: non_empty(query.search),
    };

    let page = CategoryService::new(state.db.clone())
        .list(filter, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(page.map(CategoryResponse::from)))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>> {
    let category_id = parse_id(&id, "category")?;
    let category = CategoryService::new(state.db.clone()).get(category_id).await?;
    Ok(Json(category.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

async fn create_category(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<CategoryResponse>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    payload.validate()?;

    let category = CategoryService::new(state.db.clone())
        .create(NewCategory {
            name: payload.name,
            slug: payload.slug,
            description: payload.description,
            sort_order: payload.sort_order,
            is_active: payload.is_active,
        })
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::CreateCategory,
            ResourceType::Category,
            Some(category.id),
            Some(serde_json::json!({ "name": category.name, "slug": category.slug })),
        )
        .await;

    Ok(Json(category.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

async fn update_category(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    payload.validate()?;
    let category_id = parse_id(&id, "category")?;

    let category = CategoryService::new(state.db.clone())
        .update(
            category_id,
            UpdateCategory {
                name: payload.name,
                slug: payload.slug,
                description: payload.description,
                sort_order: payload.sort_order,
                is_active: payload.is_active,
            },
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::UpdateCategory,
            ResourceType::Category,
            Some(category.id),
            Some(serde_json::json!({
                "name": category.name,
                "slug": category.slug,
                "is_active": category.is_active,
            })),
        )
        .await;

    Ok(Json(category.into()))
}

async fn delete_category(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    let category_id = parse_id(&id, "category")?;

    CategoryService::new(state.db.clone())
        .delete(category_id, &state.storage)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::DeleteCategory,
            ResourceType::Category,
            Some(category_id),
            None,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Category deleted" })))
}

async fn upload_cover(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<CategoryResponse>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    let category_id = parse_id(&id, "category")?;

    let image = state.storage.read_image(multipart, "file").await?;
    let category = CategoryService::new(state.db.clone())
        .set_cover(category_id, &state.storage, &image)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::UploadFile,
            ResourceType::Category,
            Some(category_id),
            Some(serde_json::json!({ "cover_image": category.cover_image })),
        )
        .await;

    Ok(Json(category.into()))
}
