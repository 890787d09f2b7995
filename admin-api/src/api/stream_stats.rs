use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::{StreamStatFilter, SummaryGrouping};
use crate::error::{AppError, Result};
use crate::middleware::CurrentAdmin;
use crate::models::{
    AuditAction, InvalidStreamStat, ResourceType, StreamStat, StreamStatSummary, StreamStatValues,
    UpdateStreamStat,
};
use crate::services::{AuditService, StreamStatService};
use crate::utils::{double_option, lenient_int, parse_id, RequestMeta};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stream_stats).post(create_stream_stat))
        .route("/summary", get(summary))
        .route(
            "/:id",
            get(get_stream_stat)
                .put(update_stream_stat)
                .delete(delete_stream_stat),
        )
}

#[derive(Debug, Serialize)]
pub struct StreamStatResponse {
    pub id: String,
    pub streamer_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub duration_seconds: Option<i64>,
    pub is_live: bool,
    pub peak_viewers: i64,
    pub total_viewers: i64,
    pub avg_watch_seconds: i64,
    pub likes: i64,
    pub gifts_value: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<StreamStat> for StreamStatResponse {
    type Error = InvalidStreamStat;

    fn try_from(stat: StreamStat) -> std::result::Result<Self, Self::Error> {
        let duration_seconds = stat.duration_seconds()?;

        Ok(Self {
            id: stat.id.to_string(),
            streamer_id: stat.streamer_id.to_string(),
            category_id: stat.category_id.map(|id| id.to_string()),
            title: stat.title,
            started_at: stat.started_at.to_rfc3339(),
            ended_at: stat.ended_at.map(|t| t.to_rfc3339()),
            duration_seconds,
            is_live: stat.ended_at.is_none(),
            peak_viewers: stat.peak_viewers,
            total_viewers: stat.total_viewers,
            avg_watch_seconds: stat.avg_watch_seconds,
            likes: stat.likes,
            gifts_value: stat.gifts_value,
            created_at: stat.created_at.to_rfc3339(),
            updated_at: stat.updated_at.to_rfc3339(),
        })
    }
}

fn respond(stat: StreamStat) -> Result<Json<StreamStatResponse>> {
    StreamStatResponse::try_from(stat)
        .map(Json)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

#[derive(Debug, Deserialize)]
pub struct ListStreamStatsQuery {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
    pub streamer_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

async fn list_stream_stats(
    State(state): State<AppState>,
    Query(query): Query<ListStreamStatsQuery>,
) -> Result<Json<Page<StreamStatResponse>>> {
    let filter = StreamStatFilter {
        streamer_id: query.streamer_id,
        category_id: query.category_id,
        from: query.from,
        to: query.to,
    };

    let page = StreamStatService::new(state.db.clone())
        .list(filter, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(page.try_map(StreamStatResponse::try_from)?))
}

async fn get_stream_stat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StreamStatResponse>> {
    let stat_id = parse_id(&id, "stream stat")?;
    let stat = StreamStatService::new(state.db.clone()).get(stat_id).await?;
    respond(stat)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStreamStatRequest {
    pub streamer_id: Uuid,
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub peak_viewers: i64,
    #[serde(default)]
    pub total_viewers: i64,
    #[serde(default)]
    pub avg_watch_seconds: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub gifts_value: i64,
}

async fn create_stream_stat(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Json(payload): Json<CreateStreamStatRequest>,
) -> Result<Json<StreamStatResponse>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    payload.validate()?;

    let stat = StreamStatService::new(state.db.clone())
        .create(StreamStatValues {
            streamer_id: payload.streamer_id,
            category_id: payload.category_id,
            title: payload.title.trim().to_string(),
            started_at: payload.started_at,
            ended_at: payload.ended_at,
            peak_viewers: payload.peak_viewers,
            total_viewers: payload.total_viewers,
            avg_watch_seconds: payload.avg_watch_seconds,
            likes: payload.likes,
            gifts_value: payload.gifts_value,
        })
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::CreateStreamStat,
            ResourceType::StreamStat,
            Some(stat.id),
            Some(serde_json::json!({
                "streamer_id": stat.streamer_id,
                "title": stat.title,
            })),
        )
        .await;

    respond(stat)
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStreamStatRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ended_at: Option<Option<DateTime<Utc>>>,
    pub peak_viewers: Option<i64>,
    pub total_viewers: Option<i64>,
    pub avg_watch_seconds: Option<i64>,
    pub likes: Option<i64>,
    pub gifts_value: Option<i64>,
}

async fn update_stream_stat(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStreamStatRequest>,
) -> Result<Json<StreamStatResponse>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    payload.validate()?;
    let stat_id = parse_id(&id, "stream stat")?;

    let stat = StreamStatService::new(state.db.clone())
        .update(
            stat_id,
            UpdateStreamStat {
                category_id: payload.category_id,
                title: payload.title.map(|t| t.trim().to_string()),
                started_at: payload.started_at,
                ended_at: payload.ended_at,
                peak_viewers: payload.peak_viewers,
                total_viewers: payload.total_viewers,
                avg_watch_seconds: payload.avg_watch_seconds,
                likes: payload.likes,
                gifts_value: payload.gifts_value,
            },
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::UpdateStreamStat,
            ResourceType::StreamStat,
            Some(stat.id),
            None,
        )
        .await;

    respond(stat)
}

async fn delete_stream_stat(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    current_admin.require(current_admin.role.can_edit_catalog())?;
    let stat_id = parse_id(&id, "stream stat")?;

    StreamStatService::new(state.db.clone()).delete(stat_id).await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &meta,
            AuditAction::DeleteStreamStat,
            ResourceType::StreamStat,
            Some(stat_id),
            None,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Stream stat deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub group_by: Option<String>,
    pub streamer_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub group_by: &'static str,
    pub groups: Vec<StreamStatSummary>,
}

async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>> {
    let group_by = query.group_by.as_deref().unwrap_or("streamer");
    let grouping = SummaryGrouping::parse(group_by).ok_or_else(|| {
        AppError::BadRequest("group_by must be 'streamer' or 'category'".to_string())
    })?;

    let filter = StreamStatFilter {
        streamer_id: query.streamer_id,
        category_id: query.category_id,
        from: query.from,
        to: query.to,
    };
    let groups = StreamStatService::new(state.db.clone())
        .summary(grouping, filter)
        .await?;

    Ok(Json(SummaryResponse {
        group_by: match grouping {
            SummaryGrouping::Streamer => "streamer",
            SummaryGrouping::Category => "category",
        },
        groups,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn stat(ended_after: Option<Duration>) -> StreamStat {
        let started_at = Utc::now() - Duration::hours(3);
        StreamStat {
            id: Uuid::new_v4(),
            streamer_id: Uuid::new_v4(),
            category_id: None,
            title: "Late night chill".to_string(),
            started_at,
            ended_at: ended_after.map(|d| started_at + d),
            peak_viewers: 10,
            total_viewers: 40,
            avg_watch_seconds: 300,
            likes: 2,
            gifts_value: 0,
            created_at: started_at,
            updated_at: started_at,
        }
    }

    #[test]
    fn test_response_includes_duration() {
        let response = StreamStatResponse::try_from(stat(Some(Duration::minutes(45)))).unwrap();
        assert_eq!(response.duration_seconds, Some(2700));
        assert!(!response.is_live);
    }

    #[test]
    fn test_live_stream_has_no_duration() {
        let response = StreamStatResponse::try_from(stat(None)).unwrap();
        assert_eq!(response.duration_seconds, None);
        assert!(response.is_live);
    }

    #[test]
    fn test_page_mapping_reports_broken_row() {
        use pagination::{PaginationError, PaginationMetadata};

        let rows = vec![
            stat(Some(Duration::minutes(5))),
            stat(Some(Duration::minutes(-5))),
        ];
        let page = Page::new(PaginationMetadata::compute(2, 1, 50), rows);

        let err = page.try_map(StreamStatResponse::try_from).unwrap_err();
        assert!(matches!(err, PaginationError::Mapping { index: 1, .. }));
    }
}
