use axum::{extract::State, routing::get, Json, Router};

use crate::db::DashboardSummary;
use crate::error::Result;
use crate::services::DashboardService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/summary", get(get_summary))
}

async fn get_summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>> {
    let summary = DashboardService::new(state.db.clone(), state.config.redis.dashboard_cache_ttl_secs)
        .summary()
        .await?;

    Ok(Json(summary))
}
