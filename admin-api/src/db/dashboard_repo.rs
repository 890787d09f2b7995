use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::Result;

/// Platform-wide counters shown on the dashboard landing page
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_users: i64,
    pub total_streamers: i64,
    pub banned_users: i64,
    pub active_categories: i64,
    pub streams_today: i64,
    pub peak_viewers_today: i64,
    pub total_watch_hours: f64,
}

pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `day_start` is the lower bound for the "today" counters.
    pub async fn summary(&self, day_start: DateTime<Utc>) -> Result<DashboardSummary> {
        let summary = sqlx::query_as::<_, DashboardSummary>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM users WHERE is_streamer) AS total_streamers,
                (SELECT COUNT(*) FROM users WHERE status = 'banned') AS banned_users,
                (SELECT COUNT(*) FROM categories WHERE is_active) AS active_categories,
                (SELECT COUNT(*) FROM stream_stats WHERE started_at >= $1) AS streams_today,
                (SELECT COALESCE(MAX(peak_viewers), 0)::BIGINT FROM stream_stats WHERE started_at >= $1)
                    AS peak_viewers_today,
                (SELECT COALESCE(SUM(avg_watch_seconds * total_viewers), 0)::FLOAT8 / 3600.0 FROM stream_stats)
                    AS total_watch_hours
            "#,
        )
        .bind(day_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}
