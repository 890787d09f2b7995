use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::listing::{ListFilter, PgListing};
use crate::error::{AppError, Result};
use crate::models::{StreamStat, StreamStatSummary, StreamStatValues};

const MISSING_REFERENCE: &str = "Streamer or category no longer exists";

const STREAM_STAT_COLUMNS: &str = "id, streamer_id, category_id, title, started_at, ended_at, \
     peak_viewers, total_viewers, avg_watch_seconds, likes, gifts_value, created_at, updated_at";

/// Narrows stream stats by owner, category and a `started_at` window.
///
/// `from` is inclusive, `to` exclusive.
#[derive(Debug, Default, Clone)]
pub struct StreamStatFilter {
    pub streamer_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ListFilter for StreamStatFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(streamer_id) = self.streamer_id {
            qb.push(" AND streamer_id = ");
            qb.push_bind(streamer_id);
        }
        if let Some(category_id) = self.category_id {
            qb.push(" AND category_id = ");
            qb.push_bind(category_id);
        }
        if let Some(from) = self.from {
            qb.push(" AND started_at >= ");
            qb.push_bind(from);
        }
        if let Some(to) = self.to {
            qb.push(" AND started_at < ");
            qb.push_bind(to);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryGrouping {
    Streamer,
    Category,
}

impl SummaryGrouping {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "streamer" => Some(Self::Streamer),
            "category" => Some(Self::Category),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Streamer => "streamer_id",
            Self::Category => "category_id",
        }
    }
}

pub struct StreamStatRepository {
    pool: PgPool,
}

impl StreamStatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn listing(&self) -> PgListing<StreamStat, StreamStatFilter> {
        PgListing::new(
            self.pool.clone(),
            "stream_stats",
            STREAM_STAT_COLUMNS,
            "started_at DESC, id",
        )
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StreamStat>> {
        let stat = sqlx::query_as::<_, StreamStat>(&format!(
            "SELECT {} FROM stream_stats WHERE id = $1",
            STREAM_STAT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stat)
    }

    pub async fn create(&self, values: &StreamStatValues) -> Result<StreamStat> {
        let stat = sqlx::query_as::<_, StreamStat>(&format!(
            r#"
            INSERT INTO stream_stats (
                streamer_id, category_id, title, started_at, ended_at,
                peak_viewers, total_viewers, avg_watch_seconds, likes, gifts_value
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            STREAM_STAT_COLUMNS
        ))
        .bind(values.streamer_id)
        .bind(values.category_id)
        .bind(&values.title)
        .bind(values.started_at)
        .bind(values.ended_at)
        .bind(values.peak_viewers)
        .bind(values.total_viewers)
        .bind(values.avg_watch_seconds)
        .bind(values.likes)
        .bind(values.gifts_value)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::bad_request_on_foreign_key(e, MISSING_REFERENCE))?;

        Ok(stat)
    }

    /// Overwrites every mutable column with the already merged values.
    pub async fn replace(&self, id: Uuid, values: &StreamStatValues) -> Result<Option<StreamStat>> {
        let stat = sqlx::query_as::<_, StreamStat>(&format!(
            r#"
            UPDATE stream_stats SET
                category_id = $2,
                title = $3,
                started_at = $4,
                ended_at = $5,
                peak_viewers = $6,
                total_viewers = $7,
                avg_watch_seconds = $8,
                likes = $9,
                gifts_value = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            STREAM_STAT_COLUMNS
        ))
        .bind(id)
        .bind(values.category_id)
        .bind(&values.title)
        .bind(values.started_at)
        .bind(values.ended_at)
        .bind(values.peak_viewers)
        .bind(values.total_viewers)
        .bind(values.avg_watch_seconds)
        .bind(values.likes)
        .bind(values.gifts_value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::bad_request_on_foreign_key(e, MISSING_REFERENCE))?;

        Ok(stat)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stream_stats WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn summary(
        &self,
        grouping: SummaryGrouping,
        filter: &StreamStatFilter,
    ) -> Result<Vec<StreamStatSummary>> {
        let mut qb = summary_query(grouping, filter);
        let rows = qb
            .build_query_as::<StreamStatSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

fn summary_query(grouping: SummaryGrouping, filter: &StreamStatFilter) -> QueryBuilder<'static, Postgres> {
    let column = grouping.column();
    let mut qb = QueryBuilder::new(format!(
        "SELECT {column} AS group_id, \
         COUNT(*) AS streams, \
         COALESCE(SUM(total_viewers), 0)::BIGINT AS total_viewers, \
         COALESCE(MAX(peak_viewers), 0)::BIGINT AS peak_viewers, \
         COALESCE(SUM(avg_watch_seconds * total_viewers), 0)::BIGINT AS watch_seconds, \
         COALESCE(SUM(likes), 0)::BIGINT AS likes, \
         COALESCE(SUM(gifts_value), 0)::BIGINT AS gifts_value \
         FROM stream_stats WHERE 1=1"
    ));
    filter.push_conditions(&mut qb);
    qb.push(format!(" GROUP BY {column} ORDER BY total_viewers DESC, group_id"));
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_window() {
        let filter = StreamStatFilter {
            streamer_id: Some(Uuid::new_v4()),
            from: Some(Utc::now()),
            to: Some(Utc::now()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM stream_stats WHERE 1=1");
        filter.push_conditions(&mut qb);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM stream_stats WHERE 1=1 AND streamer_id = $1 \
             AND started_at >= $2 AND started_at < $3"
        );
    }

    #[test]
    fn test_summary_groups_by_column() {
        let filter = StreamStatFilter {
            category_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let qb = summary_query(SummaryGrouping::Streamer, &filter);
        let sql = qb.sql();

        assert!(sql.starts_with("SELECT streamer_id AS group_id"));
        assert!(sql.contains("WHERE 1=1 AND category_id = $1"));
        assert!(sql.ends_with("GROUP BY streamer_id ORDER BY total_viewers DESC, group_id"));
    }

    #[test]
    fn test_grouping_parse() {
        assert_eq!(SummaryGrouping::parse("streamer"), Some(SummaryGrouping::Streamer));
        assert_eq!(SummaryGrouping::parse("category"), Some(SummaryGrouping::Category));
        assert_eq!(SummaryGrouping::parse("day"), None);
    }
}
