use pagination::{Page, PageRequest};
use uuid::Uuid;

use super::paginate;
use crate::db::{Database, StreamStatFilter, SummaryGrouping};
use crate::error::{AppError, Result};
use crate::models::{StreamStat, StreamStatSummary, StreamStatValues, UpdateStreamStat};

pub struct StreamStatService {
    db: Database,
}

impl StreamStatService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: StreamStatFilter, request: PageRequest) -> Result<Page<StreamStat>> {
        check_window(&filter)?;
        let listing = self.db.stream_stats().listing();
        paginate(&self.db, &listing, &filter, request).await
    }

    pub async fn get(&self, id: Uuid) -> Result<StreamStat> {
        self.db
            .stream_stats()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stream stat not found".to_string()))
    }

    pub async fn create(&self, values: StreamStatValues) -> Result<StreamStat> {
        values
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if !self.db.users().exists(values.streamer_id).await? {
            return Err(AppError::BadRequest("Unknown streamer_id".to_string()));
        }
        self.check_category(values.category_id).await?;

        let stat = self.db.stream_stats().create(&values).await?;

        self.db.dashboard_cache().invalidate().await;
        Ok(stat)
    }

    pub async fn update(&self, id: Uuid, changes: UpdateStreamStat) -> Result<StreamStat> {
        let existing = self.get(id).await?;
        let category_changed = changes.category_id.is_some();

        let merged = changes.apply_to(StreamStatValues::from(existing));
        merged
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if category_changed {
            self.check_category(merged.category_id).await?;
        }

        let stat = self
            .db
            .stream_stats()
            .replace(id, &merged)
            .await?
            .ok_or_else(|| AppError::NotFound("Stream stat not found".to_string()))?;

        self.db.dashboard_cache().invalidate().await;
        Ok(stat)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.db.stream_stats().delete(id).await? {
            return Err(AppError::NotFound("Stream stat not found".to_string()));
        }

        self.db.dashboard_cache().invalidate().await;
        Ok(())
    }

    pub async fn summary(
        &self,
        grouping: SummaryGrouping,
        filter: StreamStatFilter,
    ) -> Result<Vec<StreamStatSummary>> {
        check_window(&filter)?;

        tokio::time::timeout(
            self.db.query_timeout,
            self.db.stream_stats().summary(grouping, &filter),
        )
        .await
        .map_err(|_| AppError::Timeout)?
    }

    async fn check_category(&self, category_id: Option<Uuid>) -> Result<()> {
        if let Some(category_id) = category_id {
            if !self.db.categories().exists(category_id).await? {
                return Err(AppError::BadRequest("Unknown category_id".to_string()));
            }
        }
        Ok(())
    }
}

fn check_window(filter: &StreamStatFilter) -> Result<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from >= to {
            return Err(AppError::BadRequest("'from' must be before 'to'".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_check_window() {
        let now = Utc::now();
        let open = StreamStatFilter {
            from: Some(now),
            ..Default::default()
        };
        assert!(check_window(&open).is_ok());

        let ordered = StreamStatFilter {
            from: Some(now - Duration::days(1)),
            to: Some(now),
            ..Default::default()
        };
        assert!(check_window(&ordered).is_ok());

        let reversed = StreamStatFilter {
            from: Some(now),
            to: Some(now - Duration::days(1)),
            ..Default::default()
        };
        assert!(matches!(check_window(&reversed), Err(AppError::BadRequest(_))));
    }
}
