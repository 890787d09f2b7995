// Dashboard service - platform counters, cached in Redis
use chrono::{DateTime, TimeZone, Utc};

use crate::db::{Database, DashboardSummary};
use crate::error::{AppError, Result};

pub struct DashboardService {
    db: Database,
    cache_ttl_secs: u64,
}

impl DashboardService {
    pub fn new(db: Database, cache_ttl_secs: u64) -> Self {
        Self { db, cache_ttl_secs }
    }

    pub async fn summary(&self) -> Result<DashboardSummary> {
        let cache = self.db.dashboard_cache();
        if let Some(cached) = cache.get::<DashboardSummary>().await {
            tracing::debug!("Dashboard summary served from cache");
            return Ok(cached);
        }

        let summary = tokio::time::timeout(
            self.db.query_timeout,
            self.db.dashboard().summary(start_of_day(Utc::now())),
        )
        .await
        .map_err(|_| AppError::Timeout)??;

        cache.put(&summary, self.cache_ttl_secs).await;
        Ok(summary)
    }
}

/// Midnight UTC of the given instant's day
fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_day() {
        let now = DateTime::parse_from_rfc3339("2024-05-17T18:42:07Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(start_of_day(now).to_rfc3339(), "2024-05-17T00:00:00+00:00");
    }
}
