//! Redis-backed cache for the dashboard summary.
//!
//! Every failure is logged and reported as a miss; callers always fall back
//! to Postgres.

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

pub const DASHBOARD_SUMMARY_KEY: &str = "dashboard:summary";

#[derive(Clone)]
pub struct DashboardCache {
    redis: redis::Client,
}

impl DashboardCache {
    pub fn new(redis: redis::Client) -> Self {
        Self { redis }
    }

    async fn conn(&self) -> Option<redis::aio::MultiplexedConnection> {
        match self.redis.get_multiplexed_async_connection().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::warn!("Dashboard cache unavailable: {}", e);
                None
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self) -> Option<T> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = match conn.get(DASHBOARD_SUMMARY_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Dashboard cache read failed: {}", e);
                return None;
            }
        };

        raw.and_then(|json| match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding malformed dashboard cache entry: {}", e);
                None
            }
        })
    }

    pub async fn put<T: Serialize>(&self, value: &T, ttl_secs: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Dashboard summary not cacheable: {}", e);
                return;
            }
        };

        let Some(mut conn) = self.conn().await else {
            return;
        };
        if let Err(e) = conn
            .set_ex::<_, _, ()>(DASHBOARD_SUMMARY_KEY, json, ttl_secs)
            .await
        {
            tracing::warn!("Dashboard cache write failed: {}", e);
        }
    }

    pub async fn invalidate(&self) {
        let Some(mut conn) = self.conn().await else {
            return;
        };
        if let Err(e) = conn.del::<_, ()>(DASHBOARD_SUMMARY_KEY).await {
            tracing::warn!("Dashboard cache invalidation failed: {}", e);
        }
    }
}
