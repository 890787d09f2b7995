mod admin_repo;
mod audit_repo;
mod cache;
mod category_repo;
mod dashboard_repo;
mod listing;
mod stream_stat_repo;
mod user_repo;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

pub use admin_repo::{AdminFilter, AdminRepository};
pub use audit_repo::{AuditLogFilter, AuditRepository};
pub use cache::DashboardCache;
pub use category_repo::{CategoryFilter, CategoryRepository};
pub use dashboard_repo::{DashboardRepository, DashboardSummary};
pub use listing::{escape_like, ListFilter, PgListing};
pub use stream_stat_repo::{StreamStatFilter, StreamStatRepository, SummaryGrouping};
pub use user_repo::{UserFilter, UserRepository};

#[derive(Clone)]
pub struct Database {
    pub pg: PgPool,
    pub redis: redis::Client,
    /// Deadline applied to paginated list queries
    pub query_timeout: Duration,
}

impl Database {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        // PostgreSQL connection
        let pg = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");

        // Redis connection
        let redis = redis::Client::open(config.redis.url.as_str())?;

        tracing::info!("Redis client created");

        Ok(Self {
            pg,
            redis,
            query_timeout: config.database.query_timeout(),
        })
    }

    /// Build handles without opening any connection until first use.
    pub fn connect_lazy(config: &Config) -> anyhow::Result<Self> {
        let pg = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect_lazy(&config.database.url)?;
        let redis = redis::Client::open(config.redis.url.as_str())?;

        Ok(Self {
            pg,
            redis,
            query_timeout: config.database.query_timeout(),
        })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pg).await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }

    pub async fn get_redis_conn(&self) -> anyhow::Result<redis::aio::MultiplexedConnection> {
        Ok(self.redis.get_multiplexed_async_connection().await?)
    }

    pub fn admins(&self) -> AdminRepository {
        AdminRepository::new(self.pg.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pg.clone())
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pg.clone())
    }

    pub fn stream_stats(&self) -> StreamStatRepository {
        StreamStatRepository::new(self.pg.clone())
    }

    pub fn audit_logs(&self) -> AuditRepository {
        AuditRepository::new(self.pg.clone())
    }

    pub fn dashboard(&self) -> DashboardRepository {
        DashboardRepository::new(self.pg.clone())
    }

    pub fn dashboard_cache(&self) -> DashboardCache {
        DashboardCache::new(self.redis.clone())
    }
}
