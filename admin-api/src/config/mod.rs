use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Emit JSON log lines instead of the human readable format
    #[serde(default)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Upper bound for a count + page fetch pair
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_dashboard_cache_ttl_secs")]
    pub dashboard_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
    #[serde(default = "default_refresh_expiry_days")]
    pub refresh_expiry_days: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: i32,
    #[serde(default = "default_lockout_duration_minutes")]
    pub lockout_duration_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// URL prefix the upload directory is served under
    #[serde(default = "default_public_path")]
    pub public_path: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_query_timeout_secs() -> u64 {
    10
}

fn default_dashboard_cache_ttl_secs() -> u64 {
    60
}

fn default_expiry_hours() -> u64 {
    24
}

fn default_refresh_expiry_days() -> u64 {
    30
}

fn default_max_login_attempts() -> i32 {
    5
}

fn default_lockout_duration_minutes() -> i64 {
    15
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_public_path() -> String {
    "/uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.log_json", false)?
            .set_default("database.url", "postgres://localhost/live_admin")?
            .set_default("database.max_connections", 10)?
            .set_default("database.query_timeout_secs", 10)?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("redis.dashboard_cache_ttl_secs", 60)?
            .set_default("jwt.secret", DEV_JWT_SECRET)?
            .set_default("jwt.expiry_hours", 24)?
            .set_default("jwt.refresh_expiry_days", 30)?
            .set_default("security.max_login_attempts", 5)?
            .set_default("security.lockout_duration_minutes", 15)?
            .set_default("storage.upload_dir", "./uploads")?
            .set_default("storage.public_path", "/uploads")?
            .set_default("storage.max_upload_bytes", 5 * 1024 * 1024)?
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;

        if config.jwt.secret == DEV_JWT_SECRET {
            tracing::warn!("JWT__SECRET not set, using the development secret");
        }

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.len() < 32 {
            anyhow::bail!("jwt.secret must be at least 32 characters");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be positive");
        }
        if self.database.query_timeout_secs == 0 {
            anyhow::bail!("database.query_timeout_secs must be positive");
        }
        if self.security.max_login_attempts < 1 {
            anyhow::bail!("security.max_login_attempts must be at least 1");
        }
        if !self.storage.public_path.starts_with('/') {
            anyhow::bail!("storage.public_path must start with '/'");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                log_json: false,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                max_connections: 2,
                query_timeout_secs: 5,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                dashboard_cache_ttl_secs: 60,
            },
            jwt: JwtConfig {
                secret: "a-test-secret-that-is-long-enough-to-pass".to_string(),
                expiry_hours: 1,
                refresh_expiry_days: 7,
            },
            security: SecurityConfig {
                max_login_attempts: 3,
                lockout_duration_minutes: 10,
            },
            storage: StorageConfig {
                upload_dir: default_upload_dir(),
                public_path: default_public_path(),
                max_upload_bytes: default_max_upload_bytes(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = sample();
        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_public_path_must_be_absolute() {
        let mut config = sample();
        config.storage.public_path = "uploads".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_query_timeout() {
        assert_eq!(sample().database.query_timeout(), Duration::from_secs(5));
    }
}
