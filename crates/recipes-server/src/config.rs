use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use recipes_auth::SessionConfig;
use recipes_db_postgres::PostgresConfig;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Shared listing cache. Disabled means a process-local cache.
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub auth: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Initial admin user and seed data
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }

        if self.storage.backend == StorageBackend::Postgres {
            let pg = &self.storage.postgres;
            if pg.url.is_none() && pg.host.is_empty() {
                return Err("storage.postgres requires either 'url' or 'host' to be set".into());
            }
            if pg.url.is_none() && pg.database.is_empty() {
                return Err("storage.postgres.database must not be empty".into());
            }
            if pg.pool_size == 0 {
                return Err("storage.postgres.pool_size must be > 0".into());
            }
            pg.connection_url()?;
        }

        if self.redis.enabled {
            if self.redis.url.trim().is_empty() {
                return Err("redis.url must not be empty when redis.enabled=true".into());
            }
            if self.redis.pool_size == 0 {
                return Err("redis.pool_size must be > 0".into());
            }
        }

        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;

        if let Some(admin) = &self.bootstrap.admin_user
            && (admin.username.trim().is_empty() || admin.password.is_empty())
        {
            return Err("bootstrap.admin_user requires a username and a password".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.server.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Which store holds recipes, users and sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Postgres => f.write_str("postgres"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub postgres: PostgresStorageConfig,
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresStorageConfig {
    /// Full connection URL. Takes precedence over the individual options.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_postgres_host")]
    pub host: String,

    #[serde(default = "default_postgres_port")]
    pub port: u16,

    #[serde(default = "default_postgres_user")]
    pub user: String,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_postgres_database")]
    pub database: String,

    #[serde(default = "default_postgres_pool_size")]
    pub pool_size: u32,

    #[serde(default = "default_postgres_connect_timeout")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,

    /// Apply the embedded migrations on startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_postgres_host() -> String {
    "localhost".into()
}
fn default_postgres_port() -> u16 {
    5432
}
fn default_postgres_user() -> String {
    "postgres".into()
}
fn default_postgres_database() -> String {
    "recipes".into()
}
fn default_postgres_pool_size() -> u32 {
    10
}
fn default_postgres_connect_timeout() -> u64 {
    5000
}
fn default_true() -> bool {
    true
}

impl Default for PostgresStorageConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_postgres_host(),
            port: default_postgres_port(),
            user: default_postgres_user(),
            password: None,
            database: default_postgres_database(),
            pool_size: default_postgres_pool_size(),
            connect_timeout_ms: default_postgres_connect_timeout(),
            idle_timeout_ms: None,
            run_migrations: true,
        }
    }
}

impl PostgresStorageConfig {
    /// `url` if set, otherwise built from host, port, user and database.
    /// User, password and database are percent-encoded.
    pub fn connection_url(&self) -> Result<String, String> {
        if let Some(ref url) = self.url {
            return Ok(url.clone());
        }

        let invalid = || format!("storage.postgres.host '{}' is not a valid host", self.host);
        let mut url = Url::parse(&format!("postgres://{}:{}", self.host, self.port))
            .map_err(|_| invalid())?;
        url.set_username(&self.user).map_err(|()| invalid())?;
        url.set_password(self.password.as_deref())
            .map_err(|()| invalid())?;
        url.set_path("/");
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .clear()
            .push(&self.database);
        Ok(url.into())
    }

    pub fn to_postgres_config(&self) -> Result<PostgresConfig, String> {
        Ok(PostgresConfig {
            url: self.connection_url()?,
            pool_size: self.pool_size,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            idle_timeout: self.idle_timeout_ms.map(Duration::from_millis),
            run_migrations: self.run_migrations,
        })
    }
}

/// Redis connection settings for the shared listing cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,
    /// Applied to pool wait, connection create and recycle.
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".into()
}
fn default_redis_pool_size() -> usize {
    10
}
fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Created (or has its password reset) on every startup.
    #[serde(default)]
    pub admin_user: Option<AdminUserConfig>,

    /// JSON array of recipe payloads imported when the store is empty.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AdminUserConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminUserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUserConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    /// Default configuration file, read when no path is given.
    pub const DEFAULT_CONFIG_FILE: &str = "recipes.toml";

    /// Loads the optional TOML file, overlays `RECIPES__*` environment
    /// variables and validates the result.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let file = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        let mut builder = Config::builder();
        if file.exists() {
            builder = builder.add_source(File::from(file));
        } else if path.is_some() {
            tracing::warn!(path = %file.display(), "configuration file not found, using defaults");
        }
        // e.g. RECIPES__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("RECIPES")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<AppConfig, String> {
        let p = path.as_ref().to_string_lossy().to_string();
        load_config(Some(&p))
    }
}
