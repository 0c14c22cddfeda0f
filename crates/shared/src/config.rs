//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Share link configuration.
    #[serde(default)]
    pub sharing: SharingConfig,
    /// Attachment processor configuration.
    #[serde(default)]
    pub processor: ProcessorConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Run pending migrations when the server starts.
    #[serde(default)]
    pub auto_migrate: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for verifying tokens.
    pub secret: String,
}

/// Share link configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SharingConfig {
    /// Lifetime of a share token in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Upper bound on live share tokens held in memory.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
    /// Path prefix of the public redemption route.
    #[serde(default = "default_link_base")]
    pub link_base: String,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl(),
            max_tokens: default_max_tokens(),
            link_base: default_link_base(),
        }
    }
}

impl SharingConfig {
    /// Returns the token lifetime as a `Duration`.
    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

fn default_token_ttl() -> u64 {
    600 // 10 minutes
}

fn default_max_tokens() -> u64 {
    10_000
}

fn default_link_base() -> String {
    "/kt-sessions/get_by_url".to_string()
}

/// Attachment processor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// Number of jobs allowed to run concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Duration of the simulated transcription, in milliseconds.
    #[serde(default = "default_work_duration")]
    pub work_duration_ms: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            work_duration_ms: default_work_duration(),
        }
    }
}

impl ProcessorConfig {
    /// Returns the simulated work duration.
    #[must_use]
    pub const fn work_duration(&self) -> Duration {
        Duration::from_millis(self.work_duration_ms)
    }
}

fn default_workers() -> usize {
    4
}

fn default_work_duration() -> u64 {
    10_000
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KTRACK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
