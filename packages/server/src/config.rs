use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued access tokens.
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the media store.
    pub media_dir: PathBuf,
    /// Scratch directory multipart uploads are written to before ingest.
    pub upload_dir: PathBuf,
    /// Base URL media is served from, e.g. `http://localhost:3000/media`.
    pub public_url: String,
    /// Per-file upload limit in bytes.
    pub max_upload_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://vidhub.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("storage.media_dir", "./data/media")?
            .set_default("storage.upload_dir", "./data/uploads")?
            .set_default("storage.public_url", "http://127.0.0.1:3000/media")?
            .set_default("storage.max_upload_size", 536_870_912_i64)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., VIDHUB__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("VIDHUB").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
