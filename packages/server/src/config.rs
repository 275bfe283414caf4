use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable naming the config file (without extension).
pub const CONFIG_PATH_ENV: &str = "SRCREPO_CONFIG";

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
pub struct StorageConfig {
    /// Root directory holding one subdirectory per project.
    pub projects_dir: PathBuf,
    /// Upper bound for an uploaded ZIP, in bytes. Also caps its extracted size.
    pub max_upload_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryConfig {
    pub default_group_id: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token for mutating endpoints. When unset they are disabled.
    pub admin_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub github_api_url: String,
    pub timeout_secs: u64,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub upstream: UpstreamConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config".into());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.projects_dir", "./data/projects")?
            .set_default("storage.max_upload_size", 256 * 1024 * 1024)?
            .set_default("repository.default_group_id", "com.example")?
            .set_default("upstream.github_api_url", "https://api.github.com")?
            .set_default("upstream.timeout_secs", 10)?
            .add_source(File::with_name(&path).required(false))
            // e.g. SRCREPO__AUTH__ADMIN_TOKEN
            .add_source(Environment::with_prefix("SRCREPO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
