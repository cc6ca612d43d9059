use serde::{Deserialize, Deserializer};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;


/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Custom deserializer for comma-separated strings
fn deserialize_comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(s.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Application settings with environment variable support
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Server
    pub host: String,
    pub port: u16,
    pub static_dir: String,

    // Security
    #[serde(deserialize_with = "deserialize_comma_separated")]
    pub cors_allow_origins: Vec<String>,

    // Logging
    pub log_level: String,
    pub log_format: String,

    // Control mapping catalogue
    pub seed_mappings_on_startup: bool,
}

impl Settings {
    /// Create new settings instance from environment variables and .env file
    pub fn new() -> Result<Self, ConfigError> {
        Self::new_with_env_file(true)
    }

    /// Create new settings instance with optional .env file loading
    pub fn new_with_env_file(load_env_file: bool) -> Result<Self, ConfigError> {
        // Tests mutate process env; serialize reads so a build sees one consistent snapshot
        static SETTINGS_BUILD_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        let build_mutex = SETTINGS_BUILD_MUTEX.get_or_init(|| Mutex::new(()));
        let _guard = build_mutex
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if load_env_file {
            dotenvy::dotenv().ok();
        }

        let mut builder = config::Config::builder()
            // Database defaults
            .set_default("database_url", "sqlite://risk-register.db")?
            .set_default("database_max_connections", 5u32)?
            // Server defaults
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000u32)?
            .set_default("static_dir", "public")?
            // Security defaults
            .set_default("cors_allow_origins", "http://localhost:3000,http://127.0.0.1:3000")?
            // Logging defaults
            .set_default("log_level", "INFO")?
            .set_default("log_format", "json")?
            // Catalogue defaults
            .set_default("seed_mappings_on_startup", true)?;

        fn read_env(key: &str) -> Option<String> {
            std::env::var(key).ok()
        }

        fn parse_bool_env(key: &str) -> Option<bool> {
            read_env(key).and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            })
        }

        // String overrides
        if let Some(v) = read_env("DATABASE_URL") { builder = builder.set_override("database_url", v)?; }
        if let Some(v) = read_env("HOST") { builder = builder.set_override("host", v)?; }
        if let Some(v) = read_env("STATIC_DIR") { builder = builder.set_override("static_dir", v)?; }
        if let Some(v) = read_env("CORS_ALLOW_ORIGINS") { builder = builder.set_override("cors_allow_origins", v)?; }
        if let Some(v) = read_env("LOG_LEVEL") { builder = builder.set_override("log_level", v)?; }
        if let Some(v) = read_env("LOG_FORMAT") { builder = builder.set_override("log_format", v)?; }

        // Numeric overrides
        if let Some(v) = read_env("DATABASE_MAX_CONNECTIONS").and_then(|s| s.parse::<u32>().ok()) { builder = builder.set_override("database_max_connections", v)?; }
        if let Some(v) = read_env("PORT").and_then(|s| s.parse::<u32>().ok()) { builder = builder.set_override("port", v)?; }

        // Boolean overrides
        if let Some(v) = parse_bool_env("SEED_MAPPINGS_ON_STARTUP") { builder = builder.set_override("seed_mappings_on_startup", v)?; }

        let settings = builder.build()?;

        let config: Settings = settings.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.to_lowercase().as_str(), "json" | "plain" | "text") {
            return Err(ConfigError::Validation(
                "log_format must be 'json', 'plain' or 'text'".to_string()
            ));
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err(ConfigError::Validation(
                "database_url must be a sqlite: URL".to_string()
            ));
        }

        if self.database_max_connections == 0 {
            return Err(ConfigError::Validation(
                "database_max_connections must be greater than 0".to_string()
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::Validation(
                "port must be greater than 0".to_string()
            ));
        }

        Ok(())
    }
}
