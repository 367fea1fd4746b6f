use std::env;
use std::time::Duration;

/// Placeholder values that must never be treated as real credentials.
const PLACEHOLDER_KEYS: &[&str] = &["your-api-key", "changeme", "sk-xxx", "placeholder"];

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub service_name: String,
    pub semantic_api_key: Option<String>,
    pub semantic_api_base: String,
    pub semantic_model: String,
    pub semantic_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://tagdesk.db?mode=rwc".to_string());

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let service_name = env::var("SERVICE_NAME").unwrap_or_else(|_| "tagdesk".to_string());

        let semantic_api_key = env::var("SEMANTIC_API_KEY").ok();

        let semantic_api_base = env::var("SEMANTIC_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let semantic_model =
            env::var("SEMANTIC_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let semantic_timeout_secs: u64 = env::var("SEMANTIC_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidTimeout)?;

        Ok(Config {
            database_url,
            server_host,
            server_port,
            service_name,
            semantic_api_key,
            semantic_api_base,
            semantic_model,
            semantic_timeout: Duration::from_secs(semantic_timeout_secs),
        })
    }

    /// Startup credential check for the semantic provider. The engine runs
    /// in fallback mode when this is false; availability never changes at
    /// runtime.
    pub fn semantic_provider_available(&self) -> bool {
        match &self.semantic_api_key {
            Some(key) => {
                let key = key.trim();
                !key.is_empty()
                    && key.starts_with("sk-")
                    && !PLACEHOLDER_KEYS.contains(&key.to_lowercase().as_str())
            }
            None => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SERVER_PORT must be a valid port number")]
    InvalidPort,
    #[error("SEMANTIC_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
}
