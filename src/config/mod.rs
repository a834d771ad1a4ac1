use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiration: i64,
    pub request_timeout: u64,
    pub log_format: LogFormat,
    /// JSON array of test requests loaded into the store at startup
    pub seed_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {}", e))?,
            None => 8080,
        };

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        let jwt_expiration = match lookup("JWT_EXPIRATION") {
            Some(value) => value.parse().map_err(|e| {
                anyhow::anyhow!("JWT_EXPIRATION must be a number of seconds: {}", e)
            })?,
            None => 86400,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT") {
            Some(value) => value.parse().map_err(|e| {
                anyhow::anyhow!("REQUEST_TIMEOUT must be a number of seconds: {}", e)
            })?,
            None => 30,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::to_lowercase) {
            None => LogFormat::Text,
            Some(ref f) if f == "text" => LogFormat::Text,
            Some(ref f) if f == "json" => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
        };

        let seed_file = lookup("SEED_FILE")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let config = Config {
            environment,
            port,
            jwt_secret,
            jwt_expiration,
            request_timeout,
            log_format,
            seed_file,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    fn validate(&self) -> Result<()> {
        if self.is_production() && self.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            bail!(
                "JWT_SECRET must be at least {} bytes in production",
                MIN_PRODUCTION_SECRET_LEN
            );
        }
        if self.jwt_expiration <= 0 {
            bail!("JWT_EXPIRATION must be positive");
        }
        if self.request_timeout == 0 {
            bail!("REQUEST_TIMEOUT must be positive");
        }
        Ok(())
    }
}
