use std::{env, net::IpAddr, path::PathBuf, str::FromStr};

use dotenvy::dotenv;
use log::{debug, info, warn};
use serde::Deserialize;
use url::Url;

use crate::errors::ConfigError;
use crate::utils::id_generator::DEFAULT_CODE_LENGTH;

// Server-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub workers: usize,
}

// Application-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub environment: Environment,
    pub log_level: String,
}

// Environment enum for different deployment environments
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

// Implement FromStr trait for Environment enum to enable parsing from string
impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!(
                "Invalid environment: {}. Must be one of: development, testing, production",
                s
            )),
        }
    }
}

/// Alias creation and resolution settings
#[derive(Debug, Deserialize, Clone)]
pub struct ShortenerConfig {
    /// Origin prepended to short codes when building `short_url`
    pub base_url: String,
    pub code_length: usize,
    pub default_validity_minutes: u32,
    /// Largest batch the HTTP layer accepts
    pub max_batch_size: usize,
    pub max_generation_attempts: usize,
    /// Refuse to redirect aliases past their expiry
    pub enforce_expiry: bool,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            code_length: DEFAULT_CODE_LENGTH,
            default_validity_minutes: 30,
            max_batch_size: 5,
            max_generation_attempts: 1000,
            enforce_expiry: false,
        }
    }
}

impl ShortenerConfig {
    fn validate(&self) -> ConfigResult<()> {
        match Url::parse(&self.base_url) {
            Ok(url) if url.host().is_some() => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "PUBLIC_BASE_URL",
                    reason: format!("'{}' is not an absolute URL", self.base_url),
                })
            }
        }

        let positive = [
            ("SHORTCODE_LENGTH", self.code_length),
            ("DEFAULT_VALIDITY_MINUTES", self.default_validity_minutes as usize),
            ("MAX_BATCH_SIZE", self.max_batch_size),
            ("MAX_GENERATION_ATTEMPTS", self.max_generation_attempts),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    File,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "json" => Ok(StoreBackend::File),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            _ => Err(format!(
                "Invalid store backend: {}. Must be one of: file, memory",
                s
            )),
        }
    }
}

// Store Config
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

// Remote log sink
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_ms: u64,
}

// Config struct that matches our environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub shortener: ShortenerConfig,
    pub store: StoreConfig,
    pub telemetry: TelemetryConfig,
}

// Result type for configuration functions
type ConfigResult<T> = Result<T, ConfigError>;

impl Config {
    // Load configuration from environment variables
    pub fn load() -> ConfigResult<Self> {
        // Load .env file if it exists
        match dotenv() {
            Ok(_) => debug!(".env file loaded successfully"),
            Err(e) => warn!("Could not load .env file: {}", e),
        }

        // Create the server config
        let server = ServerConfig {
            host: get_env_or_default("SERVER_HOST", "127.0.0.1")?,
            port: get_env_or_default("SERVER_PORT", "8000")?,
            workers: get_env_or_default("SERVER_WORKERS", "4")?,
        };

        // Get version from Cargo.toml or environment
        let version = option_env!("CARGO_PKG_VERSION")
            .unwrap_or("0.1.0")
            .to_string();

        // Create the app config
        let app = AppConfig {
            name: get_env_or_default("APP_NAME", "url-alias")?,
            version: env::var("APP_VERSION").unwrap_or(version),
            environment: get_env_or_default("APP_ENVIRONMENT", "development")?,
            log_level: get_env_or_default("RUST_LOG", "info")?,
        };

        let defaults = ShortenerConfig::default();
        let shortener = ShortenerConfig {
            base_url: get_env_or_default("PUBLIC_BASE_URL", &defaults.base_url)?,
            code_length: get_env_or_default("SHORTCODE_LENGTH", &defaults.code_length.to_string())?,
            default_validity_minutes: get_env_or_default(
                "DEFAULT_VALIDITY_MINUTES",
                &defaults.default_validity_minutes.to_string(),
            )?,
            max_batch_size: get_env_or_default("MAX_BATCH_SIZE", &defaults.max_batch_size.to_string())?,
            max_generation_attempts: get_env_or_default(
                "MAX_GENERATION_ATTEMPTS",
                &defaults.max_generation_attempts.to_string(),
            )?,
            enforce_expiry: get_env_or_default("ENFORCE_EXPIRY", "false")?,
        };
        shortener.validate()?;

        let store = StoreConfig {
            backend: get_env_or_default("STORE_BACKEND", "file")?,
            path: get_env_or_default("STORE_PATH", "data/aliases.json")?,
        };

        let telemetry = TelemetryConfig {
            enabled: get_env_or_default("TELEMETRY_ENABLED", "false")?,
            url: get_env_or_default("LOG_SERVER_URL", "https://example-log-server.invalid")?,
            timeout_ms: get_env_or_default("TELEMETRY_TIMEOUT_MS", "4000")?,
        };

        let config = Config {
            server,
            app,
            shortener,
            store,
            telemetry,
        };
        info!("Configuration loaded successfully");
        debug!("Loaded config: {:?}", config);

        Ok(config)
    }
}

/// Helper function to get an env variable with a default value
fn get_env_or_default<T: FromStr>(key: &str, default: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(format!("Could not parse {}: {}", key, e))),
        Err(env::VarError::NotPresent) => {
            debug!("{} not set, using default: {}", key, default);
            default.parse::<T>().map_err(|e| {
                ConfigError::ParseError(format!("Could not parse default for {}: {}", key, e))
            })
        }
        Err(e) => Err(ConfigError::EnvVarError(e)),
    }
}
