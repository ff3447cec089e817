//! Startup configuration.
//!
//! Configuration is read once from the process environment (after loading an
//! optional `.env` file) and then shared read-only between all handlers:
//! - `GEMINI_API_KEY` - API key for the Gemini API (required)
//! - `GEMINI_MODEL` - Model name (default: `gemini-1.5-pro`)
//! - `GEMINI_BASE_URL` - API base URL (default: public v1beta endpoint)
//! - `LOG_LEVEL` - Log level when `RUST_LOG` is not set (default: `INFO`)
//! - `MCP_SERVER_NAME` - Name reported to MCP clients (default: `plan-mcp`)
//! - `PLAN_MCP_TIMEOUT_SECS` - Per-attempt model timeout (default: 60)
//! - `PLAN_MCP_MAX_RETRIES` - Retries for transient model errors (default: 2, at most 10)
//! - `PLAN_MCP_API_KEY` - Bearer token for the HTTP transport (optional)

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SERVER_NAME: &str = "plan-mcp";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Upper bound on `PLAN_MCP_MAX_RETRIES`; each retry can wait a full timeout.
pub const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY environment variable is required")]
    MissingApiKey,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Retry policy for transient model failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Immutable server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub log_level: String,
    pub server_name: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub http_api_key: Option<String>,
}

impl Config {
    /// Create a config with an explicit API key and defaults for everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            log_level: "INFO".to_string(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            http_api_key: None,
        }
    }

    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = Self::new(get("GEMINI_API_KEY").unwrap_or_default());

        if let Some(model) = get("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = get("GEMINI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(level) = get("LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(name) = get("MCP_SERVER_NAME") {
            config.server_name = name;
        }
        if let Some(secs) = get("PLAN_MCP_TIMEOUT_SECS") {
            let secs = parse_number::<u64>("PLAN_MCP_TIMEOUT_SECS", &secs)?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "PLAN_MCP_TIMEOUT_SECS",
                    value: "0".to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = get("PLAN_MCP_MAX_RETRIES") {
            let max_retries: u32 = parse_number("PLAN_MCP_MAX_RETRIES", &retries)?;
            if max_retries > MAX_RETRIES_LIMIT {
                return Err(ConfigError::InvalidValue {
                    name: "PLAN_MCP_MAX_RETRIES",
                    value: retries,
                });
            }
            config.retry.max_retries = max_retries;
        }
        config.http_api_key = get("PLAN_MCP_API_KEY");

        config.validate()?;
        Ok(config)
    }

    /// Fail fast when required settings are absent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Tracing filter directive derived from `LOG_LEVEL`.
    pub fn log_directive(&self) -> String {
        let level = match self.log_level.to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warning" | "warn" => "warn",
            "error" | "critical" => "error",
            _ => "info",
        };
        format!("plan_mcp={}", level)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}
