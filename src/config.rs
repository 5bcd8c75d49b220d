use clap::Parser;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

pub const SANDBOX_BASE_URL: &str = "https://tokenized.sandbox.bka.sh";
pub const PRODUCTION_BASE_URL: &str = "https://tokenized.pay.bka.sh";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_BUFFER_SECS: u64 = 300;

/// bKash Gateway - tokenized checkout client service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "8000")]
    pub port: u16,

    /// bKash application key
    #[arg(long, env = "BKASH_APP_KEY")]
    pub app_key: Option<String>,

    /// bKash application secret
    #[arg(long, env = "BKASH_APP_SECRET", hide_env_values = true)]
    pub app_secret: Option<String>,

    /// bKash merchant username
    #[arg(long, env = "BKASH_USERNAME")]
    pub username: Option<String>,

    /// bKash merchant password
    #[arg(long, env = "BKASH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Gateway environment (sandbox, production)
    #[arg(long, env = "BKASH_ENVIRONMENT", default_value = "sandbox")]
    pub environment: String,

    /// Explicit gateway base URL (overrides the environment)
    #[arg(long, env = "BKASH_BASE_URL")]
    pub base_url: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "BKASH_TIMEOUT_SECONDS", default_value = "30")]
    pub timeout: u64,

    /// Seconds before expiry at which the cached token is refreshed
    #[arg(long, env = "BKASH_TOKEN_REFRESH_BUFFER", default_value = "300")]
    pub refresh_buffer: u64,

    /// Accepted webhook clock skew in seconds
    #[arg(long, env = "WEBHOOK_TIMESTAMP_TOLERANCE", default_value = "300")]
    pub webhook_tolerance: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (pretty, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Gateway environment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Environment::Sandbox),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(Error::Configuration(format!(
                "Unknown environment '{}' (expected sandbox or production)",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application credentials and gateway settings.
///
/// Immutable after startup and shared as `Arc<GatewayConfig>` by the token
/// manager and the payment client.
#[derive(Clone)]
pub struct GatewayConfig {
    pub app_key: String,
    pub app_secret: String,
    pub username: String,
    pub password: String,
    pub environment: Environment,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub refresh_buffer_secs: u64,
}

impl GatewayConfig {
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            username: username.into(),
            password: password.into(),
            environment: Environment::Sandbox,
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            refresh_buffer_secs: DEFAULT_REFRESH_BUFFER_SECS,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_refresh_buffer_secs(mut self, refresh_buffer_secs: u64) -> Self {
        self.refresh_buffer_secs = refresh_buffer_secs;
        self
    }

    /// Base API URL: the explicit override if set, otherwise the environment's
    pub fn base_url(&self) -> &str {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/'),
            _ => self.environment.base_url(),
        }
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Refresh buffer as a chrono duration; saturates when out of range,
    /// which `validate` rejects
    pub fn refresh_buffer(&self) -> chrono::Duration {
        self.try_refresh_buffer().unwrap_or(chrono::Duration::MAX)
    }

    fn try_refresh_buffer(&self) -> Option<chrono::Duration> {
        i64::try_from(self.refresh_buffer_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }

    /// Validate credentials and timeouts; failure is fatal at startup
    pub fn validate(&self) -> Result<()> {
        require_non_blank("AppKey", &self.app_key)?;
        require_non_blank("AppSecret", &self.app_secret)?;
        require_non_blank("Username", &self.username)?;
        require_non_blank("Password", &self.password)?;

        if self.timeout_secs == 0 {
            return Err(Error::Configuration(
                "TimeoutSeconds must be greater than 0".to_string(),
            ));
        }

        if self.try_refresh_buffer().is_none() {
            return Err(Error::Configuration(format!(
                "TokenRefreshBuffer of {} seconds is out of range",
                self.refresh_buffer_secs
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url())
            .field("timeout_secs", &self.timeout_secs)
            .field("refresh_buffer_secs", &self.refresh_buffer_secs)
            .finish()
    }
}

fn require_non_blank(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Configuration(format!("{} is required", name)));
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Gateway credentials
    pub gateway: GatewayConfig,

    // Webhooks
    pub webhook_tolerance_secs: u64,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_args(CliArgs::parse())
    }

    /// Build configuration from parsed arguments. Credentials are not
    /// validated here; call `GatewayConfig::validate` before first use.
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let gateway = GatewayConfig {
            app_key: args.app_key.unwrap_or_default(),
            app_secret: args.app_secret.unwrap_or_default(),
            username: args.username.unwrap_or_default(),
            password: args.password.unwrap_or_default(),
            environment: args.environment.parse()?,
            base_url: args.base_url,
            timeout_secs: args.timeout,
            refresh_buffer_secs: args.refresh_buffer,
        };

        Ok(Config {
            server_host: args.host,
            server_port: args.port,
            gateway,
            webhook_tolerance_secs: args.webhook_tolerance,
            log_level: args.log_level,
            log_format: parse_log_format(&args.log_format),
        })
    }
}

/// Parse log format from string
fn parse_log_format(s: &str) -> LogFormat {
    match s.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}
