use serde::Deserialize;
use std::env;

use crate::domain::usage::DailyLimits;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Upstream chat provider
    pub chat_api_base_url: String,
    pub chat_api_key: String,
    pub chat_model: String,
    // Quotas
    pub guest_daily_limit: i32,
    pub free_daily_limit: i32,
    pub premium_daily_limit: i32,
    /// Seconds between retention sweeps, 0 disables the job
    pub usage_purge_interval_secs: u64,
    /// Browser origins allowed to call the API, empty allows any
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = ();

    /// Only the two known names are accepted, anything else is a misconfiguration
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let or_default =
            |name: &'static str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let defaults = DailyLimits::default();

        let config = Config {
            database_url: required("DATABASE_URL")?,
            host: or_default("HOST", "0.0.0.0"),
            port: parse("PORT", or_default("PORT", "8080"))?,
            jwt_secret: required("JWT_SECRET")?,
            environment: parse("ENVIRONMENT", or_default("ENVIRONMENT", "production"))?,
            log_format: match or_default("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            chat_api_base_url: or_default("CHAT_API_BASE_URL", "https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            chat_api_key: required("CHAT_API_KEY")?,
            chat_model: or_default("CHAT_MODEL", "gpt-4o-mini"),
            guest_daily_limit: parse(
                "GUEST_DAILY_LIMIT",
                or_default("GUEST_DAILY_LIMIT", &defaults.guest.to_string()),
            )?,
            free_daily_limit: parse(
                "FREE_DAILY_LIMIT",
                or_default("FREE_DAILY_LIMIT", &defaults.free.to_string()),
            )?,
            premium_daily_limit: parse(
                "PREMIUM_DAILY_LIMIT",
                or_default("PREMIUM_DAILY_LIMIT", &defaults.premium.to_string()),
            )?,
            usage_purge_interval_secs: parse(
                "USAGE_PURGE_INTERVAL_SECS",
                or_default("USAGE_PURGE_INTERVAL_SECS", "3600"),
            )?,
            cors_allowed_origins: or_default("CORS_ALLOWED_ORIGINS", "")
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn daily_limits(&self) -> DailyLimits {
        DailyLimits {
            guest: self.guest_daily_limit,
            free: self.free_daily_limit,
            premium: self.premium_daily_limit,
        }
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
