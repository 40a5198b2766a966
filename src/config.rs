//! Runtime configuration from environment variables (optionally loaded from `.env`).

use crate::error::ConfigError;
use regex::Regex;
use std::time::Duration;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    /// Schema holding the users, stuff, usersownstuff and sessions tables.
    pub database_schema: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub request_timeout: Duration,
    pub session_ttl: Duration,
    pub bcrypt_cost: u32,
    pub body_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: "0.0.0.0:3000".into(),
            database_url: "postgres://localhost/stuff".into(),
            database_schema: "public".into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            session_ttl: Duration::from_secs(24 * 60 * 60),
            bcrypt_cost: 10,
            body_limit_bytes: 64 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_schema = get("DATABASE_SCHEMA").unwrap_or(defaults.database_schema);
        validate_identifier("DATABASE_SCHEMA", &database_schema)?;

        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), defaults.bcrypt_cost)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: format!("must be between {} and {}", MIN_BCRYPT_COST, MAX_BCRYPT_COST),
            });
        }

        Ok(AppConfig {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            database_schema,
            max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                defaults.max_connections,
            )?,
            acquire_timeout: secs_or(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                get("DATABASE_ACQUIRE_TIMEOUT_SECS"),
                defaults.acquire_timeout,
            )?,
            request_timeout: secs_or(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout,
            )?,
            session_ttl: secs_or("SESSION_TTL_SECS", get("SESSION_TTL_SECS"), defaults.session_ttl)?,
            bcrypt_cost,
            body_limit_bytes: parse_or(
                "BODY_LIMIT_BYTES",
                get("BODY_LIMIT_BYTES"),
                defaults.body_limit_bytes,
            )?,
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: v.clone(),
            reason: e.to_string(),
        }),
    }
}

fn secs_or(key: &'static str, raw: Option<String>, default: Duration) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(key, raw, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: "0".into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Schema names are interpolated into DDL, so only plain PostgreSQL identifiers are accepted.
fn validate_identifier(key: &'static str, name: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").map_err(|e| ConfigError::Invalid {
        key,
        value: name.to_string(),
        reason: e.to_string(),
    })?;
    if !re.is_match(name) {
        return Err(ConfigError::Invalid {
            key,
            value: name.to_string(),
            reason: "must be a plain identifier (letters, digits, underscore)".into(),
        });
    }
    Ok(())
}
