//! Service configuration - environment loading
//!
//! Every option has a documented default used when the variable is unset:
//! - `DATABASE_URL`: full connection string (default: built from `DB_*`)
//! - `DB_HOST` / `DB_PORT`: `localhost` / `5432`
//! - `DB_USER` / `DB_PASSWORD`: `root` / `toor`
//! - `DB_NAME`: `tweetdb` (content) or `userdb` (social)
//! - `DB_MAX_CONNECTIONS`: `10`
//! - `SERVICE_DISCOVERY_HOST` / `SERVICE_DISCOVERY_PORT`: `localhost` / `8040`
//! - `SERVICE_HOST` / `SERVICE_PORT`: advertised address (`localhost`, `8001` content / `8000` social)
//! - `BIND_ADDR`: interface to listen on (`0.0.0.0`)
//! - `REQUEST_TIMEOUT_SECS`: per-request deadline (`5`)
//! - `PENDING_TX_MAX_AGE_SECS`: maximum lifetime of a deferred transaction (`60`)
//! - `REAPER_INTERVAL_SECS`: how often stale deferred transactions are swept (`5`)

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Which of the two services this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Tweets, timelines and deferred deletions
    Content,
    /// Users and follow edges
    Social,
}

impl ServiceKind {
    /// Logical service type label used with the discovery registry
    pub fn service_type(self) -> &'static str {
        match self {
            Self::Content => "tweet",
            Self::Social => "user",
        }
    }

    fn default_port(self) -> u16 {
        match self {
            Self::Content => 8001,
            Self::Social => 8000,
        }
    }

    fn default_db_name(self) -> &'static str {
        match self {
            Self::Content => "tweetdb",
            Self::Social => "userdb",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("content"),
            Self::Social => f.write_str("social"),
        }
    }
}

impl FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content" | "tweet" => Ok(Self::Content),
            "social" | "user" => Ok(Self::Social),
            other => Err(ConfigError::Invalid {
                key: "service",
                value: other.to_owned(),
            }),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Discovery registry location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub host: String,
    pub port: u16,
}

impl RegistryConfig {
    /// Base URL of the registry, e.g. `http://localhost:8040`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Full configuration of one service process
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub kind: ServiceKind,
    pub bind_addr: SocketAddr,
    /// Host other services should use to reach this instance
    pub advertised_host: String,
    pub advertised_port: u16,
    pub database: DatabaseConfig,
    pub registry: RegistryConfig,
    pub request_timeout: Duration,
    pub pending_tx_max_age: Duration,
    pub reaper_interval: Duration,
}

impl ServiceConfig {
    /// Create config from environment variables
    pub fn from_env(kind: ServiceKind) -> Result<Self, ConfigError> {
        Self::from_lookup(kind, |key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source (for testing)
    pub fn from_lookup<F>(kind: ServiceKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let advertised_port = parse(&lookup, "SERVICE_PORT", kind.default_port())?;
        let bind_ip: IpAddr = parse(&lookup, "BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?;

        let url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                get("DB_USER", "root"),
                get("DB_PASSWORD", "toor"),
                get("DB_HOST", "localhost"),
                get("DB_PORT", "5432"),
                get("DB_NAME", kind.default_db_name()),
            ),
        };

        Ok(Self {
            kind,
            bind_addr: SocketAddr::new(bind_ip, advertised_port),
            advertised_host: get("SERVICE_HOST", "localhost"),
            advertised_port,
            database: DatabaseConfig {
                url,
                max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            },
            registry: RegistryConfig {
                host: get("SERVICE_DISCOVERY_HOST", "localhost"),
                port: parse(&lookup, "SERVICE_DISCOVERY_PORT", 8040)?,
            },
            request_timeout: parse_secs(&lookup, "REQUEST_TIMEOUT_SECS", 5)?,
            pending_tx_max_age: parse_secs(&lookup, "PENDING_TX_MAX_AGE_SECS", 60)?,
            reaper_interval: parse_secs(&lookup, "REAPER_INTERVAL_SECS", 5)?,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Whole seconds, zero rejected
fn parse_secs<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse(lookup, key, default)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: lookup(key).unwrap_or_default(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}
