//! Configuration for the job feed binary.
//!
//! All configuration is loaded from environment variables. The service
//! needs the shared API key, how to reach `PostgreSQL`, where to listen,
//! and how often to refresh the snapshot.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use jobfeed_api::ServerConfig;
use jobfeed_core::RefreshConfig;
use jobfeed_db::PostgresConfig;

use crate::error::ServiceError;

/// Complete service configuration loaded from the environment.
///
/// Deliberately not `Debug`: it holds the API key and database password.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Shared secret required in the `X-API-KEY` header.
    pub api_key: String,
    /// How to reach `PostgreSQL`.
    pub database: DatabaseTarget,
    /// Maximum number of pooled connections.
    pub db_max_connections: u32,
    /// Server-side statement timeout.
    pub db_statement_timeout: Duration,
    /// Listener address.
    pub server: ServerConfig,
    /// Refresh cadence and deadlines.
    pub refresh: RefreshConfig,
}

/// Where the database lives.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// A full connection URL (`DATABASE_URL`).
    Url(String),
    /// Individual `POSTGRES_*` settings.
    Parts {
        /// Database host.
        host: String,
        /// Database port.
        port: u16,
        /// Database name.
        database: String,
        /// Login user.
        user: String,
        /// Login password.
        password: String,
    },
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `API_KEY` -- shared secret for every request (must not be empty)
    ///
    /// Optional variables:
    /// - `DATABASE_URL` -- full connection URL, overrides the `POSTGRES_*` set
    /// - `POSTGRES_HOST` (default `localhost`), `POSTGRES_PORT` (default `5432`),
    ///   `POSTGRES_DB` (default `upwork_jobs`), `POSTGRES_USER` (default
    ///   `postgres`), `POSTGRES_PASSWORD` (default `postgres`)
    /// - `DB_MAX_CONNECTIONS` -- pool size (default 25)
    /// - `DB_STATEMENT_TIMEOUT_MS` -- server-side statement timeout (default 5000)
    /// - `HOST` -- bind address (default `0.0.0.0`)
    /// - `PORT` -- listening port (default 8080)
    /// - `REFRESH_INTERVAL_MS` -- refresh cadence (default 500)
    /// - `REFRESH_TIMEOUT_MS` -- deadline for one store read (default 5000)
    /// - `STATUS_LOG_INTERVAL_SECS` -- cache status log cadence (default 30)
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ServiceError::Config("API_KEY environment variable is required".to_owned())
            })?;

        let database = match lookup("DATABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => DatabaseTarget::Url(url),
            None => DatabaseTarget::Parts {
                host: lookup("POSTGRES_HOST").unwrap_or_else(|| "localhost".to_owned()),
                port: parse_or(&lookup, "POSTGRES_PORT", 5432)?,
                database: lookup("POSTGRES_DB").unwrap_or_else(|| "upwork_jobs".to_owned()),
                user: lookup("POSTGRES_USER").unwrap_or_else(|| "postgres".to_owned()),
                password: lookup("POSTGRES_PASSWORD").unwrap_or_else(|| "postgres".to_owned()),
            },
        };

        let db_max_connections: u32 = parse_or(&lookup, "DB_MAX_CONNECTIONS", 25)?;
        if db_max_connections == 0 {
            return Err(ServiceError::Config(
                "invalid DB_MAX_CONNECTIONS: must be at least 1".to_owned(),
            ));
        }

        let server = ServerConfig {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_or(&lookup, "PORT", 8080)?,
        };

        let refresh = RefreshConfig::default()
            .with_interval(positive_millis(&lookup, "REFRESH_INTERVAL_MS", 500)?)
            .with_timeout(positive_millis(&lookup, "REFRESH_TIMEOUT_MS", 5000)?)
            .with_status_interval(Duration::from_secs(positive(
                &lookup,
                "STATUS_LOG_INTERVAL_SECS",
                30,
            )?));

        Ok(Self {
            api_key,
            database,
            db_max_connections,
            db_statement_timeout: positive_millis(&lookup, "DB_STATEMENT_TIMEOUT_MS", 5000)?,
            server,
            refresh,
        })
    }

    /// Build the pool configuration for the configured database.
    pub fn postgres_config(&self) -> Result<PostgresConfig, ServiceError> {
        let base = match &self.database {
            DatabaseTarget::Url(url) => PostgresConfig::from_url(url)?,
            DatabaseTarget::Parts {
                host,
                port,
                database,
                user,
                password,
            } => PostgresConfig::from_parts(host, *port, database, user, password),
        };

        Ok(base
            .with_max_connections(self.db_max_connections)
            .with_statement_timeout(self.db_statement_timeout))
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ServiceError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| ServiceError::Config(format!("invalid {name}: {e}")))
    })
}

/// Parse an optional non-zero integer.
fn positive<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ServiceError>
where
    F: Fn(&str) -> Option<String>,
{
    let value: u64 = parse_or(lookup, name, default)?;
    if value == 0 {
        return Err(ServiceError::Config(format!(
            "invalid {name}: must be greater than zero"
        )));
    }
    Ok(value)
}

/// Parse an optional non-zero millisecond duration.
fn positive_millis<F>(lookup: &F, name: &str, default_ms: u64) -> Result<Duration, ServiceError>
where
    F: Fn(&str) -> Option<String>,
{
    positive(lookup, name, default_ms).map(Duration::from_millis)
}
