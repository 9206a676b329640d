//! Load settings from `.env` files and the process environment.

use crate::config::Provider;
use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_MAX_LIMIT: u32 = 1000;
const DEFAULT_POOL_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Process-wide settings, read once at startup and immutable afterwards.
#[derive(Clone, Debug)]
pub struct Settings {
    pub provider: Provider,
    pub connection_string: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Clamp for `limite`, also the default page size.
    pub max_limit: u32,
    pub bind_addr: String,
    pub environment: String,
}

/// Load `.env`, then `.env.development` on top of it when `ENVIRONMENT=development`.
pub fn load_env_files() {
    dotenvy::dotenv().ok();
    let env = std::env::var("ENVIRONMENT").unwrap_or_default();
    if env.eq_ignore_ascii_case("development") {
        // later file wins
        dotenvy::from_filename_override(".env.development").ok();
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider: Provider = get("DB_PROVIDER").unwrap_or_else(|| "sqlserver".into()).parse()?;
        let var = provider.connection_env_var();
        let connection_string = get(var).ok_or(ConfigError::MissingConnectionString(var))?;

        Ok(Settings {
            provider,
            connection_string,
            max_connections: parse_or(&get, "DB_POOL_MAX_CONNECTIONS", DEFAULT_POOL_MAX_CONNECTIONS)?,
            acquire_timeout: Duration::from_secs(parse_or(
                &get,
                "DB_POOL_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?),
            max_limit: parse_or(&get, "API_MAX_LIMIT", DEFAULT_MAX_LIMIT)?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            environment: get("ENVIRONMENT").unwrap_or_else(|| "production".into()).to_lowercase(),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("{key}='{raw}' is not a valid number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::from_lookup(lookup(&[("DB_SQLSERVER", "server=tcp:localhost,1433")])).unwrap();
        assert_eq!(s.provider, Provider::SqlServer);
        assert_eq!(s.max_limit, 1000);
        assert_eq!(s.max_connections, 10);
        assert_eq!(s.acquire_timeout, Duration::from_secs(30));
        assert_eq!(s.bind_addr, "0.0.0.0:8000");
        assert_eq!(s.environment, "production");
    }

    #[test]
    fn test_postgresql_alias_reads_postgres_string() {
        let s = Settings::from_lookup(lookup(&[
            ("DB_PROVIDER", "postgresql"),
            ("DB_POSTGRES", "postgres://u:p@localhost/db"),
            ("API_MAX_LIMIT", "200"),
        ]))
        .unwrap();
        assert_eq!(s.provider, Provider::PostgreSql);
        assert_eq!(s.connection_string, "postgres://u:p@localhost/db");
        assert_eq!(s.max_limit, 200);
    }

    #[test]
    fn test_missing_connection_string_is_fatal() {
        let err = Settings::from_lookup(lookup(&[("DB_PROVIDER", "mysql"), ("DB_MYSQL", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingConnectionString("DB_MYSQL")));
    }

    #[test]
    fn test_unsupported_provider_is_fatal() {
        let err = Settings::from_lookup(lookup(&[("DB_PROVIDER", "sqlite")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider(_)));
    }

    #[test]
    fn test_malformed_number_rejected() {
        let err = Settings::from_lookup(lookup(&[
            ("DB_PROVIDER", "mariadb"),
            ("DB_MARIADB", "mysql://localhost/db"),
            ("DB_POOL_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
