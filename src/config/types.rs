//! Provider identity and the engine family it selects.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Configured provider identifier (`DB_PROVIDER`). Several providers share an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
    SqlServer,
    SqlServerExpress,
    LocalDb,
    Postgres,
    PostgreSql,
    MySql,
    MariaDb,
}

/// Engine family. One dialect per variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Engine {
    SqlServer,
    Postgres,
    MySql,
}

impl Provider {
    pub const NAMES: &'static [&'static str] = &[
        "sqlserver",
        "sqlserverexpress",
        "localdb",
        "postgres",
        "postgresql",
        "mysql",
        "mariadb",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::SqlServer => "sqlserver",
            Provider::SqlServerExpress => "sqlserverexpress",
            Provider::LocalDb => "localdb",
            Provider::Postgres => "postgres",
            Provider::PostgreSql => "postgresql",
            Provider::MySql => "mysql",
            Provider::MariaDb => "mariadb",
        }
    }

    pub fn engine(&self) -> Engine {
        match self {
            Provider::SqlServer | Provider::SqlServerExpress | Provider::LocalDb => Engine::SqlServer,
            Provider::Postgres | Provider::PostgreSql => Engine::Postgres,
            Provider::MySql | Provider::MariaDb => Engine::MySql,
        }
    }

    /// Environment variable holding this provider's connection string.
    pub fn connection_env_var(&self) -> &'static str {
        match self {
            Provider::SqlServer => "DB_SQLSERVER",
            Provider::SqlServerExpress => "DB_SQLSERVEREXPRESS",
            Provider::LocalDb => "DB_LOCALDB",
            Provider::Postgres | Provider::PostgreSql => "DB_POSTGRES",
            Provider::MySql => "DB_MYSQL",
            Provider::MariaDb => "DB_MARIADB",
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlserver" => Ok(Provider::SqlServer),
            "sqlserverexpress" => Ok(Provider::SqlServerExpress),
            "localdb" => Ok(Provider::LocalDb),
            "postgres" => Ok(Provider::Postgres),
            "postgresql" => Ok(Provider::PostgreSql),
            "mysql" => Ok(Provider::MySql),
            "mariadb" => Ok(Provider::MariaDb),
            _ => Err(ConfigError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
