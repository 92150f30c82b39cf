//! Connection settings resolved from the environment.

use sqlx::postgres::PgConnectOptions;

/// Login user
pub const DB_USER: &str = "DB_USER";
/// Login password
pub const DB_PASSWORD: &str = "DB_PASSWORD";
/// Network host
pub const DB_HOST: &str = "DB_HOST";
/// Network port
pub const DB_PORT: &str = "DB_PORT";
/// Database name
pub const DB_NAME: &str = "DB_NAME";

const DEFAULT_USER: &str = "postgres";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: &str = "5432";

/// Errors raised while resolving connection settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required value has no default and was not set
    #[error("Missing one or more database connection parameters: {}", .missing.join(", "))]
    MissingParameters {
        /// Variables that resolved to nothing
        missing: Vec<&'static str>,
    },

    /// `DB_PORT` is not a TCP port number
    #[error("Invalid database port {value:?}")]
    InvalidPort {
        /// The rejected value
        value: String,
    },
}

/// PostgreSQL connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Login user
    pub user: String,
    /// Login password
    pub password: String,
    /// Network host
    pub host: String,
    /// Network port
    pub port: u16,
    /// Database name
    pub database: String,
}

impl DbConfig {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    ///
    /// Defaults apply only to unset variables; a value set to the empty
    /// string counts as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: Option<&str>| {
            lookup(key)
                .or_else(|| default.map(str::to_string))
                .filter(|v| !v.is_empty())
        };

        let user = read(DB_USER, Some(DEFAULT_USER));
        let password = read(DB_PASSWORD, None);
        let host = read(DB_HOST, Some(DEFAULT_HOST));
        let port = read(DB_PORT, Some(DEFAULT_PORT));
        let database = read(DB_NAME, None);

        let missing: Vec<&'static str> = [
            (DB_USER, user.is_none()),
            (DB_PASSWORD, password.is_none()),
            (DB_HOST, host.is_none()),
            (DB_PORT, port.is_none()),
            (DB_NAME, database.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();

        let (Some(user), Some(password), Some(host), Some(port), Some(database)) =
            (user, password, host, port, database)
        else {
            return Err(ConfigError::MissingParameters { missing });
        };

        let port = port
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or(ConfigError::InvalidPort { value: port })?;

        Ok(Self {
            user,
            password,
            host,
            port,
            database,
        })
    }

    /// Driver options for a single connection.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    /// Connection URL with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}
