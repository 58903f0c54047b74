//! Store configuration loaded from the environment
//!
//! Variables:
//!   DATABASE_DSN                     # Connection URL (required)
//!   DATABASE_USER                    # Username folded into the DSN (optional)
//!   DATABASE_PASSWORD                # Password folded into the DSN (optional)
//!   DATABASE_MAX_CONNECTIONS         # Pool size (default: 5)
//!   DATABASE_ACQUIRE_TIMEOUT_SECS    # Pool acquire timeout (default: 30)

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const DSN_VAR: &str = "DATABASE_DSN";
pub const USER_VAR: &str = "DATABASE_USER";
pub const PASSWORD_VAR: &str = "DATABASE_PASSWORD";
pub const MAX_CONNECTIONS_VAR: &str = "DATABASE_MAX_CONNECTIONS";
pub const ACQUIRE_TIMEOUT_VAR: &str = "DATABASE_ACQUIRE_TIMEOUT_SECS";

/// Default maximum connections for the pool.
/// Kept low for a single-entity library.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration source (e.g. `.env` file) does not exist
    #[error("configuration source not found: {path:?}")]
    MissingSource { path: PathBuf },

    /// The configuration source exists but could not be read
    #[error("failed to read configuration from {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// Required variable is unset or empty
    #[error("missing required variable '{0}'")]
    MissingVar(&'static str),

    /// Variable is set but its value is unusable
    #[error("invalid value for '{var}': {reason}")]
    InvalidVar { var: &'static str, reason: String },

    /// DSN scheme is not one of the supported backends
    #[error("unsupported database URL scheme in '{0}'")]
    UnsupportedScheme(String),
}

/// Storage backend, detected from the DSN scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    PostgreSQL,
    MySQL,
    SQLite,
}

impl Backend {
    /// Detect backend from URL.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if url.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Whether the backend authenticates with username/password.
    pub fn uses_credentials(self) -> bool {
        !matches!(self, Self::SQLite)
    }
}

/// Connection settings for the user store.
#[derive(Clone)]
pub struct StoreConfig {
    /// Connection URL.
    ///
    /// Examples:
    /// - PostgreSQL: `postgres://host/db`
    /// - MySQL: `mysql://host/db`
    /// - SQLite: `sqlite:path/to/db.sqlite` or `sqlite::memory:`
    pub dsn: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    /// Create a config with just the DSN.
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            username: None,
            password: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Builder: set credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Builder: set max connections.
    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    /// Builder: set acquire timeout.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from a `.env` file, falling back to the process environment for
    /// variables the file doesn't set.
    ///
    /// A missing file is fatal: the caller has no configuration source.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::MissingSource {
                path: path.to_path_buf(),
            });
        }

        let unreadable = |source: dotenvy::Error| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(unreadable)? {
            let (key, value) = item.map_err(unreadable)?;
            vars.insert(key, value);
        }
        tracing::debug!(path = %path.display(), count = vars.len(), "loaded env file");

        Self::from_lookup(|var| vars.get(var).cloned().or_else(|| std::env::var(var).ok()))
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let dsn = non_empty(DSN_VAR).ok_or(ConfigError::MissingVar(DSN_VAR))?;
        let mut config = Self::new(dsn.trim());
        config.username = non_empty(USER_VAR);
        config.password = lookup(PASSWORD_VAR);

        if let Some(raw) = non_empty(MAX_CONNECTIONS_VAR) {
            config.max_connections = match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        var: MAX_CONNECTIONS_VAR,
                        reason: format!("expected a positive integer, got '{}'", raw),
                    })
                }
            };
        }

        if let Some(raw) = non_empty(ACQUIRE_TIMEOUT_VAR) {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidVar {
                var: ACQUIRE_TIMEOUT_VAR,
                reason: format!("expected seconds, got '{}'", raw),
            })?;
            config.acquire_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Detect the backend from the DSN.
    pub fn backend(&self) -> Result<Backend, ConfigError> {
        Backend::from_url(&self.dsn).ok_or_else(|| ConfigError::UnsupportedScheme(self.redacted_dsn()))
    }

    /// DSN with configured credentials folded into the authority.
    ///
    /// A configured username replaces any user info already present in the
    /// DSN. A password without a username is paired with the DSN's own user;
    /// if the DSN has none, that's an `InvalidVar` error. SQLite DSNs are
    /// returned unchanged.
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        let backend = self.backend()?;
        let password_set = self.password.as_deref().is_some_and(|p| !p.is_empty());
        if self.username.is_none() && !password_set {
            return Ok(self.dsn.clone());
        }
        if !backend.uses_credentials() {
            tracing::debug!("ignoring credentials for sqlite backend");
            return Ok(self.dsn.clone());
        }

        let (scheme, rest) = self
            .dsn
            .split_once("://")
            .ok_or_else(|| ConfigError::UnsupportedScheme(self.redacted_dsn()))?;

        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);
        let (existing_user, host) = match authority.rsplit_once('@') {
            Some((info, host)) => (info.split(':').next().filter(|u| !u.is_empty()), host),
            None => (None, authority),
        };

        // DSN user info is already percent-encoded
        let mut userinfo = match (self.username.as_deref(), existing_user) {
            (Some(username), _) => urlencoding::encode(username).into_owned(),
            (None, Some(user)) => user.to_string(),
            (None, None) => {
                return Err(ConfigError::InvalidVar {
                    var: PASSWORD_VAR,
                    reason: format!("set without {} or a user in the DSN", USER_VAR),
                })
            }
        };
        if let Some(password) = self.password.as_deref() {
            userinfo.push(':');
            userinfo.push_str(&urlencoding::encode(password));
        }

        Ok(format!("{}://{}@{}{}", scheme, userinfo, host, tail))
    }

    /// DSN safe for logs: user info stripped.
    pub fn redacted_dsn(&self) -> String {
        match self.dsn.split_once("://") {
            Some((scheme, rest)) => {
                let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
                match rest[..authority_end].rsplit_once('@') {
                    Some((_, host)) => {
                        format!("{}://***@{}{}", scheme, host, &rest[authority_end..])
                    }
                    None => self.dsn.clone(),
                }
            }
            None => self.dsn.clone(),
        }
    }
}

// Don't leak credentials
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("dsn", &self.redacted_dsn())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}
