//! Connection configuration for persistence sessions.
//!
//! # Responsibility
//! - Describe where the store lives (`ConnectionSettings`).
//! - Render and parse the `Server=..;Port=..;Database=..;Uid=..;Pwd=..;`
//!   connection string consumed by session construction.
//! - Load settings from a TOML file.
//!
//! # Invariants
//! - A provider returns the same connection string for its whole lifetime.
//! - Passwords never appear in `Debug` output or log events.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Busy timeout applied to connections when settings do not override it.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Database name selecting a transient in-memory store.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Source of connection parameters for session construction.
pub trait ConfigurationProvider {
    /// Returns the connection string; deterministic for the provider lifetime.
    fn connection_string(&self) -> String;
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Toml(toml::de::Error),
    MalformedPair(String),
    UnknownKey(String),
    InvalidPort(String),
    InvalidTimeout(String),
    MissingDatabase,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Toml(err) => write!(f, "invalid config file: {err}"),
            Self::MalformedPair(pair) => {
                write!(f, "malformed connection string segment `{pair}`")
            }
            Self::UnknownKey(key) => write!(f, "unknown connection string key `{key}`"),
            Self::InvalidPort(value) => write!(f, "invalid port `{value}`"),
            Self::InvalidTimeout(value) => write!(f, "invalid timeout `{value}`"),
            Self::MissingDatabase => write!(f, "connection string has no `Database` value"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Toml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Toml(value)
    }
}

/// Connection parameters for the backing store.
///
/// Built once at process start and passed by reference to whatever opens
/// the session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub server: String,
    pub port: u16,
    /// SQLite file path, or `:memory:`.
    pub database: String,
    pub user: String,
    pub password: String,
    pub busy_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: 3306,
            database: "cosmodb.sqlite3".to_string(),
            user: "usrcosmo".to_string(),
            password: String::new(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl Debug for ConnectionSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish()
    }
}

impl ConnectionSettings {
    /// Settings for a transient in-memory store.
    pub fn in_memory() -> Self {
        Self {
            database: IN_MEMORY_DATABASE.to_string(),
            ..Self::default()
        }
    }

    /// Parses a `Key=Value;` connection string.
    ///
    /// Keys are case-insensitive and the trailing `;` is optional. Values
    /// may be wrapped in double quotes (`""` for a literal quote) to carry
    /// `;` or edge whitespace. Missing keys other than `Database` fall back
    /// to defaults. An optional `Timeout=<ms>` segment sets the busy timeout.
    pub fn parse(connection_string: &str) -> Result<Self, ConfigError> {
        let mut settings = Self {
            database: String::new(),
            ..Self::default()
        };

        for (key, value) in connection_pairs(connection_string)? {
            let value = value.as_str();
            match key.to_ascii_lowercase().as_str() {
                "server" => settings.server = value.to_string(),
                "port" => {
                    settings.port = value
                        .parse()
                        .map_err(|_| ConfigError::InvalidPort(value.to_string()))?;
                }
                "database" => settings.database = value.to_string(),
                "uid" => settings.user = value.to_string(),
                "pwd" => settings.password = value.to_string(),
                "timeout" => {
                    settings.busy_timeout_ms = value
                        .parse()
                        .map_err(|_| ConfigError::InvalidTimeout(value.to_string()))?;
                }
                other => return Err(ConfigError::UnknownKey(other.to_string())),
            }
        }

        if settings.database.is_empty() {
            return Err(ConfigError::MissingDatabase);
        }
        Ok(settings)
    }

    /// Reads settings from TOML text; absent fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(text)?;
        if settings.database.trim().is_empty() {
            return Err(ConfigError::MissingDatabase);
        }
        Ok(settings)
    }

    /// Reads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database == IN_MEMORY_DATABASE
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl ConfigurationProvider for ConnectionSettings {
    fn connection_string(&self) -> String {
        let mut rendered = format!(
            "Server={};Port={};Database={};Uid={};Pwd={};",
            quote_value(&self.server),
            self.port,
            quote_value(&self.database),
            quote_value(&self.user),
            quote_value(&self.password)
        );
        if self.busy_timeout_ms != DEFAULT_BUSY_TIMEOUT_MS {
            rendered.push_str(&format!("Timeout={};", self.busy_timeout_ms));
        }
        rendered
    }
}

// Values holding `;`, `"` or edge whitespace are wrapped in double quotes,
// with embedded quotes doubled.
fn quote_value(value: &str) -> Cow<'_, str> {
    if value.contains([';', '"']) || value.trim() != value {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn connection_pairs(input: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut pairs = Vec::new();
    let mut rest = input;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(pairs);
        }
        if let Some(tail) = rest.strip_prefix(';') {
            rest = tail;
            continue;
        }

        let segment = &rest[..rest.find(';').unwrap_or(rest.len())];
        let Some(eq) = segment.find('=') else {
            return Err(ConfigError::MalformedPair(segment.trim().to_string()));
        };
        let key = rest[..eq].trim().to_string();
        let after = rest[eq + 1..].trim_start();

        if let Some(quoted) = after.strip_prefix('"') {
            let (value, tail) = read_quoted(quoted)
                .ok_or_else(|| ConfigError::MalformedPair(format!("{key}=<unterminated quote>")))?;
            let tail = tail.trim_start();
            rest = match tail.strip_prefix(';') {
                Some(tail) => tail,
                None if tail.is_empty() => tail,
                None => return Err(ConfigError::MalformedPair(key)),
            };
            pairs.push((key, value));
        } else {
            let end = after.find(';').unwrap_or(after.len());
            pairs.push((key, after[..end].trim().to_string()));
            rest = &after[end..];
        }
    }
}

/// Reads a quoted value up to its closing quote; returns it and the rest.
fn read_quoted(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if ch != '"' {
            value.push(ch);
            continue;
        }
        if matches!(chars.peek(), Some((_, '"'))) {
            chars.next();
            value.push('"');
            continue;
        }
        return Some((value, &input[index + 1..]));
    }
    None
}
