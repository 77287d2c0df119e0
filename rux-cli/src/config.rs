//! Client configuration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rux_session::{DEFAULT_CACHE_WINDOW, FileStore, MemoryStore, TokenStore};
use serde::{Deserialize, Deserializer};
use tracing_subscriber::filter::Directive;

/// Logging output format
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Logging {
    /// Additional filtering directives
    #[serde(default, deserialize_with = "Logging::deserialize_filters")]
    pub filters: Vec<Directive>,

    /// Logging format
    #[serde(default)]
    pub format: LogFormat,
}

impl Logging {
    fn deserialize_filters<'de, D>(deserializer: D) -> Result<Vec<Directive>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let dirs: Vec<String> = Deserialize::deserialize(deserializer)?;
        dirs.into_iter()
            .map(|dir| dir.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    /// Base address every request path is appended to
    #[serde(default = "Api::default_base_url")]
    pub base_url: String,
}

impl Api {
    fn default_base_url() -> String {
        "http://localhost:8080".to_owned()
    }
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
        }
    }
}

/// Where the session token is persisted
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Store {
    /// Kept only for the process lifetime
    Memory,
    /// TOML file on disk
    File { path: PathBuf },
}

impl Store {
    fn default_path() -> PathBuf {
        PathBuf::from("rux-session.toml")
    }

    /// Opens the configured store
    pub fn open(&self) -> Arc<dyn TokenStore> {
        match self {
            Store::Memory => Arc::new(MemoryStore::new()),
            Store::File { path } => Arc::new(FileStore::new(path)),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::File {
            path: Self::default_path(),
        }
    }
}

/// Session handling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// Seconds the decoded claims are reused without looking at the token
    #[serde(
        default = "Session::default_cache_window",
        deserialize_with = "Session::deserialize_window"
    )]
    pub cache_window: Duration,

    /// Token storage
    #[serde(default)]
    pub store: Store,
}

impl Session {
    fn default_cache_window() -> Duration {
        DEFAULT_CACHE_WINDOW
    }

    fn deserialize_window<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: u64 = Deserialize::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            cache_window: Self::default_cache_window(),
            store: Store::default(),
        }
    }
}

/// Top level client configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Remote API
    #[serde(default)]
    pub api: Api,

    /// Session handling
    #[serde(default)]
    pub session: Session,

    /// Logging configuration
    #[serde(default)]
    pub logging: Logging,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.session.cache_window, Duration::from_secs(30));
        assert!(matches!(config.session.store, Store::File { ref path } if path == &PathBuf::from("rux-session.toml")));
        assert!(config.logging.filters.is_empty());
        assert!(matches!(config.logging.format, LogFormat::Compact));
    }

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://api.rux.dev"

            [session]
            cache_window = 5
            store = { type = "memory" }

            [logging]
            filters = ["rux_session=debug"]
            format = "Pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.rux.dev");
        assert_eq!(config.session.cache_window, Duration::from_secs(5));
        assert!(matches!(config.session.store, Store::Memory));
        assert_eq!(config.logging.filters.len(), 1);
        assert!(matches!(config.logging.format, LogFormat::Pretty));
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [logging]
            filters = ["rux_cli=loudest"]
            "#,
        );
        assert!(result.is_err());
    }
}
