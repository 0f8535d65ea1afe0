//! Configuration system for beacon.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $BEACON_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/beacon/config.toml
//!   3. ~/.config/beacon/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    pub http: HttpConfig,
    pub nodes: NodesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listener address, `host:port`.
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodesConfig {
    /// Shared bearer secret. Empty = /nodes/ is not mounted.
    pub token: String,
    /// Which directory store to run.
    pub backend: StoreBackend,
    /// Entry lifetime for the Redis backend.
    pub ttl_secs: u64,
    pub redis: RedisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RedisConfig {
    /// `host:port` of the Redis server. Empty = no TTL backend.
    pub addr: String,
    /// ACL user name. Empty = legacy `AUTH <password>`.
    pub username: String,
    /// Empty = no `AUTH` at all.
    pub password: String,
    pub db: u32,
    /// Prepended to every node name to form the Redis key.
    pub key_prefix: String,
    /// Max open connections.
    pub pool_size: u64,
    pub connect_timeout_ms: u64,
    pub io_timeout_ms: u64,
}

/// Store selection as written in config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redis when an address is configured, otherwise in-memory.
    #[default]
    Auto,
    Memory,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(StoreBackend::Auto),
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(ConfigError::InvalidBackend(other.to_string())),
        }
    }
}

/// The directory store the daemon should actually build, once config
/// presence has been taken into account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryBackend {
    Memory,
    Redis { redis: RedisConfig, ttl: Duration },
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            backend: StoreBackend::Auto,
            ttl_secs: 2 * 60 * 60,
            redis: RedisConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: String::new(),
            username: String::new(),
            password: String::new(),
            db: 0,
            key_prefix: "nodes:".to_string(),
            pool_size: 16,
            connect_timeout_ms: 2_000,
            io_timeout_ms: 2_000,
        }
    }
}

// ── Backend resolution ────────────────────────────────────────────────────────

impl NodesConfig {
    /// Resolve which store backs /nodes/. `None` means the endpoint stays
    /// unmounted: no token, or Redis requested without an address.
    pub fn directory(&self) -> Option<DirectoryBackend> {
        if self.token.is_empty() {
            return None;
        }
        let has_redis = !self.redis.addr.is_empty();
        match (self.backend, has_redis) {
            (StoreBackend::Memory, _) | (StoreBackend::Auto, false) => {
                Some(DirectoryBackend::Memory)
            }
            (StoreBackend::Redis, false) => None,
            (StoreBackend::Redis | StoreBackend::Auto, true) => Some(DirectoryBackend::Redis {
                redis: self.redis.clone(),
                ttl: self.ttl(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl RedisConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("beacon")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("unknown store backend {0:?} (expected auto, memory or redis)")]
    InvalidBackend(String),
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl BeaconConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::file_path(), |var| std::env::var(var).ok())
    }

    /// Load from `path` (defaults when it does not exist), then apply
    /// overrides read through `lookup`. An unreadable file, a parse error or
    /// a bad override value fails the whole load.
    pub fn load_from<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?
        } else {
            BeaconConfig::default()
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("BEACON_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&BeaconConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply BEACON_* overrides, reading variables through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BEACON_HTTP__BIND") {
            self.http.bind = v;
        }
        if let Some(v) = lookup("BEACON_NODES__TOKEN") {
            self.nodes.token = v;
        }
        if let Some(v) = lookup("BEACON_NODES__BACKEND") {
            self.nodes.backend = v.parse()?;
        }
        if let Some(v) = lookup("BEACON_NODES__TTL_SECS") {
            self.nodes.ttl_secs = parse_var("BEACON_NODES__TTL_SECS", v)?;
        }
        if let Some(v) = lookup("BEACON_NODES__REDIS__ADDR") {
            self.nodes.redis.addr = v;
        }
        if let Some(v) = lookup("BEACON_NODES__REDIS__USERNAME") {
            self.nodes.redis.username = v;
        }
        if let Some(v) = lookup("BEACON_NODES__REDIS__PASSWORD") {
            self.nodes.redis.password = v;
        }
        if let Some(v) = lookup("BEACON_NODES__REDIS__DB") {
            self.nodes.redis.db = parse_var("BEACON_NODES__REDIS__DB", v)?;
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}
