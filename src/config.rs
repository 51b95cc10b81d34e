//! Configuration Module
//!
//! Loads cache configuration from an optional JSON file and environment variables.
//! Values set in the environment override values read from the file.

use std::env;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::{Encoding, FailurePolicy};
use crate::error::{CacheError, Result};

/// Default TTL in seconds for calls that do not pass one explicitly.
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Default directory for the sled backend.
pub const DEFAULT_DATA_DIR: &str = "./data/dynacache";

// == Backend Kind ==
/// Which storage backend the binary opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Memory,
    Sled,
}

impl std::str::FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "sled" => Ok(BackendKind::Sled),
            other => Err(CacheError::Config(format!("unknown backend '{}'", other))),
        }
    }
}

// == Credentials ==
/// Static credentials for a remote store.
///
/// The secret and session token are never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl Credentials {
    /// Resolves credentials from the ambient `AWS_*` environment variables.
    ///
    /// Returns None unless both the access key and the secret are present.
    pub fn from_ambient() -> Option<Self> {
        let access_key_id = env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok()?;
        Some(Self {
            access_key_id,
            secret_access_key,
            session_token: env::var("AWS_SESSION_TOKEN").ok(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// == Config ==
/// Cache configuration.
///
/// Only `table_name` is required. Region, endpoint and credentials are carried for
/// remote backends and do not change caching semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Table (or collection) holding cache entries
    pub table_name: String,
    /// TTL applied by calls that do not pass one
    pub default_ttl_seconds: u64,
    /// Store region, if the backend is regional
    pub region: Option<String>,
    /// Store endpoint override
    pub endpoint: Option<String>,
    /// Explicit credentials; None means ambient resolution
    pub credentials: Option<Credentials>,
    /// Key derivation strategy
    pub key_encoding: Encoding,
    /// Payload codec
    pub payload_encoding: Encoding,
    /// Behavior when the store is unavailable
    pub failure_policy: FailurePolicy,
    /// Backend opened by the binary
    pub backend: BackendKind,
    /// On-disk location for the sled backend
    pub data_dir: String,
    /// Interval of the expired-row reaper; None disables it
    pub reap_interval_seconds: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: String::new(),
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            region: None,
            endpoint: None,
            credentials: None,
            key_encoding: Encoding::default(),
            payload_encoding: Encoding::default(),
            failure_policy: FailurePolicy::default(),
            backend: BackendKind::default(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
            reap_interval_seconds: None,
        }
    }
}

impl Config {
    /// Creates a configuration for the given table with defaults for everything else.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CacheError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            CacheError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Environment Variables
    /// - `DYNACACHE_CONFIG_FILE` - JSON file read before applying overrides
    /// - `DYNACACHE_TABLE_NAME` - Table name (required unless set in the file)
    /// - `DYNACACHE_DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `DYNACACHE_REGION` / `AWS_REGION` - Store region
    /// - `DYNACACHE_ENDPOINT` - Store endpoint
    /// - `DYNACACHE_KEY_ENCODING` / `DYNACACHE_PAYLOAD_ENCODING` - `structural` or `textual`
    /// - `DYNACACHE_FAILURE_POLICY` - `fail_open` or `fail_closed`
    /// - `DYNACACHE_BACKEND` - `memory` or `sled`
    /// - `DYNACACHE_DATA_DIR` - sled directory
    /// - `DYNACACHE_REAP_INTERVAL` - reaper interval in seconds
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match env::var("DYNACACHE_CONFIG_FILE") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        if config.credentials.is_none() {
            config.credentials = Credentials::from_ambient();
        }
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(table) = env::var("DYNACACHE_TABLE_NAME") {
            self.table_name = table;
        }
        if let Some(ttl) = env::var("DYNACACHE_DEFAULT_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.default_ttl_seconds = ttl;
        }
        if let Ok(region) = env::var("DYNACACHE_REGION").or_else(|_| env::var("AWS_REGION")) {
            self.region = Some(region);
        }
        if let Ok(endpoint) = env::var("DYNACACHE_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Ok(value) = env::var("DYNACACHE_KEY_ENCODING") {
            self.key_encoding = value.parse()?;
        }
        if let Ok(value) = env::var("DYNACACHE_PAYLOAD_ENCODING") {
            self.payload_encoding = value.parse()?;
        }
        if let Ok(value) = env::var("DYNACACHE_FAILURE_POLICY") {
            self.failure_policy = value.parse()?;
        }
        if let Ok(value) = env::var("DYNACACHE_BACKEND") {
            self.backend = value.parse()?;
        }
        if let Ok(dir) = env::var("DYNACACHE_DATA_DIR") {
            self.data_dir = dir;
        }
        if let Some(interval) = env::var("DYNACACHE_REAP_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.reap_interval_seconds = Some(interval);
        }
        Ok(())
    }

    /// Checks that required values are present.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(CacheError::Config("table_name is required".to_string()));
        }
        if self.reap_interval_seconds == Some(0) {
            return Err(CacheError::Config(
                "reap_interval_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
