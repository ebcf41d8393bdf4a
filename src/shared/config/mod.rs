//! Hub configuration module
//!
//! Provides the configuration types for the activity hub: timing constants,
//! authentication policy and the priority-language allow-list.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables. Use [`HubConfig::load`] for the full stack or
//! [`HubConfig::builder`] to assemble one in code.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default listening port
const DEFAULT_PORT: u16 = 3000;

/// How often the lifecycle sweep runs
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Connections idle for longer than this are evicted
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Reference cache age after which a lookup miss triggers a refresh
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Per-connection outbound queue depth
pub const DEFAULT_OUTBOUND_QUEUE: usize = 64;

/// Upper bound on a single socket write
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Activities kept in the in-memory recent snapshot
pub const DEFAULT_RECENT_CAPACITY: usize = 200;

/// Depth of the collaborator ingest queue
pub const DEFAULT_INGEST_QUEUE: usize = 1024;

/// Mission-priority languages (African languages)
const DEFAULT_PRIORITY_LANGUAGES: &[&str] = &[
    "sw", "yo", "ig", "ha", "zu", "xh", "am", "so", "rw", "sn", "tw", "ak", "ee", "wo", "ln",
    "lg", "om", "ti", "st", "tn", "ny", "mg", "ff", "kg", "ki", "af",
];

/// Priority bonus settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityConfig {
    /// Language codes whose activities get the bonus (lower-case)
    pub languages: BTreeSet<String>,
    /// Points added when an activity touches one of `languages`
    pub bonus: u8,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PRIORITY_LANGUAGES.iter().copied(), 1)
    }
}

impl PriorityConfig {
    pub fn new<I, S>(languages: I, bonus: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            languages: languages
                .into_iter()
                .map(|code| code.as_ref().trim().to_lowercase())
                .filter(|code| !code.is_empty())
                .collect(),
            bonus,
        }
    }

    /// Whether `code` is on the allow-list (case-insensitive)
    pub fn is_priority(&self, code: &str) -> bool {
        self.languages.contains(&code.trim().to_lowercase())
    }
}

/// Hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Port the HTTP/WebSocket server binds to
    pub port: u16,
    /// Secret used to verify handshake JWTs
    pub jwt_secret: String,
    /// Reject connections without a token
    pub require_auth: bool,
    /// Locale assumed when a client states none
    pub default_language: String,
    pub priority: PriorityConfig,
    pub sweep_interval: Duration,
    pub idle_timeout: Duration,
    pub cache_ttl: Duration,
    pub outbound_queue: usize,
    pub send_timeout: Duration,
    pub recent_capacity: usize,
    pub ingest_queue: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            jwt_secret: String::from("change-me-in-production"),
            require_auth: false,
            default_language: String::from("en"),
            priority: PriorityConfig::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            ingest_queue: DEFAULT_INGEST_QUEUE,
        }
    }
}

impl HubConfig {
    /// Create a new HubConfigBuilder
    pub fn builder() -> HubConfigBuilder {
        HubConfigBuilder::default()
    }

    /// Load defaults, then the TOML file named by `HUB_CONFIG` (if any),
    /// then environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Ok(path) = std::env::var("HUB_CONFIG") {
            builder = builder.file(&path)?;
        }
        builder.env()?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outbound_queue == 0 {
            return Err(ConfigError::InvalidValue {
                key: "outbound_queue",
                value: "0".to_string(),
            });
        }
        if self.ingest_queue == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ingest_queue",
                value: "0".to_string(),
            });
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "sweep_interval",
                value: "0".to_string(),
            });
        }
        if self.default_language.trim().is_empty() {
            return Err(ConfigError::MissingValue("default_language"));
        }
        Ok(())
    }
}

/// Shape of the optional TOML config file
///
/// ```toml
/// port = 4000
/// require_auth = false
///
/// [priority]
/// languages = ["sw", "yo", "ha"]
/// bonus = 1
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    port: Option<u16>,
    jwt_secret: Option<String>,
    require_auth: Option<bool>,
    default_language: Option<String>,
    priority: Option<FilePriority>,
    recent_capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilePriority {
    languages: Option<Vec<String>>,
    bonus: Option<u8>,
}

/// Builder for HubConfig
#[derive(Debug, Default)]
pub struct HubConfigBuilder {
    config: Option<HubConfig>,
}

impl HubConfigBuilder {
    fn current(&mut self) -> &mut HubConfig {
        self.config.get_or_insert_with(HubConfig::default)
    }

    pub fn port(mut self, port: u16) -> Self {
        self.current().port = port;
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.current().jwt_secret = secret.into();
        self
    }

    pub fn require_auth(mut self, require: bool) -> Self {
        self.current().require_auth = require;
        self
    }

    pub fn default_language(mut self, code: impl Into<String>) -> Self {
        self.current().default_language = code.into();
        self
    }

    pub fn priority(mut self, priority: PriorityConfig) -> Self {
        self.current().priority = priority;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.current().sweep_interval = interval;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.current().idle_timeout = timeout;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.current().cache_ttl = ttl;
        self
    }

    pub fn outbound_queue(mut self, depth: usize) -> Self {
        self.current().outbound_queue = depth;
        self
    }

    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.current().send_timeout = timeout;
        self
    }

    pub fn recent_capacity(mut self, capacity: usize) -> Self {
        self.current().recent_capacity = capacity;
        self
    }

    pub fn ingest_queue(mut self, depth: usize) -> Self {
        self.current().ingest_queue = depth;
        self
    }

    /// Apply settings from a TOML document
    pub fn toml(mut self, source: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(source)?;
        let config = self.current();
        if let Some(port) = file.port {
            config.port = port;
        }
        if let Some(secret) = file.jwt_secret {
            config.jwt_secret = secret;
        }
        if let Some(require) = file.require_auth {
            config.require_auth = require;
        }
        if let Some(language) = file.default_language {
            config.default_language = language;
        }
        if let Some(capacity) = file.recent_capacity {
            config.recent_capacity = capacity;
        }
        if let Some(priority) = file.priority {
            let bonus = priority.bonus.unwrap_or(config.priority.bonus);
            let languages = match priority.languages {
                Some(languages) => languages,
                None => config.priority.languages.iter().cloned().collect(),
            };
            config.priority = PriorityConfig::new(languages, bonus);
        }
        Ok(self)
    }

    /// Apply settings from a TOML file on disk
    pub fn file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.toml(&source)
    }

    /// Apply `SERVER_PORT`, `JWT_SECRET`, `HUB_REQUIRE_AUTH` and
    /// `HUB_PRIORITY_LANGUAGES` from the environment
    pub fn env(mut self) -> Result<Self, ConfigError> {
        let config = self.current();
        if let Ok(port) = std::env::var("SERVER_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SERVER_PORT",
                value: port.clone(),
            })?;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.jwt_secret = secret;
        }
        if let Ok(require) = std::env::var("HUB_REQUIRE_AUTH") {
            config.require_auth = match require.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "HUB_REQUIRE_AUTH",
                        value: require,
                    })
                }
            };
        }
        if let Ok(languages) = std::env::var("HUB_PRIORITY_LANGUAGES") {
            let bonus = config.priority.bonus;
            config.priority = PriorityConfig::new(languages.split(','), bonus);
        }
        Ok(self)
    }

    /// Build and validate the configuration
    pub fn build(mut self) -> Result<HubConfig, ConfigError> {
        let config = self.current().clone();
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
