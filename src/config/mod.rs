//! Configuration layer: typed settings with layered precedence (file → env).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "brezza";

const DEFAULT_STORAGE_ROOT: &str = "brezza-data";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_SSG_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_SSR_TTL_SECS: u64 = 60 * 60;
const DEFAULT_EVENT_MEMORY_LIMIT: usize = 1000;
const DEFAULT_EVENT_PERSIST_LIMIT: usize = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;

/// Fully-resolved engine settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageSettings,
    pub cache: CacheSettings,
    pub security: SecuritySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Root directory of the durable file medium.
    pub root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// TTL for the generic `cache:` namespace.
    pub default_ttl: Duration,
    /// TTL for precomputed (`ssg:`) artifacts.
    pub ssg_ttl: Duration,
    /// TTL for on-demand (`ssr:`) artifacts.
    pub ssr_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct SecuritySettings {
    /// Events retained in memory; oldest evicted beyond this.
    pub memory_event_limit: usize,
    /// Events persisted to durable storage; intentionally smaller than the
    /// memory cap to bound the persisted payload.
    pub persisted_event_limit: usize,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub window: Duration,
    pub max_requests: u32,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (files, then environment
/// with the `BREZZA__` prefix, then an optional explicit file).
pub fn load(config_file: Option<&Path>) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("BREZZA").separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_raw(RawSettings::default())
            .unwrap_or_else(|_| unreachable!("defaults always validate"))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    storage: RawStorageSettings,
    cache: RawCacheSettings,
    security: RawSecuritySettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    default_ttl_seconds: Option<u64>,
    ssg_ttl_seconds: Option<u64>,
    ssr_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSecuritySettings {
    memory_event_limit: Option<usize>,
    persisted_event_limit: Option<usize>,
    rate_limit_window_seconds: Option<u64>,
    rate_limit_max_requests: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            storage,
            cache,
            security,
            logging,
        } = raw;

        Ok(Self {
            storage: build_storage_settings(storage),
            cache: build_cache_settings(cache)?,
            security: build_security_settings(security)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_storage_settings(storage: RawStorageSettings) -> StorageSettings {
    StorageSettings {
        root: storage
            .root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT)),
    }
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let default_ttl = ttl_seconds(
        cache.default_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
        "cache.default_ttl_seconds",
    )?;
    let ssg_ttl = ttl_seconds(
        cache.ssg_ttl_seconds.unwrap_or(DEFAULT_SSG_TTL_SECS),
        "cache.ssg_ttl_seconds",
    )?;
    let ssr_ttl = ttl_seconds(
        cache.ssr_ttl_seconds.unwrap_or(DEFAULT_SSR_TTL_SECS),
        "cache.ssr_ttl_seconds",
    )?;

    Ok(CacheSettings {
        default_ttl,
        ssg_ttl,
        ssr_ttl,
    })
}

fn build_security_settings(security: RawSecuritySettings) -> Result<SecuritySettings, LoadError> {
    let memory_event_limit = security
        .memory_event_limit
        .unwrap_or(DEFAULT_EVENT_MEMORY_LIMIT);
    if memory_event_limit == 0 {
        return Err(LoadError::invalid(
            "security.memory_event_limit",
            "must be greater than zero",
        ));
    }

    let persisted_event_limit = security
        .persisted_event_limit
        .unwrap_or(DEFAULT_EVENT_PERSIST_LIMIT);
    if persisted_event_limit == 0 {
        return Err(LoadError::invalid(
            "security.persisted_event_limit",
            "must be greater than zero",
        ));
    }
    if persisted_event_limit > memory_event_limit {
        return Err(LoadError::invalid(
            "security.persisted_event_limit",
            "must not exceed the in-memory limit",
        ));
    }

    let window = ttl_seconds(
        security
            .rate_limit_window_seconds
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        "security.rate_limit_window_seconds",
    )?;

    let max_requests = security
        .rate_limit_max_requests
        .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS);
    if max_requests == 0 {
        return Err(LoadError::invalid(
            "security.rate_limit_max_requests",
            "must be greater than zero",
        ));
    }

    Ok(SecuritySettings {
        memory_event_limit,
        persisted_event_limit,
        rate_limit: RateLimitSettings {
            window,
            max_requests,
        },
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn ttl_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve() {
        let settings = Settings::default();
        assert_eq!(settings.storage.root, PathBuf::from("brezza-data"));
        assert_eq!(settings.cache.default_ttl, Duration::from_secs(300));
        assert_eq!(settings.cache.ssg_ttl, Duration::from_secs(86400));
        assert_eq!(settings.cache.ssr_ttl, Duration::from_secs(3600));
        assert_eq!(settings.security.memory_event_limit, 1000);
        assert_eq!(settings.security.persisted_event_limit, 100);
        assert_eq!(settings.security.rate_limit.max_requests, 100);
        assert_eq!(
            settings.security.rate_limit.window,
            Duration::from_secs(60)
        );
        assert_eq!(settings.logging.level, LevelFilter::INFO);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let raw = RawSettings {
            cache: RawCacheSettings {
                ssg_ttl_seconds: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key, .. }) if key == "cache.ssg_ttl_seconds"
        ));
    }

    #[test]
    fn persisted_limit_must_not_exceed_memory_limit() {
        let raw = RawSettings {
            security: RawSecuritySettings {
                memory_event_limit: Some(10),
                persisted_event_limit: Some(50),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key, .. }) if key == "security.persisted_event_limit"
        ));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let raw = RawSettings {
            logging: RawLoggingSettings {
                level: Some("verbose".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key, .. }) if key == "logging.level"
        ));
    }

    #[test]
    fn json_toggle_selects_format() {
        let raw = RawSettings {
            logging: RawLoggingSettings {
                json: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        let settings = Settings::from_raw(raw).unwrap();
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }
}
