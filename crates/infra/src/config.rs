//! Environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::resilience::CircuitBreakerConfig;

/// Process-level configuration, read from `STOCKTRAIL_*` environment
/// variables. Missing or malformed values fall back to defaults with a
/// warning.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Storage root; events live under `events/`, read models under
    /// `read_models/`.
    pub data_dir: PathBuf,
    pub cache_ttl: Duration,
    pub cache_max_size: usize,
    pub breaker_failure_threshold: u32,
    pub breaker_timeout: Duration,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_ttl: Duration::from_secs(30),
            cache_max_size: 1000,
            breaker_failure_threshold: 5,
            breaker_timeout: Duration::from_secs(60),
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("STOCKTRAIL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            cache_ttl: Duration::from_secs(env_parse(
                "STOCKTRAIL_CACHE_TTL_SECONDS",
                defaults.cache_ttl.as_secs(),
            )),
            cache_max_size: env_parse("STOCKTRAIL_CACHE_MAX_SIZE", defaults.cache_max_size),
            breaker_failure_threshold: env_parse(
                "STOCKTRAIL_BREAKER_FAILURE_THRESHOLD",
                defaults.breaker_failure_threshold,
            ),
            breaker_timeout: Duration::from_secs(env_parse(
                "STOCKTRAIL_BREAKER_TIMEOUT_SECONDS",
                defaults.breaker_timeout.as_secs(),
            )),
            bind_addr: std::env::var("STOCKTRAIL_BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }

    pub fn events_dir(&self) -> PathBuf {
        self.data_dir.join("events")
    }

    pub fn read_models_dir(&self) -> PathBuf {
        self.data_dir.join("read_models")
    }

    /// Breaker settings for calls to outbound dependencies.
    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.breaker_failure_threshold,
            timeout: self.breaker_timeout,
        }
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, raw = %raw, "unparseable env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.cache_ttl, Duration::from_secs(30));
        assert_eq!(cfg.cache_max_size, 1000);
        assert_eq!(cfg.breaker_failure_threshold, 5);
        assert_eq!(cfg.events_dir(), PathBuf::from("data/events"));
        assert_eq!(cfg.read_models_dir(), PathBuf::from("data/read_models"));
    }

    #[test]
    fn breaker_config_mirrors_the_breaker_fields() {
        let cfg = AppConfig::default();
        let breaker = cfg.breaker_config();
        assert_eq!(breaker.failure_threshold, 5);
        assert_eq!(breaker.timeout, Duration::from_secs(60));
    }
}
