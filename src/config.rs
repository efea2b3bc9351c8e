//! Runtime configuration read from the environment.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;
use crate::session::SessionTiming;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_POLL_MS: &str = "250";
const DEFAULT_COUNTDOWN: &str = "3";
const DEFAULT_TIMEOUT_SECS: &str = "10";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub token_file: PathBuf,
    pub log_file: Option<PathBuf>,
    pub poll_interval: Duration,
    pub countdown: u32,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from `VOCAZOO_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("VOCAZOO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token_file = lookup("VOCAZOO_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_token_file(lookup("HOME")));
        let log_file = lookup("VOCAZOO_LOG_FILE").map(PathBuf::from);

        let poll_ms: u64 = try_load(&lookup, "VOCAZOO_POLL_MS", DEFAULT_POLL_MS)?;
        if poll_ms == 0 {
            return Err(invalid("VOCAZOO_POLL_MS", "0", "must be positive"));
        }
        let countdown: u32 = try_load(&lookup, "VOCAZOO_COUNTDOWN", DEFAULT_COUNTDOWN)?;
        if countdown == 0 {
            return Err(invalid("VOCAZOO_COUNTDOWN", "0", "must be at least 1"));
        }
        let timeout_secs: u64 = try_load(&lookup, "VOCAZOO_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            api_url,
            token_file,
            log_file,
            poll_interval: Duration::from_millis(poll_ms),
            countdown,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Session timers derived from this configuration.
    pub fn timing(&self) -> SessionTiming {
        SessionTiming {
            countdown: self.countdown,
            poll_interval: self.poll_interval,
            ..SessionTiming::default()
        }
    }
}

fn default_token_file(home: Option<String>) -> PathBuf {
    let base = home.map(PathBuf::from).unwrap_or_default();
    base.join(".vocazoo").join("token")
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, &raw, &e.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("HOME", "/home/mina")])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.token_file, PathBuf::from("/home/mina/.vocazoo/token"));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.countdown, 3);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("VOCAZOO_API_URL", "https://vocazoo.co.kr"),
            ("VOCAZOO_TOKEN_FILE", "/tmp/token"),
            ("VOCAZOO_POLL_MS", "100"),
            ("VOCAZOO_COUNTDOWN", "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://vocazoo.co.kr");
        assert_eq!(config.token_file, PathBuf::from("/tmp/token"));
        assert_eq!(config.timing().poll_interval, Duration::from_millis(100));
        assert_eq!(config.timing().countdown, 5);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[("VOCAZOO_POLL_MS", "fast")])).unwrap_err();
        assert!(err.to_string().contains("VOCAZOO_POLL_MS"));

        assert!(Config::from_lookup(lookup(&[("VOCAZOO_POLL_MS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("VOCAZOO_COUNTDOWN", "0")])).is_err());
    }
}
