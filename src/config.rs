//! Environment-driven configuration.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. Blank values fall back to defaults; unparsable values are errors.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::notifications::DEFAULT_CAPACITY;
use crate::transport::ReconnectPolicy;

pub const ENV_BIND: &str = "COOPWATCH_BIND";
pub const ENV_PUSH_URL: &str = "COOPWATCH_PUSH_URL";
pub const ENV_MAX_NOTIFICATIONS: &str = "COOPWATCH_MAX_NOTIFICATIONS";
pub const ENV_RECONNECT: &str = "COOPWATCH_RECONNECT";
pub const ENV_RECONNECT_MAX_ATTEMPTS: &str = "COOPWATCH_RECONNECT_MAX_ATTEMPTS";

const DEFAULT_BIND: &str = "127.0.0.1:3001";
const DEFAULT_PUSH_URL: &str = "ws://127.0.0.1:3001/ws";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the push server listens on.
    pub bind_addr: SocketAddr,
    /// Push source the drawer client connects to.
    pub push_url: String,
    pub max_notifications: usize,
    pub reconnect: ReconnectPolicy,
}

impl Config {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("failed to load .env file: {e}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr: SocketAddr = parse_or(ENV_BIND, get(ENV_BIND), DEFAULT_BIND.parse().ok())?;

        let push_url = get(ENV_PUSH_URL).unwrap_or_else(|| DEFAULT_PUSH_URL.to_string());
        if !(push_url.starts_with("ws://") || push_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidValue {
                key: ENV_PUSH_URL,
                value: push_url,
                reason: "expected a ws:// or wss:// url".to_string(),
            });
        }

        let max_notifications: usize = parse_or(
            ENV_MAX_NOTIFICATIONS,
            get(ENV_MAX_NOTIFICATIONS),
            Some(DEFAULT_CAPACITY),
        )?;
        if max_notifications == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_MAX_NOTIFICATIONS,
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let mut reconnect = ReconnectPolicy::default();
        if let Some(raw) = get(ENV_RECONNECT) {
            reconnect.enabled = parse_flag(ENV_RECONNECT, &raw)?;
        }
        reconnect.max_attempts = parse_or(
            ENV_RECONNECT_MAX_ATTEMPTS,
            get(ENV_RECONNECT_MAX_ATTEMPTS),
            Some(reconnect.max_attempts),
        )?;

        Ok(Self {
            bind_addr,
            push_url,
            max_notifications,
            reconnect,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            push_url: DEFAULT_PUSH_URL.to_string(),
            max_notifications: DEFAULT_CAPACITY,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match (raw, default) {
        (Some(raw), _) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
            value: raw,
        }),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(ConfigError::InvalidValue {
            key,
            value: String::new(),
            reason: "missing value".to_string(),
        }),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        let default = Config::default();
        assert_eq!(config.bind_addr, default.bind_addr);
        assert_eq!(config.push_url, "ws://127.0.0.1:3001/ws");
        assert_eq!(config.max_notifications, 200);
        assert_eq!(config.reconnect, ReconnectPolicy::default());
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = config_from(&[(ENV_BIND, "  "), (ENV_MAX_NOTIFICATIONS, "")]).unwrap();
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.max_notifications, 200);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (ENV_BIND, "0.0.0.0:9000"),
            (ENV_PUSH_URL, "ws://farm.local:9000/ws"),
            (ENV_MAX_NOTIFICATIONS, "50"),
            (ENV_RECONNECT, "off"),
            (ENV_RECONNECT_MAX_ATTEMPTS, "3"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.push_url, "ws://farm.local:9000/ws");
        assert_eq!(config.max_notifications, 50);
        assert!(!config.reconnect.enabled);
        assert_eq!(config.reconnect.max_attempts, 3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = config_from(&[(ENV_MAX_NOTIFICATIONS, "lots")]).unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_NOTIFICATIONS));

        assert!(config_from(&[(ENV_MAX_NOTIFICATIONS, "0")]).is_err());
        assert!(config_from(&[(ENV_PUSH_URL, "http://farm.local/ws")]).is_err());
        assert!(config_from(&[(ENV_RECONNECT, "maybe")]).is_err());
        assert!(config_from(&[(ENV_BIND, "not-an-addr")]).is_err());
    }
}
