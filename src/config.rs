//! Client configuration from environment variables

use crate::state::{SessionConfig, DEFAULT_WRITING_SECONDS};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:3000/ws";
pub const DEFAULT_TICK_MS: u64 = 1000;
pub const DEFAULT_PREFS_PATH: &str = ".icontale/prefs.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint of the game server
    pub server_url: String,
    /// Length of the writing phase, must match the server
    pub writing_seconds: u32,
    pub tick: Duration,
    /// Where the avatar preference is kept
    pub prefs_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            writing_seconds: DEFAULT_WRITING_SECONDS,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            prefs_path: PathBuf::from(DEFAULT_PREFS_PATH),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse a positive number, falling back to `default` with a warning
fn env_positive<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default + std::fmt::Display + Copy,
{
    let Some(raw) = env_string(key) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(v) if v > T::default() => v,
        _ => {
            tracing::warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }
    }
}

impl ClientConfig {
    /// Load config from environment variables
    ///
    /// - `ICONTALE_SERVER_URL`
    /// - `ICONTALE_WRITING_SECONDS` (default 180)
    /// - `ICONTALE_TICK_MS` (default 1000)
    /// - `ICONTALE_PREFS_PATH`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_url = env_string("ICONTALE_SERVER_URL").unwrap_or(defaults.server_url);
        if !server_url.starts_with("ws://") && !server_url.starts_with("wss://") {
            tracing::warn!("Server URL {} is not a ws:// or wss:// address", server_url);
        }

        Self {
            server_url,
            writing_seconds: env_positive("ICONTALE_WRITING_SECONDS", DEFAULT_WRITING_SECONDS),
            tick: Duration::from_millis(env_positive("ICONTALE_TICK_MS", DEFAULT_TICK_MS)),
            prefs_path: env_string("ICONTALE_PREFS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.prefs_path),
        }
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            writing_seconds: self.writing_seconds,
        }
    }
}
