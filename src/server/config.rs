//! Server configuration types
//!
//! Contains all configuration structures for the Inkboard server.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use inkboard_realtime::RealtimeSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// SQLite connection pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://inkboard.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// WebSocket connection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub max_message_size_kb: usize,
    pub heartbeat_interval_secs: u64,
    pub heartbeat_timeout_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_message_size_kb: 1024,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 60,
        }
    }
}

impl RealtimeConfig {
    /// Convert to the settings the realtime core consumes
    pub fn settings(&self) -> RealtimeSettings {
        RealtimeSettings {
            max_message_size: self.max_message_size_kb.saturating_mul(1024),
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs.max(1)),
            heartbeat_timeout: Duration::from_secs(self.heartbeat_timeout_secs.max(1)),
        }
    }
}

/// Credential seed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub users: Vec<SeedUser>,
}

/// A user whose bearer token is accepted without an issuing service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub id: String,
    pub email: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_settings_conversion() {
        let config = RealtimeConfig {
            max_message_size_kb: 2,
            heartbeat_interval_secs: 0,
            heartbeat_timeout_secs: 90,
        };
        let settings = config.settings();
        assert_eq!(settings.max_message_size, 2048);
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(1));
        assert_eq!(settings.heartbeat_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_save_writes_toml() {
        let dir = std::env::temp_dir().join(format!("inkboard-config-{}", std::process::id()));
        let path = dir.join("saved.toml");

        let mut config = AppConfig::default();
        config.server.port = 9100;
        config.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.server.port, 9100);
        assert!(parsed.auth.users.is_empty());

        fs::remove_dir_all(dir).ok();
    }
}
