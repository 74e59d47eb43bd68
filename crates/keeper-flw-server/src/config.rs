// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Admin listener configuration.

use keeper_flw::{KeeperSettings, ServerRole};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// TCP port to listen on (default: 9181)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Time allowed for a client to send its four bytes
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Maximum number of concurrently served connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Role reported by the built-in engine: leader, follower, observer or standalone
    #[serde(default = "default_role")]
    pub role: String,

    /// Report read-only mode from the built-in engine
    #[serde(default)]
    pub read_only: bool,

    /// Coordination server settings, including the four letter word allow list
    #[serde(default)]
    pub keeper: KeeperSettings,
}

fn default_bind_address() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    9181
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

fn default_max_connections() -> usize {
    64
}

fn default_role() -> String {
    "standalone".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            read_timeout_ms: default_read_timeout_ms(),
            max_connections: default_max_connections(),
            role: default_role(),
            read_only: false,
            keeper: KeeperSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Role the built-in engine reports.
    pub fn server_role(&self) -> Result<ServerRole, ConfigError> {
        match self.role.as_str() {
            "leader" => Ok(ServerRole::Leader),
            "follower" => Ok(ServerRole::Follower),
            "observer" => Ok(ServerRole::Observer),
            "standalone" => Ok(ServerRole::Standalone),
            other => Err(ConfigError::InvalidValue(format!("unknown role {:?}", other))),
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "read_timeout_ms cannot be 0".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "max_connections cannot be 0".into(),
            ));
        }
        self.server_role()?;
        if self.keeper.election_timeout_lower_bound_ms > self.keeper.election_timeout_upper_bound_ms
        {
            return Err(ConfigError::InvalidValue(
                "election timeout lower bound exceeds upper bound".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 9181);
        assert_eq!(config.role, "standalone");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flw.json");
        let config = ServerConfig {
            port: 9999,
            keeper: KeeperSettings {
                four_letter_word_white_list: "ruok,mntr".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        config.to_file(&path).unwrap();

        let loaded = ServerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.port, 9999);
        assert_eq!(loaded.keeper.four_letter_word_white_list, "ruok,mntr");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"port": 2182, "keeper": {"server_id": 2}}"#).unwrap();
        assert_eq!(config.port, 2182);
        assert_eq!(config.keeper.server_id, 2);
        assert_eq!(config.read_timeout_ms, 5_000);
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let config = ServerConfig {
            read_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_role() {
        let config = ServerConfig {
            role: "candidate".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_server_role_parsing() {
        let config = ServerConfig {
            role: "leader".into(),
            ..Default::default()
        };
        assert_eq!(config.server_role().unwrap(), ServerRole::Leader);
        assert_eq!(
            ServerConfig::default().server_role().unwrap(),
            ServerRole::Standalone
        );
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ port: ").unwrap();
        assert!(matches!(
            ServerConfig::from_file(&path),
            Err(ConfigError::Json(_))
        ));
    }
}
