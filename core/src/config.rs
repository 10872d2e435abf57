//! Configuration management

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server information
    pub server: ServerConfig,
    /// Listener and per-connection settings
    pub connection: ConnectionConfig,
    /// Security settings
    pub security: SecurityConfig,
    /// Idle timeouts
    pub timeouts: TimeoutConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name, used as the prefix of every numeric reply
    pub name: String,
    /// Server description
    pub description: String,
    /// Server version
    pub version: String,
    /// Creation date shown in the welcome burst; start time when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Address to bind to
    pub bind_address: String,
    /// Listening port
    pub port: u16,
    /// Largest unterminated line a connection may hold, in bytes
    pub max_line_buffer: usize,
}

/// Security configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Connection password every client must send with PASS
    pub password: String,
}

/// Idle timeout configuration, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Idle window before registration completes
    pub unregistered_secs: u64,
    /// Idle window for registered connections
    pub registered_secs: u64,
    /// How often the transport runs the timeout sweep
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "irc.chanrelay.local".to_string(),
            description: "chanrelay chat relay".to_string(),
            version: format!("chanrelay-{}", env!("CARGO_PKG_VERSION")),
            created: None,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 6667,
            max_line_buffer: 8192,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            password: "changeme".to_string(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            unregistered_secs: 30,
            registered_secs: 300,
            sweep_interval_secs: 10,
        }
    }
}

impl TimeoutConfig {
    pub fn unregistered(&self) -> Duration {
        Duration::from_secs(self.unregistered_secs)
    }

    pub fn registered(&self) -> Duration {
        Duration::from_secs(self.registered_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.name.is_empty() || self.server.name.contains(' ') {
            return Err(Error::Config("Server name must be a single non-empty word".to_string()));
        }

        if self.connection.port < 1024 {
            return Err(Error::Config(format!(
                "Port {} is out of range (1024-65535)",
                self.connection.port
            )));
        }

        if self.security.password.is_empty() {
            return Err(Error::Config("Password cannot be empty".to_string()));
        }

        if self.security.password.chars().any(|c| c.is_whitespace()) {
            return Err(Error::Config("Password cannot contain spaces".to_string()));
        }

        if self.timeouts.unregistered_secs == 0
            || self.timeouts.registered_secs == 0
            || self.timeouts.sweep_interval_secs == 0
        {
            return Err(Error::Config("Timeouts must be greater than 0".to_string()));
        }

        if self.connection.max_line_buffer < 512 {
            return Err(Error::Config("max_line_buffer must be at least 512 bytes".to_string()));
        }

        Ok(())
    }
}
