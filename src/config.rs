//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::monitor::DEFAULT_STALL_TIMEOUT_SECS;
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
    /// Monitoring configuration
    pub monitoring: MonitoringConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Where the monitor snapshot file lives
    pub state_path: PathBuf,
}

/// Monitoring configuration
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    /// Default heartbeat timeout for stall checks (in seconds)
    pub stall_timeout_secs: f64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            persistence: PersistenceConfig {
                state_path: Self::data_dir().join("monitor_state.json"),
            },
            monitoring: MonitoringConfig {
                stall_timeout_secs: env::var("STALL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(DEFAULT_STALL_TIMEOUT_SECS),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    // DATA_DIR, falling back to ~/.agent-monitor or the current directory
    fn data_dir() -> PathBuf {
        if let Ok(dir) = env::var("DATA_DIR") {
            return PathBuf::from(dir);
        }
        if let Some(home) = env::var_os("HOME") {
            let mut path = PathBuf::from(home);
            path.push(".agent-monitor");
            path
        } else {
            PathBuf::from("data")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        env::remove_var("PORT");
        env::remove_var("HOST");
        env::remove_var("DATA_DIR");
        env::remove_var("STALL_TIMEOUT_SECS");

        let config = Config::from_env();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.monitoring.stall_timeout_secs, 300.0);
        assert!(config
            .persistence
            .state_path
            .ends_with("monitor_state.json"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var("PORT", "9090");
        env::set_var("HOST", "127.0.0.1");
        env::set_var("DATA_DIR", "/tmp/monitor-test");
        env::set_var("STALL_TIMEOUT_SECS", "60");

        let config = Config::from_env();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server_addr(), "127.0.0.1:9090");
        assert_eq!(
            config.persistence.state_path,
            PathBuf::from("/tmp/monitor-test/monitor_state.json")
        );
        assert_eq!(config.monitoring.stall_timeout_secs, 60.0);

        env::remove_var("PORT");
        env::remove_var("HOST");
        env::remove_var("DATA_DIR");
        env::remove_var("STALL_TIMEOUT_SECS");
    }

    #[test]
    #[serial]
    fn test_invalid_port_falls_back_to_default() {
        env::set_var("PORT", "not-a-port");
        let config = Config::from_env();
        assert_eq!(config.server.port, 8080);
        env::remove_var("PORT");
    }
}
