// Configuration module entry point
// Loads application configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Environment variable prefix, e.g. `HOOKED_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "HOOKED";

impl Config {
    /// Load configuration from "config.toml" (optional) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 60)?
            .set_default("performance.read_timeout", 15)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.max_body_size", 25_600)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Per-request timeout: the longer of the read and write timeouts
    pub fn request_timeout_secs(&self) -> u64 {
        self.performance
            .read_timeout
            .max(self.performance.write_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_from("does-not-exist").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.workers, None);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.access_log);
        assert_eq!(config.logging.access_log_format, "combined");
        assert_eq!(config.logging.access_log_file, None);
        assert_eq!(config.performance.keep_alive_timeout, 60);
        assert_eq!(config.performance.read_timeout, 15);
        assert_eq!(config.performance.write_timeout, 30);
        assert_eq!(config.performance.max_connections, None);
        assert_eq!(config.http.max_body_size, 25_600);
        assert_eq!(config.request_timeout_secs(), 30);
    }

    #[test]
    fn test_socket_addr() {
        let mut config = Config::load_from("does-not-exist").unwrap();
        assert_eq!(
            config.get_socket_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );

        config.server.host = "not a host".to_string();
        assert!(config.get_socket_addr().is_err());
    }
}
