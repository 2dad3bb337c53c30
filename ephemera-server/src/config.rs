//! Server configuration options.

use std::path::PathBuf;
use std::time::Duration;

use ephemera_core::StoreConfig;

/// Settings for the HTTP front end, read from the environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public origin used to build share addresses
    pub base_url: String,
    /// Directory uploaded files are written to
    pub upload_dir: PathBuf,
    pub sweep_interval: Duration,
    pub default_ttl: Duration,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_url: "http://127.0.0.1:3000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            sweep_interval: Duration::from_secs(300),
            default_ttl: Duration::from_secs(3600),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl ServerConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `EPHEMERA_HOST` - Bind address (defaults to "127.0.0.1")
    /// - `EPHEMERA_PORT` - Bind port (defaults to 3000)
    /// - `EPHEMERA_BASE_URL` - Public origin (defaults to "http://{host}:{port}")
    /// - `EPHEMERA_UPLOAD_DIR` - Upload directory (defaults to "uploads")
    /// - `EPHEMERA_SWEEP_INTERVAL` - Seconds between sweeps (defaults to 300)
    /// - `EPHEMERA_DEFAULT_TTL` - Default TTL in seconds (defaults to 3600)
    /// - `EPHEMERA_MAX_UPLOAD_BYTES` - Request body limit (defaults to 25 MiB)
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let host = lookup("EPHEMERA_HOST").unwrap_or(defaults.host);
        let port = parse_or(lookup("EPHEMERA_PORT"), defaults.port);
        let base_url = lookup("EPHEMERA_BASE_URL").unwrap_or_else(|| format!("http://{}:{}", host, port));

        Self {
            host,
            port,
            base_url,
            upload_dir: lookup("EPHEMERA_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            sweep_interval: Duration::from_secs(parse_or(
                lookup("EPHEMERA_SWEEP_INTERVAL"),
                defaults.sweep_interval.as_secs(),
            )),
            default_ttl: Duration::from_secs(parse_or(
                lookup("EPHEMERA_DEFAULT_TTL"),
                defaults.default_ttl.as_secs(),
            )),
            max_upload_bytes: parse_or(lookup("EPHEMERA_MAX_UPLOAD_BYTES"), defaults.max_upload_bytes),
        }
    }

    /// Store settings derived from this configuration
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_default_ttl(self.default_ttl)
            .with_sweep_interval(self.sweep_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_values_from_environment() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("EPHEMERA_HOST", "0.0.0.0"),
            ("EPHEMERA_PORT", "8080"),
            ("EPHEMERA_UPLOAD_DIR", "/var/lib/ephemera"),
            ("EPHEMERA_DEFAULT_TTL", "60"),
        ]));
        assert_eq!(config.base_url, "http://0.0.0.0:8080");
        assert_eq!(config.upload_dir, PathBuf::from("/var/lib/ephemera"));
        assert_eq!(config.store_config().default_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("EPHEMERA_PORT", "8080"),
            ("EPHEMERA_BASE_URL", "https://sho.rt"),
        ]));
        assert_eq!(config.base_url, "https://sho.rt");
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("EPHEMERA_PORT", "eighty"),
            ("EPHEMERA_SWEEP_INTERVAL", "-5"),
        ]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }
}
