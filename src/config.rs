//! WolfMedia Configuration
//!
//! This module provides configuration structures for the WolfMedia
//! storage gateway.

use serde::{Deserialize, Serialize};

/// Environment variable overriding `auth.api_key`
pub const ENV_API_KEY: &str = "WOLFMEDIA_API_KEY";
/// Environment variable overriding `storage.access_key`
pub const ENV_S3_ACCESS_KEY: &str = "WOLFMEDIA_S3_ACCESS_KEY";
/// Environment variable overriding `storage.secret_key`
pub const ENV_S3_SECRET_KEY: &str = "WOLFMEDIA_S3_SECRET_KEY";

/// Main WolfMedia configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WolfMediaConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Shared credential configuration
    pub auth: AuthConfig,

    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Public base URL objects are served from (CDN or bucket domain)
    pub public_url: String,
}

/// Shared credential configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Bearer token every request must present
    #[serde(default)]
    pub api_key: String,
}

/// Which object store backs the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3-compatible bucket (R2, MinIO, AWS)
    S3,
    /// In-process store, contents are lost on restart
    Memory,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Bucket name
    #[serde(default)]
    pub bucket: String,

    /// Bucket region ("auto" for R2)
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3 endpoint (required for R2 and MinIO)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key ID
    #[serde(default)]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Use path-style bucket addressing
    #[serde(default = "default_true")]
    pub path_style: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8787".to_string()
}

fn default_backend() -> StorageBackend {
    StorageBackend::S3
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WolfMediaConfig {
    /// Load configuration from a TOML file, applying environment overrides
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: WolfMediaConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: WolfMediaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace secrets with values from the environment when present
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_env(ENV_API_KEY) {
            self.auth.api_key = key;
        }
        if let Some(key) = non_empty_env(ENV_S3_ACCESS_KEY) {
            self.storage.access_key = Some(key);
        }
        if let Some(key) = non_empty_env(ENV_S3_SECRET_KEY) {
            self.storage.secret_key = Some(key);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.bind_address.is_empty() {
            return Err(crate::Error::Config("server.bind_address cannot be empty".into()));
        }

        if self.server.public_url.is_empty() {
            return Err(crate::Error::Config("server.public_url cannot be empty".into()));
        }

        if self.auth.api_key.is_empty() {
            return Err(crate::Error::Config(format!(
                "auth.api_key cannot be empty (set it in the file or via {})",
                ENV_API_KEY
            )));
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.bucket.is_empty() {
            return Err(crate::Error::Config("storage.bucket cannot be empty for the s3 backend".into()));
        }

        Ok(())
    }

    /// Public base URL without a trailing slash
    pub fn public_url(&self) -> &str {
        self.server.public_url.trim_end_matches('/')
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[server]
bind_address = "127.0.0.1:8787"
public_url = "https://media.example.com/"

[auth]
api_key = "secret"

[storage]
backend = "s3"
bucket = "media"
endpoint = "https://account.r2.cloudflarestorage.com"
"#;

    #[test]
    fn test_parse_config() {
        let config = WolfMediaConfig::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8787");
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.region, "auto");
        assert!(config.storage.path_style);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.public_url(), "https://media.example.com");
    }

    #[test]
    fn test_memory_backend_needs_no_bucket() {
        let toml = r#"
[server]
public_url = "http://localhost:8787/media"

[auth]
api_key = "secret"

[storage]
backend = "memory"
"#;
        let config = WolfMediaConfig::from_str(toml).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.server.bind_address, "0.0.0.0:8787");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let toml = SAMPLE.replace("api_key = \"secret\"", "api_key = \"\"");
        let err = WolfMediaConfig::from_str(&toml).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let toml = SAMPLE.replace("bucket = \"media\"", "");
        assert!(WolfMediaConfig::from_str(&toml).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = WolfMediaConfig::from_file(file.path()).unwrap();
        assert_eq!(config.storage.bucket, "media");
    }
}
