// Configuration management from environment variables and an optional JSON file

use dotenv::dotenv;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::HealthCheckResult;
use crate::services::ServiceKind;

/// Location of the optional override file when `HCHECK_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "/opt/nc-healthcheck/conf/nc-healthcheck.json";

pub const DEFAULT_DB_URL: &str = "mysql://root:@localhost:3306";
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";
pub const DEFAULT_ES_URL: &str = "127.0.0.1:9200";

/// A remote service declared in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceTarget {
    pub kind: ServiceKind,
    pub url: String,
}

/// Default connection URLs for the checked dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
    pub db_url: String,
    pub redis_url: String,
    pub es_url: String,
    pub services: BTreeMap<String, ServiceTarget>,
}

// Every key is optional so a file may override any subset of the defaults
#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    #[serde(rename = "DB_URL")]
    db_url: Option<String>,
    #[serde(rename = "REDIS_URL")]
    redis_url: Option<String>,
    #[serde(rename = "ES_URL")]
    es_url: Option<String>,
    #[serde(default)]
    services: BTreeMap<String, ServiceTarget>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            es_url: DEFAULT_ES_URL.to_string(),
            services: BTreeMap::new(),
        }
    }
}

impl HealthConfig {
    /// Loads defaults, then overlays the JSON file at `path` if it exists.
    ///
    /// A missing file is not an error. A file that exists but cannot be read
    /// or parsed is.
    pub fn load(path: impl AsRef<Path>) -> HealthCheckResult<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No configuration file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let overrides: ConfigOverrides = serde_json::from_str(&contents)?;
        tracing::info!("Loaded configuration overrides from {}", path.display());
        Ok(Self::default().merge(overrides))
    }

    /// Resolves the file location from `HCHECK_CONFIG` and loads it
    pub fn from_env() -> HealthCheckResult<Self> {
        dotenv().ok();

        let path = env::var("HCHECK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(db_url) = overrides.db_url {
            self.db_url = db_url;
        }
        if let Some(redis_url) = overrides.redis_url {
            self.redis_url = redis_url;
        }
        if let Some(es_url) = overrides.es_url {
            self.es_url = es_url;
        }
        self.services.extend(overrides.services);
        self
    }
}

/// Settings for the demo server binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub user_agent: Option<String>,
}

impl ServerConfig {
    /// Creates configuration instance from environment variables with defaults
    pub fn from_env() -> Self {
        dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .unwrap_or(3000);
        let user_agent = env::var("HCHECK_USER_AGENT").ok();

        Self {
            host,
            port,
            user_agent,
        }
    }

    /// Returns formatted server address string (host:port)
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthCheckError;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HealthConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, HealthConfig::default());
        assert_eq!(config.db_url, DEFAULT_DB_URL);
    }

    #[test]
    fn test_file_overrides_only_given_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let contents = r#"{
            "REDIS_URL": "redis://cache:6379/1",
            "services": {"backend": {"kind": "backend", "url": "http://admin"}}
        }"#;
        write!(file, "{}", contents).unwrap();

        let config = HealthConfig::load(file.path()).unwrap();
        assert_eq!(config.redis_url, "redis://cache:6379/1");
        assert_eq!(config.db_url, DEFAULT_DB_URL);
        assert_eq!(config.es_url, DEFAULT_ES_URL);
        assert_eq!(
            config.services.get("backend"),
            Some(&ServiceTarget {
                kind: ServiceKind::Backend,
                url: "http://admin".to_string(),
            })
        );
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = HealthConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, HealthCheckError::Json(_)));
    }

    #[test]
    fn test_unreadable_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = HealthConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, HealthCheckError::Io(_)));
    }

    #[test]
    fn test_unknown_service_kind_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let contents = r#"{"services": {"x": {"kind": "mainframe", "url": "http://x"}}}"#;
        write!(file, "{}", contents).unwrap();

        let err = HealthConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, HealthCheckError::Json(_)));
    }
}
