//! Runtime configuration read from the environment
use crate::error::ConfigError;
use crate::report::ExistenceStrategy;
use std::collections::HashMap;
use std::path::PathBuf;

const KEYS: [&str; 5] = [
    "FOUND_REPORT_DB",
    "FOUND_REPORT_UPLOAD_DIR",
    "FOUND_REPORT_PUBLIC_URL",
    "FOUND_REPORT_CODE_PREFIX",
    "FOUND_REPORT_EXISTENCE",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Sled database directory
    pub database_path: PathBuf,
    /// Where photo uploads are written
    pub upload_dir: PathBuf,
    /// Base URL the upload dir is served from
    pub public_url: String,
    /// Codes must start with this prefix when set
    pub expected_prefix: Option<String>,
    pub existence_strategy: ExistenceStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("found-report.db"),
            upload_dir: PathBuf::from("uploads"),
            public_url: "http://localhost:8080/files".to_string(),
            expected_prefix: None,
            existence_strategy: ExistenceStrategy::LatestByQuery,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut envs = HashMap::new();
        for key in KEYS {
            if let Ok(value) = std::env::var(key) {
                envs.insert(key.to_string(), value);
            }
        }
        Self::from_env_map(&envs)
    }

    pub fn from_env_map(envs: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            envs.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let existence_strategy = match get("FOUND_REPORT_EXISTENCE")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("latest") => ExistenceStrategy::LatestByQuery,
            Some("last-report-id") => ExistenceStrategy::LastReportId,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "FOUND_REPORT_EXISTENCE",
                    value: other.to_string(),
                    expected: "one of: latest, last-report-id",
                });
            }
        };

        let public_url = get("FOUND_REPORT_PUBLIC_URL").unwrap_or(defaults.public_url);
        if !(public_url.starts_with("http://") || public_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "FOUND_REPORT_PUBLIC_URL",
                value: public_url,
                expected: "an http:// or https:// URL",
            });
        }

        Ok(Self {
            database_path: get("FOUND_REPORT_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            upload_dir: get("FOUND_REPORT_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_url,
            expected_prefix: get("FOUND_REPORT_CODE_PREFIX").map(|p| p.to_uppercase()),
            existence_strategy,
        })
    }
}
