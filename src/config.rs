//! Service configuration.
//!
//! Built once at startup, either from environment variables or from a YAML
//! file named by `STOCKIST_CONFIG`, and handed to the adapters and the sync
//! service explicitly.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::error::SyncError;

pub const CONFIG_FILE_VAR: &str = "STOCKIST_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub shopify: ShopifyConfig,
    pub github: GithubConfig,
    /// Country written when a customer's address has none.
    #[serde(default = "default_country")]
    pub default_country: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Applied to every outbound HTTP call.
    #[serde(default = "default_timeout_secs")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyConfig {
    pub store_domain: String,
    pub access_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    pub token: String,
    /// `owner/repo`
    pub repository: String,
    /// Path of the CSV inside the repository.
    pub path: String,
    pub branch: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_country() -> String {
    "Australia".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_api_version() -> String {
    "2023-10".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

impl AppConfig {
    /// Loads from the YAML file in `STOCKIST_CONFIG` when set, otherwise from the environment.
    pub fn from_env() -> Result<Self, SyncError> {
        match std::env::var(CONFIG_FILE_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                info!("Loading configuration from {}", path);
                Self::load(Path::new(&path))
            }
            _ => {
                debug!("Loading configuration from environment");
                Self::from_lookup(|key| std::env::var(key).ok())
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SyncError> {
        let config: AppConfig = serde_yaml::from_str(yaml)
            .map_err(|e| SyncError::Config(format!("invalid YAML configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the configuration from environment-style variables supplied by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| SyncError::Config(format!("{} environment variable is required", key)))
        };
        let optional = |key: &str, default: String| {
            lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or(default)
        };

        let http_timeout_secs = match lookup("HTTP_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.trim().parse::<u64>()
                .map_err(|e| SyncError::Config(format!("HTTP_TIMEOUT_SECS '{}' is not a number: {}", raw, e)))?,
            None => default_timeout_secs(),
        };

        let config = AppConfig {
            shopify: ShopifyConfig {
                store_domain: required("SHOPIFY_STORE_DOMAIN")?,
                access_token: required("SHOPIFY_API_TOKEN")?,
                api_version: optional("SHOPIFY_API_VERSION", default_api_version()),
            },
            github: GithubConfig {
                token: required("GITHUB_TOKEN")?,
                repository: required("CSV_REPO")?,
                path: required("CSV_PATH")?,
                branch: required("CSV_BRANCH")?,
                api_url: optional("GITHUB_API_URL", default_api_url()),
            },
            default_country: optional("DEFAULT_COUNTRY", default_country()),
            listen_addr: optional("LISTEN_ADDR", default_listen_addr()),
            http_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        let non_empty = [
            ("shopify.store_domain", &self.shopify.store_domain),
            ("shopify.access_token", &self.shopify.access_token),
            ("shopify.api_version", &self.shopify.api_version),
            ("github.token", &self.github.token),
            ("github.path", &self.github.path),
            ("github.branch", &self.github.branch),
            ("github.api_url", &self.github.api_url),
        ];
        for (name, value) in non_empty {
            if value.trim().is_empty() {
                return Err(SyncError::Config(format!("{} must not be empty", name)));
            }
        }
        self.github.owner_and_repo()?;
        if self.http_timeout_secs == 0 {
            return Err(SyncError::Config("http_timeout_secs must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl GithubConfig {
    pub fn owner_and_repo(&self) -> Result<(String, String), SyncError> {
        match self.repository.trim().split('/').collect::<Vec<_>>().as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
                Ok((owner.to_string(), repo.to_string()))
            }
            _ => Err(SyncError::Config(format!(
                "repository '{}' must look like owner/repo",
                self.repository
            ))),
        }
    }
}
