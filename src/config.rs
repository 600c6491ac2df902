//! Configuration Management
//!
//! Handles persistent configuration storage for the oneview client.
//! Precedence is command line, then `ONEVIEW_*` environment variables, then
//! the config file, then built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::activity::{PollPolicy, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};
use crate::appliance::auth::DEFAULT_LOGIN_DOMAIN;
use crate::appliance::http::HttpSettings;

pub const ENV_HOST: &str = "ONEVIEW_HOST";
pub const ENV_USER: &str = "ONEVIEW_USER";
pub const ENV_DOMAIN: &str = "ONEVIEW_DOMAIN";
pub const ENV_PROXY: &str = "ONEVIEW_PROXY";

pub const DEFAULT_USER: &str = "Administrator";
pub const DEFAULT_API_VERSION: u32 = 200;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Appliance hostname or IP address
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    /// Login domain
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub api_version: Option<u32>,
    /// `host:port`
    #[serde(default)]
    pub proxy: Option<String>,
    /// Trusted certificate bundle in PEM format
    #[serde(default)]
    pub ca_bundle: Option<PathBuf>,
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("oneview").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`; a missing or unreadable file gives the defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Overlay the `ONEVIEW_*` environment variables
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = lookup(ENV_HOST) {
            self.host = Some(host);
        }
        if let Some(user) = lookup(ENV_USER) {
            self.user = Some(user);
        }
        if let Some(domain) = lookup(ENV_DOMAIN) {
            self.domain = Some(domain);
        }
        if let Some(proxy) = lookup(ENV_PROXY) {
            self.proxy = Some(proxy);
        }
        self
    }

    pub fn effective_host(&self) -> Result<&str> {
        self.host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .with_context(|| format!("No appliance host: pass -a or set {}", ENV_HOST))
    }

    pub fn effective_user(&self) -> &str {
        self.user.as_deref().unwrap_or(DEFAULT_USER)
    }

    /// Login domain, upper-cased the way the appliance stores it
    pub fn effective_domain(&self) -> String {
        self.domain
            .as_deref()
            .unwrap_or(DEFAULT_LOGIN_DOMAIN)
            .to_uppercase()
    }

    pub fn effective_api_version(&self) -> u32 {
        self.api_version.unwrap_or(DEFAULT_API_VERSION)
    }

    /// Poll policy every facade call waits with
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.poll_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            self.poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_INTERVAL),
        )
    }

    pub fn http_settings(&self) -> Result<HttpSettings> {
        let mut settings = HttpSettings::new(self.effective_host()?);
        settings.api_version = self.effective_api_version();
        settings.proxy = self.proxy.clone();
        settings.ca_bundle = self.ca_bundle.clone();
        settings.insecure = self.insecure;
        Ok(settings)
    }

    /// Remember the appliance and user for the next run
    pub fn set_host(&mut self, host: &str, user: &str) -> Result<()> {
        self.host = Some(host.to_string());
        self.user = Some(user.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.effective_host().is_err());
        assert_eq!(config.effective_user(), "Administrator");
        assert_eq!(config.effective_domain(), "LOCAL");
        assert_eq!(config.effective_api_version(), 200);
        assert_eq!(config.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            host: Some("oneview.example.com".to_string()),
            domain: Some("corp".to_string()),
            poll_timeout_secs: Some(120),
            poll_interval_secs: Some(5),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.effective_domain(), "CORP");
        assert_eq!(loaded.poll_policy(), PollPolicy::from_secs(120, 5));
    }

    #[test]
    fn test_missing_or_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("absent.json")), Config::default());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"host": "10.0.0.5", "insecure": true}"#).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.effective_host().unwrap(), "10.0.0.5");
        assert!(config.insecure);
        assert!(config.user.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            (ENV_HOST, "env-host"),
            (ENV_DOMAIN, "ad"),
            (ENV_PROXY, " "),
        ]
        .into_iter()
        .collect();

        let config = Config {
            host: Some("file-host".to_string()),
            user: Some("file-user".to_string()),
            proxy: Some("proxy:8080".to_string()),
            ..Default::default()
        }
        .with_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.effective_host().unwrap(), "env-host");
        assert_eq!(config.effective_user(), "file-user");
        assert_eq!(config.effective_domain(), "AD");
        // blank variables are ignored
        assert_eq!(config.proxy.as_deref(), Some("proxy:8080"));
    }

    #[test]
    fn test_http_settings() {
        let config = Config {
            host: Some("10.0.0.5".to_string()),
            api_version: Some(300),
            insecure: true,
            ..Default::default()
        };
        let settings = config.http_settings().unwrap();
        assert_eq!(settings.host, "10.0.0.5");
        assert_eq!(settings.api_version, 300);
        assert!(settings.insecure);
        assert!(settings.proxy.is_none());
    }
}
