use amora_client::{ClientConfig, DEFAULT_KEYRING_SERVICE};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CREDENTIALS_PATH: &str = ".amora/credentials.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ClientConfig,
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// Operating system keychain.
    #[default]
    Keyring,
    /// Owner-only JSON file at `path`.
    File,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub backend: CredentialBackend,
    /// Keychain service name for the keyring backend.
    pub service: String,
    pub path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            backend: CredentialBackend::default(),
            service: DEFAULT_KEYRING_SERVICE.to_string(),
            path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
        }
    }
}

impl Config {
    /// Load the TOML config at `path`. A missing file yields the defaults;
    /// `AMORA_*` environment variables are applied on top.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            Self::parse(&contents)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        } else {
            tracing::debug!("Config file {:?} not found, using defaults", path);
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("AMORA_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.api.base_url = base_url;
            }
        }
        if let Ok(path) = std::env::var("AMORA_CREDENTIALS_PATH") {
            if !path.trim().is_empty() {
                self.credentials.path = PathBuf::from(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "https://api.example.com/api"
            "#,
        )
        .expect("parse");
        assert_eq!(config.api.base_url, "https://api.example.com/api");
        assert_eq!(config.api.timeout_secs, ClientConfig::default().timeout_secs);
        assert_eq!(config.credentials.path, PathBuf::from(DEFAULT_CREDENTIALS_PATH));
        assert_eq!(config.credentials.backend, CredentialBackend::Keyring);
        assert_eq!(config.credentials.service, DEFAULT_KEYRING_SERVICE);
    }

    #[test]
    fn selects_file_backend() {
        let config = Config::parse(
            r#"
            [credentials]
            backend = "file"
            path = "/tmp/amora.json"
            "#,
        )
        .expect("parse");
        assert_eq!(config.credentials.backend, CredentialBackend::File);
        assert_eq!(config.credentials.path, PathBuf::from("/tmp/amora.json"));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(Config::parse("[api]\ntimeout_secs = \"soon\"").is_err());
        assert!(Config::parse("[credentials]\nbackend = \"vault\"").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config.credentials.path, PathBuf::from(DEFAULT_CREDENTIALS_PATH));
    }
}
