use crate::ClientError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_USER_AGENT: &str = "Amora-Client/0.1";

/// Connection settings for [`crate::ProfileClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root; endpoint paths are appended to it.
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build an endpoint URL by appending path segments to the base URL.
    /// Each segment is percent-encoded, so ids cannot escape their segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments() {
        let config = ClientConfig::with_base_url("https://api.example.com/api");
        let url = config.endpoint(&["profile", "me"]).expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/api/profile/me");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let config = ClientConfig::with_base_url("https://api.example.com/api/");
        let url = config.endpoint(&["username"]).expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/api/username");
    }

    #[test]
    fn endpoint_encodes_ids() {
        let config = ClientConfig::with_base_url("https://api.example.com");
        let url = config.endpoint(&["users", "a/b c"]).expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/users/a%2Fb%20c");
    }

    #[test]
    fn endpoint_rejects_bad_base() {
        let config = ClientConfig::with_base_url("not a url");
        assert!(matches!(
            config.endpoint(&["profile", "me"]),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://x.test"}"#).expect("parse");
        assert_eq!(config.base_url, "https://x.test");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
