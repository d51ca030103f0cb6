pub mod client;
pub mod config;
pub mod credentials;
pub mod payload;
pub mod transport;

pub use client::ProfileClient;
pub use config::ClientConfig;
pub use credentials::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore,
    AUTH_TOKEN_KEY, DEFAULT_KEYRING_SERVICE, REFRESH_TOKEN_KEY,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}
