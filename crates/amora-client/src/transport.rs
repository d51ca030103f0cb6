use crate::credentials::{CredentialStore, AUTH_TOKEN_KEY};
use crate::ClientError;
use amora_models::ApiResponse;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Default request headers, with a bearer token when one is stored.
pub fn build_headers(credentials: &dyn CredentialStore) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    // Blank tokens count as signed out; others are sent exactly as stored.
    let token = credentials
        .get(AUTH_TOKEN_KEY)
        .filter(|token| !token.trim().is_empty());
    if let Some(token) = token {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("Stored auth token is not a valid header value, sending without it"),
        }
    }
    headers
}

/// A non-2xx response, decoded without assuming the body is JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub status: StatusCode,
    /// Parsed JSON body, or `{ "message": <raw text> }`.
    pub detail: Value,
}

impl ErrorReport {
    pub async fn read(resp: Response) -> Self {
        let status = resp.status();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Failed to read error body for {}: {}", status, e);
                String::new()
            }
        };
        Self::from_body(status, &text)
    }

    pub fn from_body(status: StatusCode, text: &str) -> Self {
        let detail = serde_json::from_str(text).unwrap_or_else(|_| json!({ "message": text }));
        Self { status, detail }
    }

    /// Backend-provided message, or one synthesized from the status line.
    pub fn message(&self) -> String {
        self.detail
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "API error: {} {}",
                    self.status.as_u16(),
                    self.status.canonical_reason().unwrap_or_default()
                )
                .trim_end()
                .to_string()
            })
    }

    pub fn into_response<T>(self) -> ApiResponse<T> {
        let message = self.message();
        ApiResponse::failure(message, Some(self.detail))
    }
}

/// Shared response handling for the id-based profile reads.
///
/// Success bodies may arrive already wrapped in an envelope or as the bare
/// payload; both become an [`ApiResponse`]. Non-2xx statuses become a failure
/// envelope. Only body read and decode errors are returned as `Err`.
pub async fn handle_response<T: DeserializeOwned>(
    resp: Response,
) -> Result<ApiResponse<T>, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let report = ErrorReport::read(resp).await;
        tracing::debug!("Request failed with {}: {}", status, report.message());
        return Ok(report.into_response());
    }

    let body: Value = resp.json().await?;
    decode_body(body)
}

fn decode_body<T: DeserializeOwned>(body: Value) -> Result<ApiResponse<T>, ClientError> {
    let is_envelope = matches!(body.get("success"), Some(Value::Bool(_)));
    if is_envelope {
        return serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()));
    }
    let data = serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok(ApiResponse::ok(data))
}
