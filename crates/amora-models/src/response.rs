use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single client call.
///
/// Failures are reported here instead of as `Err`, so callers branch on
/// [`ApiResponse::success`] and read `message`/`error` for details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Raw error payload from the backend, or `{ "message": <body> }` when the
    /// body was not JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Success without a payload, carrying a confirmation message.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: Option<Value>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
