use crate::config::ClientConfig;
use crate::credentials::{CredentialStore, AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::payload::clean_payload;
use crate::transport::{build_headers, handle_response, ErrorReport};
use crate::ClientError;
use amora_models::{ApiResponse, UserProfile};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

const FETCH_PROFILE_FALLBACK: &str = "Failed to fetch profile";
const SET_USERNAME_FALLBACK: &str = "Failed to set username";
const EDIT_PROFILE_FALLBACK: &str = "Failed to update profile";
const USER_PROFILE_FALLBACK: &str = "Failed to fetch user profile";
const USERNAME_SET_MESSAGE: &str = "Username set successfully";
const PROFILE_UPDATED_MESSAGE: &str = "Profile updated successfully";

/// HTTP client for the profile endpoints of the API.
///
/// Every call is an independent request/response round trip; the only state
/// shared between calls is the injected credential store. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    http: Client,
    config: ClientConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl ProfileClient {
    pub fn new(
        config: ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ClientError> {
        // Validate the base URL up front rather than on the first call.
        config.endpoint(&[])?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Fetch the signed-in user's profile from `GET /profile/me`.
    ///
    /// A 401 also clears the stored auth and refresh tokens.
    pub async fn fetch_own_profile(&self) -> ApiResponse<UserProfile> {
        match self.try_fetch_own_profile().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Profile fetch failed: {}", e);
                ApiResponse::failure(failure_message(&e, FETCH_PROFILE_FALLBACK), None)
            }
        }
    }

    async fn try_fetch_own_profile(&self) -> Result<ApiResponse<UserProfile>, ClientError> {
        let url = self.config.endpoint(&["profile", "me"])?;
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .headers(build_headers(self.credentials.as_ref()))
            .send()
            .await?;

        if !resp.status().is_success() {
            let report = ErrorReport::read(resp).await;
            if report.status == StatusCode::UNAUTHORIZED {
                self.clear_session();
            }
            return Ok(report.into_response());
        }

        // The backend sends the user as a flat object.
        let body: Value = resp.json().await?;
        let profile =
            UserProfile::from_backend(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(ApiResponse::ok(profile))
    }

    /// Claim a username via `POST /username`. Validation is left to the backend.
    pub async fn set_username(&self, username: &str) -> ApiResponse<()> {
        let body = json!({ "username": username });
        match self
            .post_for_message(&["username"], &body, USERNAME_SET_MESSAGE)
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Username update failed: {}", e);
                ApiResponse::failure(failure_message(&e, SET_USERNAME_FALLBACK), None)
            }
        }
    }

    /// Send a partial profile to `POST /profile/edit`.
    ///
    /// Null fields and empty nested objects are stripped from the body first.
    pub async fn edit_profile<P: Serialize + ?Sized>(&self, update: &P) -> ApiResponse<()> {
        let result = match clean_payload(update) {
            Ok(body) => {
                self.post_for_message(&["profile", "edit"], &body, PROFILE_UPDATED_MESSAGE)
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Profile update failed: {}", e);
                ApiResponse::failure(failure_message(&e, EDIT_PROFILE_FALLBACK), None)
            }
        }
    }

    /// Fetch another user via `GET /users/{id}`.
    ///
    /// Unlike the other calls, transport failures are returned as `Err` for
    /// the caller to handle.
    pub async fn get_user_by_id(
        &self,
        user_id: &str,
    ) -> Result<ApiResponse<UserProfile>, ClientError> {
        let url = self.config.endpoint(&["users", user_id])?;
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .headers(build_headers(self.credentials.as_ref()))
            .send()
            .await?;
        handle_response(resp).await
    }

    /// Fetch another user's profile via `GET /profile/{id}`.
    pub async fn get_user_profile(&self, user_id: &str) -> ApiResponse<UserProfile> {
        match self.try_get_user_profile(user_id).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("User profile fetch for {} failed: {}", user_id, e);
                ApiResponse::failure(failure_message(&e, USER_PROFILE_FALLBACK), None)
            }
        }
    }

    async fn try_get_user_profile(
        &self,
        user_id: &str,
    ) -> Result<ApiResponse<UserProfile>, ClientError> {
        let url = self.config.endpoint(&["profile", user_id])?;
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .headers(build_headers(self.credentials.as_ref()))
            .send()
            .await?;
        handle_response(resp).await
    }

    /// POST a JSON body to an endpoint that answers with an optional `message`.
    async fn post_for_message<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
        default_message: &str,
    ) -> Result<ApiResponse<()>, ClientError> {
        let url = self.config.endpoint(segments)?;
        tracing::debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .headers(build_headers(self.credentials.as_ref()))
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Ok(ErrorReport::read(resp).await.into_response());
        }

        let body: Value = resp.json().await?;
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or(default_message);
        Ok(ApiResponse::done(message))
    }

    fn clear_session(&self) {
        tracing::warn!("Session rejected by the API, clearing stored tokens");
        self.credentials.remove(AUTH_TOKEN_KEY);
        self.credentials.remove(REFRESH_TOKEN_KEY);
    }
}

/// User-facing text for a failed call: the underlying error's own message,
/// without the variant prefix, or `fallback` when that message is blank.
fn failure_message(err: &ClientError, fallback: &str) -> String {
    let message = match err {
        ClientError::Http(e) => e.to_string(),
        ClientError::Decode(message)
        | ClientError::InvalidPayload(message)
        | ClientError::InvalidBaseUrl(message) => message.clone(),
    };
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
