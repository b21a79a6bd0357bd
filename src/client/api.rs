//! Bearer-token JSON client. Every feature client goes through
//! [`ApiClient::request`], which attaches the stored access token, classifies
//! failures into [`ApiError`] and performs at most one silent refresh per call
//! when the backend answers `401`.

use super::{config::ClientConfig, errors::ApiError, token::TokenStore};
use crate::APP_USER_AGENT;
use reqwest::{Client, Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, info_span, warn};
use url::Url;

/// Endpoint used to exchange the refresh token for a new access token.
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Method and optional JSON body of a request.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    method: Method,
    body: Option<Value>,
}

impl RequestOptions {
    #[must_use]
    pub const fn get() -> Self {
        Self {
            method: Method::GET,
            body: None,
        }
    }

    #[must_use]
    pub const fn delete() -> Self {
        Self {
            method: Method::DELETE,
            body: None,
        }
    }

    /// POST without a body, e.g. resend verification.
    #[must_use]
    pub const fn post_empty() -> Self {
        Self {
            method: Method::POST,
            body: None,
        }
    }

    /// # Errors
    /// Returns `ApiError::Encode` if the body cannot be serialized.
    pub fn post<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::with_json(Method::POST, body)
    }

    /// # Errors
    /// Returns `ApiError::Encode` if the body cannot be serialized.
    pub fn put<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::with_json(Method::PUT, body)
    }

    fn with_json<B: Serialize + ?Sized>(method: Method, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body).map_err(|err| ApiError::Encode(err.to_string()))?;
        Ok(Self {
            method,
            body: Some(body),
        })
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Shared request executor. Build it once and hand out `Arc<ApiClient>` so every
/// feature client sees the same [`TokenStore`].
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    tokens: Arc<TokenStore>,
    // Concurrent 401s wait here instead of each refreshing on their own.
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// # Errors
    /// Returns `ApiError::Config` if the base URL is not an absolute http(s) URL
    /// or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_tokens(config, Arc::new(TokenStore::new()))
    }

    /// Builds a client around an existing token store, e.g. one restored at startup.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the base URL is not an absolute http(s) URL
    /// or the HTTP client cannot be built.
    pub fn with_tokens(config: ClientConfig, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        check_base_url(&config.base_url)?;
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            config,
            tokens,
            refresh_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn tokens(&self) -> Arc<TokenStore> {
        Arc::clone(&self.tokens)
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn set_tokens(&self, access: impl Into<String>, refresh: impl Into<String>) {
        self.tokens.set_tokens(access, refresh);
    }

    pub fn clear_tokens(&self) {
        self.tokens.clear();
    }

    /// Executes a request and decodes a successful body as `T`. Empty bodies
    /// decode as JSON `null`, so `()` works for endpoints without content.
    ///
    /// # Errors
    /// - `ApiError::NotFound` on `404`.
    /// - `ApiError::Request` on any other non-success status, including a `401`
    ///   that survived the refresh-and-retry.
    /// - Transport variants (`Timeout`, `Network`, `Decode`, `Config`).
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let span = info_span!("api.request", http.method = %options.method, path);

        async move {
            let access = self.tokens.access_token();
            let response = self.send(path, &options, access.as_ref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED || self.tokens.refresh_token().is_none()
            {
                return decode(response).await;
            }

            let original = response.bytes().await.map_err(transport_error)?;
            if let Err(err) = self.refresh(access.as_ref()).await {
                warn!("Token refresh failed, clearing session: {err}");
                self.tokens.clear();
                return Err(ApiError::from_response(StatusCode::UNAUTHORIZED, &original));
            }

            debug!("retrying after token refresh");
            let access = self.tokens.access_token();
            let retried = self.send(path, &options, access.as_ref()).await?;
            decode(retried).await
        }
        .instrument(span)
        .await
    }

    /// Exchanges the refresh token for a new access token. `stale` is the access
    /// token the failed request carried; if another caller already rotated it
    /// while this one waited for the lock, no second refresh is sent.
    async fn refresh(&self, stale: Option<&SecretString>) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        if rotated(stale, self.tokens.access_token().as_ref()) {
            debug!("access token already refreshed by a concurrent request");
            return Ok(());
        }

        let refresh = self.tokens.refresh_token().ok_or_else(|| {
            ApiError::from_response(StatusCode::UNAUTHORIZED, b"")
        })?;
        let options = RequestOptions::post(&RefreshRequest {
            refresh_token: refresh.expose_secret(),
        })?;

        let response = self
            .send(REFRESH_PATH, &options, None)
            .instrument(info_span!("api.refresh"))
            .await?;
        let tokens: RefreshResponse = decode(response).await?;
        self.tokens
            .replace_access(tokens.access_token, tokens.refresh_token);

        Ok(())
    }

    async fn send(
        &self,
        path: &str,
        options: &RequestOptions,
        access: Option<&SecretString>,
    ) -> Result<Response, ApiError> {
        let url = self.config.url_for(path);
        let mut builder = self.http.request(options.method.clone(), &url);

        if let Some(token) = access {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(transport_error)
    }
}

fn check_base_url(base_url: &str) -> Result<(), ApiError> {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Err(ApiError::Config("API base URL is not set".to_string()));
    }
    let parsed = Url::parse(base_url)
        .map_err(|err| ApiError::Config(format!("Invalid API base URL {base_url}: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::Config(format!(
            "API base URL must use http or https: {base_url}"
        )));
    }
    Ok(())
}

fn rotated(stale: Option<&SecretString>, current: Option<&SecretString>) -> bool {
    match (stale, current) {
        (Some(stale), Some(current)) => stale.expose_secret() != current.expose_secret(),
        (None, Some(_)) => true,
        (_, None) => false,
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(ApiError::from_response(status, &bytes));
    }

    let payload: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    serde_json::from_slice(payload).map_err(|err| ApiError::Decode(err.to_string()))
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_builder() {
        ApiError::Config(format!("Failed to build request: {err}"))
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}
