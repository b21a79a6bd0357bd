//! Forwards requests the gate let through to the page renderer.

use super::EdgeState;
use crate::APP_USER_AGENT;
use anyhow::{Context, Result};
use axum::{
    Extension,
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error};
use url::Url;

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    header::HOST,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::CONTENT_LENGTH,
];

#[derive(Clone, Debug)]
pub struct Upstream {
    client: reqwest::Client,
    base_url: Url,
}

impl Upstream {
    /// # Errors
    /// Returns an error if the URL is not absolute http(s) or the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid upstream URL: {base_url}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("Upstream URL must use http or https: {base_url}");
        }
        // Redirects from the renderer belong to the browser.
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build upstream client")?;
        Ok(Self { client, base_url })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn target(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(query);
        url
    }

    /// Sends `request` upstream and returns the renderer's answer unchanged,
    /// minus hop-by-hop headers.
    ///
    /// # Errors
    /// Returns an error if the body cannot be read or the renderer cannot be reached.
    pub async fn forward(&self, request: Request) -> Result<Response> {
        let (parts, body) = request.into_parts();
        let url = self.target(parts.uri.path(), parts.uri.query());
        let body = to_bytes(body, MAX_BODY_BYTES)
            .await
            .context("Failed to read request body")?;

        let mut headers = end_to_end(&parts.headers);
        if let Some(host) = parts.headers.get(header::HOST) {
            headers.insert(HeaderName::from_static("x-forwarded-host"), host.clone());
        }

        debug!(method = %parts.method, url = %url, "Forwarding to upstream");
        let upstream = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .context("Upstream request failed")?;

        let status = upstream.status();
        let headers = end_to_end(upstream.headers());
        let body = upstream
            .bytes()
            .await
            .context("Failed to read upstream body")?;

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = headers.clone();
    for name in &HOP_BY_HOP {
        filtered.remove(name);
    }
    filtered.remove("keep-alive");
    filtered
}

// axum fallback handler, every route the edge does not serve itself
pub async fn forward(Extension(state): Extension<Arc<EdgeState>>, request: Request) -> Response {
    match state.upstream().forward(request).await {
        Ok(response) => response,
        Err(err) => {
            error!("Upstream unavailable: {err:#}");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Upstream unavailable" })),
            )
                .into_response()
        }
    }
}
