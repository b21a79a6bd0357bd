//! `POST /api/revalidate`: lets the CMS invalidate rendered pages by path.

use super::EdgeState;
use anyhow::Result;
use axum::{
    Extension,
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const MAX_PATHS: usize = 50;

/// Invalidates cached output for one path.
pub trait Revalidate: Send + Sync {
    fn revalidate(&self, path: &str) -> Result<()>;
}

/// Records revalidation requests in the log only.
#[derive(Clone, Debug)]
pub struct LogRevalidator;

impl Revalidate for LogRevalidator {
    fn revalidate(&self, path: &str) -> Result<()> {
        info!(path, "Revalidation requested");
        Ok(())
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// axum handler for revalidation
pub async fn revalidate(Extension(state): Extension<Arc<EdgeState>>, body: Bytes) -> Response {
    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
    };

    let authorized = match (
        payload.get("secret").and_then(Value::as_str),
        state.revalidation_secret(),
    ) {
        (Some(given), Some(expected)) => given == expected,
        _ => false,
    };
    if !authorized {
        warn!("Revalidation rejected: invalid secret");
        return error_response(StatusCode::UNAUTHORIZED, "Invalid secret");
    }

    let Some(paths) = payload
        .get("paths")
        .and_then(Value::as_array)
        .filter(|paths| (1..=MAX_PATHS).contains(&paths.len()))
        .and_then(|paths| paths.iter().map(Value::as_str).collect::<Option<Vec<_>>>())
    else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "paths must be an array of 1-50 strings",
        );
    };

    for path in paths {
        if let Err(err) = state.revalidator().revalidate(path) {
            error!(path, "Revalidation failed: {err:#}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Revalidation failed");
        }
    }

    Json(json!({ "revalidated": true })).into_response()
}
