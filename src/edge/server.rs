use super::{
    EdgeState,
    gate::{self, EdgeRequest, GateDecision},
    health, proxy, revalidate,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, debug, info, info_span};
use ulid::Ulid;

/// Build the edge router: local routes, the upstream fallback, and the gate in
/// front of all of them.
pub fn router(state: Arc<EdgeState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/revalidate", post(revalidate::revalidate))
        .fallback(proxy::forward)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state))
                .layer(middleware::from_fn(gate_requests)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn serve(port: u16, state: Arc<EdgeState>) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

async fn gate_requests(
    Extension(state): Extension<Arc<EdgeState>>,
    request: Request,
    next: Next,
) -> Response {
    let edge_request = EdgeRequest::from_parts(request.uri(), request.headers());
    match gate::evaluate(&edge_request, state.gate()) {
        GateDecision::Pass => next.run(request).await,
        GateDecision::Redirect {
            status,
            location,
            set_cookie,
        } => {
            debug!(%status, location = %location, "Gate redirect");
            let mut response = status.into_response();
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&location) {
                headers.insert(header::LOCATION, value);
            }
            if let Some(cookie) = set_cookie.and_then(|cookie| HeaderValue::from_str(&cookie).ok())
            {
                headers.insert(header::SET_COOKIE, cookie);
            }
            response
        }
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
