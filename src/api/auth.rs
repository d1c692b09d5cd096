//! Shared-secret authentication and CORS
//!
//! Every request except a preflight must carry `Authorization: Bearer <key>`
//! matching the configured key exactly. CORS headers go on every response,
//! errors included, so browser clients can read the body.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::http::AppState;
use crate::error::Error;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Validate an Authorization header against the configured key.
/// Fails closed: a missing header or any difference is rejected.
pub fn check_auth(auth_header: Option<&str>, api_key: &str) -> bool {
    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => !api_key.is_empty() && token == api_key,
        None => false,
    }
}

/// Check authorization
fn authorize(headers: &HeaderMap, api_key: &str) -> bool {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    check_auth(auth_header, api_key)
}

/// Add the CORS headers to a response
pub fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

/// Gate in front of every route: preflight, then authentication
pub async fn gate(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return with_cors(StatusCode::NO_CONTENT.into_response());
    }

    if !authorize(request.headers(), &state.api_key) {
        tracing::warn!("Rejected unauthenticated {} {}", request.method(), request.uri().path());
        return with_cors(Error::Unauthorized.into_response());
    }

    with_cors(next.run(request).await)
}
