use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::infra::http::headers::{apply_cors_preflight, apply_response_headers};

/// Wrap already-serialized JSON-RPC text in a 200 reply.
pub fn rpc_body(body: String) -> Response {
    let mut resp = (StatusCode::OK, body).into_response();
    apply_response_headers(resp.headers_mut());
    resp
}

/// Transport-level failure: plain HTTP 500, no JSON-RPC envelope.
pub fn internal_error(message: &'static str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}

pub fn no_content_preflight() -> Response {
    let mut resp = StatusCode::NO_CONTENT.into_response();
    apply_cors_preflight(resp.headers_mut());
    resp
}
