//! Client-facing failure taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthFailure;
use crate::proxy::ForwardingFailure;

/// Every way a dispatched request can fail before a downstream response exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("no route matches the request path")]
    RouteNotFound,

    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error(transparent)]
    Forwarding(#[from] ForwardingFailure),

    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,

    #[error("request body could not be read")]
    InvalidBody,
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::RouteNotFound => StatusCode::NOT_FOUND,
            DispatchError::Auth(_) => StatusCode::UNAUTHORIZED,
            DispatchError::Forwarding(ForwardingFailure::DownstreamUnavailable) => {
                StatusCode::BAD_GATEWAY
            }
            DispatchError::Forwarding(ForwardingFailure::DownstreamTimeout) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            DispatchError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::InvalidBody => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable code, e.g. `auth_expired`.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::RouteNotFound => "route_not_found",
            DispatchError::Auth(failure) => failure.code(),
            DispatchError::Forwarding(failure) => failure.code(),
            DispatchError::PayloadTooLarge => "payload_too_large",
            DispatchError::InvalidBody => "invalid_body",
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
