//! Error types for the query service.
//!
//! [`ApiError`] can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The body
//! is always the standard [`ApiResponse`] envelope with `success: false`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::response::ApiResponse;

/// Client-visible request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The `X-API-KEY` header was missing or did not match.
    #[error("Invalid or missing X-API-KEY header")]
    Unauthorized,

    /// The route exists but only accepts `GET`.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// No route matched the request path.
    #[error("Not found")]
    NotFound,
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        (self.status(), Json(ApiResponse::failure(&message))).into_response()
    }
}
