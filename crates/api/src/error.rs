//! API error type with HTTP response mapping.
//!
//! Every error leaves the service in the same envelope:
//!
//! ```json
//! { "statusCode": 400, "message": "cart empty", "error": "Bad Request" }
//! ```
//!
//! Validation failures carry one message per rejected field, as an array.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use commerce_store::StoreError;
use domain::CommerceError;

/// Wraps [`CommerceError`] so handlers can surface it with `?`.
#[derive(Debug)]
pub struct ApiError(CommerceError);

impl ApiError {
    /// Rejection for requests without a well-formed `x-user-id` header.
    pub fn unauthorized() -> Self {
        ApiError(CommerceError::Unauthorized)
    }
}

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        ApiError(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(CommerceError::Store(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CommerceError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, serde_json::json!(self.0.to_string()))
            }
            // Clients receive field messages individually, not joined.
            CommerceError::Validation { messages } => {
                (StatusCode::BAD_REQUEST, serde_json::json!(messages))
            }
            CommerceError::Store(err) => {
                tracing::error!(error = %err, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!("Internal server error"),
                )
            }
            _ => (StatusCode::BAD_REQUEST, serde_json::json!(self.0.to_string())),
        };

        let body = serde_json::json!({
            "statusCode": status.as_u16(),
            "message": message,
            "error": status.canonical_reason().unwrap_or("Unknown"),
        });
        (status, axum::Json(body)).into_response()
    }
}
