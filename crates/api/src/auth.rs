//! Request authentication.
//!
//! Identity resolution lives upstream of this service; requests arrive with
//! the caller's id already in the `x-user-id` header. The extractor rejects
//! anything missing or malformed, so handlers always see a valid [`UserId`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated user, resolved from the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .map(|uuid| AuthUser(UserId::from_uuid(uuid)))
            .ok_or_else(ApiError::unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<AuthUser, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("x-user-id", value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header_resolves_user() {
        let uuid = Uuid::new_v4();
        let user = extract(Some(&uuid.to_string())).await.unwrap();
        assert_eq!(user.0.as_uuid(), uuid);
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        assert!(extract(None).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_header_is_rejected() {
        assert!(extract(Some("not-a-uuid")).await.is_err());
    }
}
