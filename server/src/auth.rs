use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use slateink_shared::USER_ID_HEADER;

use crate::error::ApiError;

/// Identity resolved by the fronting auth layer and forwarded in a
/// header. The API trusts the header; validating the upstream session
/// is the proxy's job, not ours.
pub struct AuthedUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| AuthedUser(value.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}
