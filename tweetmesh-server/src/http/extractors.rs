//! Custom Axum extractors

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::txn::SessionToken;

/// Extract a session token from the path.
///
/// A token that does not parse can never have been issued, so it is
/// rejected as an unknown session (404) rather than a malformed request.
pub struct ValidSessionToken(pub SessionToken);

impl<S> FromRequestParts<S> for ValidSessionToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound {
                resource: "session",
                id: String::new(),
            })?;

        let token = raw.parse().map_err(|_| ApiError::NotFound {
            resource: "session",
            id: raw.clone(),
        })?;

        Ok(Self(token))
    }
}

/// `Path` whose rejection renders as a JSON 400
pub struct ValidPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest {
                message: rejection.body_text(),
            })?;
        Ok(Self(value))
    }
}

/// `Json` whose rejection renders as a JSON 400
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) =
            Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest {
                    message: rejection.body_text(),
                })?;
        Ok(Self(value))
    }
}
