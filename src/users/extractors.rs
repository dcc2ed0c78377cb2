use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use bytes::Bytes;
use mongodb::bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ApiError;

/// `{id}` path segment parsed as a 24-character hex ObjectId.
pub struct ObjectIdPath(pub ObjectId);

#[async_trait]
impl<S> FromRequestParts<S> for ObjectIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest("Invalid ID"))?;

        ObjectId::parse_str(&raw).map(ObjectIdPath).map_err(|_| {
            warn!(id = %raw, "invalid object id");
            ApiError::BadRequest("Invalid ID")
        })
    }
}

/// JSON body decoded regardless of `Content-Type`; any failure is a 400.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "failed to read request body");
            ApiError::BadRequest("Invalid input")
        })?;

        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            warn!(error = %e, "malformed json body");
            ApiError::BadRequest("Invalid input")
        })
    }
}
