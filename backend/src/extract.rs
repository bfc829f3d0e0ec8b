//! Request extractors that turn every malformed input into a 422.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use items_shared::{ListItemsQuery, Validate};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// JSON body that has been deserialized and passed [`Validate`].
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::invalid("body", rejection.body_text()))?;
        value.validate().map_err(ApiError::Validation)?;
        Ok(ValidJson(value))
    }
}

/// The `{item_id}` path segment.
#[derive(Debug, Clone, Copy)]
pub struct ItemId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for ItemId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| {
                ApiError::invalid("item_id", rejection.body_text())
            })?;
        Ok(ItemId(id))
    }
}

/// Resolved `skip`/`limit` for `GET /items`, with `limit` capped at the
/// configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: i64,
    pub limit: i64,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Pagination {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<ListItemsQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                ApiError::invalid("query", rejection.body_text())
            })?;
        let (skip, limit) = query.resolve().map_err(ApiError::Validation)?;
        Ok(Pagination {
            skip,
            limit: limit.min(state.max_list_limit),
        })
    }
}
