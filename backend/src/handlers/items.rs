use axum::{http::StatusCode, Json};
use items_shared::{CreateItemRequest, Item, UpdateItemRequest};
use tracing::{info, instrument};

use crate::db::DbSession;
use crate::error::ApiError;
use crate::extract::{ItemId, Pagination, ValidJson};
use crate::repository;

#[instrument(name = "handler::create_item", skip_all)]
pub async fn create_item(
    session: DbSession,
    ValidJson(input): ValidJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = session
        .run(move |conn| repository::create_item(conn, input))
        .await?;
    info!(item_id = item.id, "Item created");
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[instrument(name = "handler::list_items", skip(session))]
pub async fn list_items(
    pagination: Pagination,
    session: DbSession,
) -> Result<Json<Vec<Item>>, ApiError> {
    let Pagination { skip, limit } = pagination;
    let items = session
        .run(move |conn| repository::list_items(conn, skip, limit))
        .await?;
    Ok(Json(items.into_iter().map(Item::from).collect()))
}

#[instrument(name = "handler::get_item", skip(session))]
pub async fn get_item(ItemId(id): ItemId, session: DbSession) -> Result<Json<Item>, ApiError> {
    session
        .run(move |conn| repository::get_item(conn, id))
        .await?
        .map(|item| Json(item.into()))
        .ok_or(ApiError::NotFound)
}

#[instrument(name = "handler::update_item", skip(session, patch))]
pub async fn update_item(
    ItemId(id): ItemId,
    session: DbSession,
    ValidJson(patch): ValidJson<UpdateItemRequest>,
) -> Result<Json<Item>, ApiError> {
    let item = session
        .run(move |conn| repository::update_item(conn, id, patch))
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(item_id = item.id, "Item updated");
    Ok(Json(item.into()))
}

#[instrument(name = "handler::delete_item", skip(session))]
pub async fn delete_item(ItemId(id): ItemId, session: DbSession) -> Result<StatusCode, ApiError> {
    let deleted = session
        .run(move |conn| repository::delete_item(conn, id))
        .await?;
    if !deleted {
        return Err(ApiError::NotFound);
    }
    info!(item_id = id, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}
