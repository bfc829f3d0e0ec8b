use axum::Json;
use items_shared::HealthResponse;

use crate::db::DbSession;
use crate::error::ApiError;
use crate::repository;

/// Liveness plus a round trip to the database.
pub async fn health(session: DbSession) -> Result<Json<HealthResponse>, ApiError> {
    let items = session.run(repository::count_items).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        items,
    }))
}
