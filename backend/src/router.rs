use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{health, items};
use crate::AppState;

fn item_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/:item_id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health))
        .merge(item_routes())
        .nest("/api/v1", item_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
