use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use std::sync::Arc;

use crate::db::entities::evaluation_tag;
use crate::db::services::evaluation_tag_service;
use crate::web::{AppError, AppState};

// Tags are read-only here; they change through evaluation updates.
pub fn create_evaluation_tag_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{id}", get(get_tag))
}

async fn list_tags(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<evaluation_tag::Model>>, AppError> {
    let tags = evaluation_tag_service::find_all(&app_state.db_pool).await?;
    Ok(Json(tags))
}

async fn get_tag(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<evaluation_tag::Model>, AppError> {
    let tag = evaluation_tag_service::find_by_id(&app_state.db_pool, id).await?;
    Ok(Json(tag))
}
