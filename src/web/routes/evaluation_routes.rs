use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;
use tracing::info;

use crate::db::entities::evaluation_tag;
use crate::db::models::EvaluationWithTags;
use crate::db::services::{evaluation_service, evaluation_tag_service};
use crate::intake::{self, data_store::InspecData, inspec::StatusCounts};
use crate::web::models::evaluation_models::{CreateEvaluation, UpdateEvaluation};
use crate::web::models::{EvaluationSummary, ProfileInfo};
use crate::web::{AppError, AppState};

pub fn create_evaluation_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_evaluations).post(create_evaluation))
        .route(
            "/{id}",
            get(get_evaluation).put(update_evaluation).delete(delete_evaluation),
        )
        .route("/{id}/evaluation-tags", get(list_evaluation_tags))
        .route("/{id}/summary", get(get_evaluation_summary))
}

async fn list_evaluations(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<EvaluationWithTags>>, AppError> {
    let evaluations = evaluation_service::find_all(&app_state.db_pool).await?;
    Ok(Json(evaluations))
}

async fn create_evaluation(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateEvaluation>,
) -> Result<(StatusCode, Json<EvaluationWithTags>), AppError> {
    let created = evaluation_service::create(&app_state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_evaluation(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<EvaluationWithTags>, AppError> {
    let evaluation = evaluation_service::find_by_id(&app_state.db_pool, id).await?;
    Ok(Json(evaluation))
}

async fn update_evaluation(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateEvaluation>,
) -> Result<Json<EvaluationWithTags>, AppError> {
    let updated = evaluation_service::update(&app_state.db_pool, id, payload).await?;
    Ok(Json(updated))
}

async fn delete_evaluation(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<EvaluationWithTags>, AppError> {
    let removed = evaluation_service::remove(&app_state.db_pool, id).await?;
    info!(evaluation_id = id, "Evaluation deleted via API.");
    Ok(Json(removed))
}

async fn list_evaluation_tags(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<evaluation_tag::Model>>, AppError> {
    // 404 for unknown evaluations rather than an empty list
    let evaluation = evaluation_service::find_by_id(&app_state.db_pool, id).await?;
    let tags = evaluation_tag_service::find_all_for_evaluation(&app_state.db_pool, evaluation.id()).await?;
    Ok(Json(tags))
}

async fn get_evaluation_summary(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<EvaluationSummary>, AppError> {
    let evaluation = evaluation_service::find_by_id(&app_state.db_pool, id).await?;
    let filename = format!("evaluation-{id}.json");
    let file = intake::load_execution(&filename, evaluation.evaluation.data)?;

    let inspec_version = file.evaluation.version.clone();
    let platform = format!("{}{}", file.evaluation.platform.name, file.evaluation.platform.release);
    let duration = file.evaluation.statistics.duration;

    let mut store = InspecData::new();
    store.add_execution(file);

    let profiles = store
        .contextual_profiles()
        .into_iter()
        .map(|profile| ProfileInfo {
            name: profile.data.name.clone(),
            title: profile.data.title.clone(),
            version: profile.data.version.clone(),
            maintainer: profile.data.maintainer.clone(),
            summary: profile.data.summary.clone(),
            sha256: profile.data.sha256.clone(),
        })
        .collect();

    Ok(Json(EvaluationSummary {
        evaluation_id: id,
        inspec_version,
        platform,
        duration,
        profiles,
        status_counts: StatusCounts::from_controls(store.contextual_controls()),
    }))
}
