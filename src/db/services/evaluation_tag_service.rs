//! Data access for evaluation tags.
//!
//! Every function is generic over `ConnectionTrait` so the evaluation service can
//! run them inside its transaction. Tags are only written as part of an
//! evaluation create/update/remove; the public surface for callers is read-only.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::db::entities::{evaluation_tag, prelude::*};
use crate::db::reconcile::{NewTag, TagChangeSet, TagPatch};
use crate::db::services::evaluation_service::EvaluationError;

pub async fn find_all<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<evaluation_tag::Model>, EvaluationError> {
    Ok(EvaluationTag::find()
        .order_by_asc(evaluation_tag::Column::Id)
        .all(db)
        .await?)
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    tag_id: i32,
) -> Result<evaluation_tag::Model, EvaluationError> {
    EvaluationTag::find_by_id(tag_id)
        .one(db)
        .await?
        .ok_or(EvaluationError::TagNotFound(tag_id))
}

/// All tags owned by one evaluation, ordered by id.
pub async fn find_all_for_evaluation<C: ConnectionTrait>(
    db: &C,
    evaluation_id: i32,
) -> Result<Vec<evaluation_tag::Model>, EvaluationError> {
    Ok(EvaluationTag::find()
        .filter(evaluation_tag::Column::EvaluationId.eq(evaluation_id))
        .order_by_asc(evaluation_tag::Column::Id)
        .all(db)
        .await?)
}

pub async fn create_many<C: ConnectionTrait>(
    db: &C,
    evaluation_id: i32,
    tags: Vec<NewTag>,
) -> Result<(), EvaluationError> {
    if tags.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let rows = tags.into_iter().map(|tag| evaluation_tag::ActiveModel {
        key: Set(tag.key),
        value: Set(tag.value),
        evaluation_id: Set(evaluation_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    });
    EvaluationTag::insert_many(rows).exec(db).await?;
    Ok(())
}

/// Applies a patch to an already loaded tag. `updated_at` always advances,
/// `created_at` is left alone.
pub async fn update_by_id<C: ConnectionTrait>(
    db: &C,
    existing: evaluation_tag::Model,
    patch: TagPatch,
) -> Result<evaluation_tag::Model, EvaluationError> {
    let mut active_tag: evaluation_tag::ActiveModel = existing.into();
    if let Some(key) = patch.key {
        active_tag.key = Set(key);
    }
    if let Some(value) = patch.value {
        active_tag.value = Set(value);
    }
    active_tag.updated_at = Set(Utc::now());

    Ok(active_tag.update(db).await?)
}

/// Deletes the given tags, restricted to those owned by `evaluation_id`.
pub async fn delete_by_ids<C: ConnectionTrait>(
    db: &C,
    evaluation_id: i32,
    tag_ids: &[i32],
) -> Result<u64, EvaluationError> {
    if tag_ids.is_empty() {
        return Ok(0);
    }

    let result = EvaluationTag::delete_many()
        .filter(evaluation_tag::Column::EvaluationId.eq(evaluation_id))
        .filter(evaluation_tag::Column::Id.is_in(tag_ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Deletes every tag of an evaluation.
pub async fn delete_all_for_evaluation<C: ConnectionTrait>(
    db: &C,
    evaluation_id: i32,
) -> Result<u64, EvaluationError> {
    let result = EvaluationTag::delete_many()
        .filter(evaluation_tag::Column::EvaluationId.eq(evaluation_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Writes a planned change set. `existing` must be the rows the plan was computed from.
pub async fn apply_changes<C: ConnectionTrait>(
    db: &C,
    evaluation_id: i32,
    existing: Vec<evaluation_tag::Model>,
    changes: TagChangeSet,
) -> Result<(), EvaluationError> {
    debug!(
        evaluation_id,
        created = changes.to_create.len(),
        updated = changes.to_update.len(),
        deleted = changes.to_delete.len(),
        "Applying evaluation tag changes."
    );

    for patch in changes.to_update {
        let current = existing
            .iter()
            .find(|tag| tag.id == patch.id)
            .cloned()
            .ok_or(EvaluationError::TagNotFound(patch.id))?;
        update_by_id(db, current, patch).await?;
    }

    delete_by_ids(db, evaluation_id, &changes.to_delete).await?;
    create_many(db, evaluation_id, changes.to_create).await?;
    Ok(())
}
