//! Service for managing evaluations and the tags they own.
//!
//! Every write operation runs in a single transaction: the evaluation row and all
//! of its tag rows land together or not at all.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder,
    QuerySelect, Select, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::db::entities::{evaluation, prelude::*};
use crate::db::models::EvaluationWithTags;
use crate::db::reconcile::{self, NewTag};
use crate::db::services::evaluation_tag_service;
use crate::web::models::evaluation_models::{CreateEvaluation, UpdateEvaluation};

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Evaluation with given id not found: {0}")]
    NotFound(i32),
    #[error("EvaluationTag with given id not found: {0}")]
    TagNotFound(i32),
    #[error("notNull Violation: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Persistence(#[from] DbErr),
}

/// Turns an optional lookup result into a `NotFound` error.
pub fn exists(
    evaluation: Option<evaluation::Model>,
    evaluation_id: i32,
) -> Result<evaluation::Model, EvaluationError> {
    evaluation.ok_or(EvaluationError::NotFound(evaluation_id))
}

/// Selects the evaluation row with `FOR UPDATE`, so concurrent writers to the
/// same evaluation run one after another. SQLite has no row locks and ignores it.
fn find_for_update(evaluation_id: i32) -> Select<Evaluation> {
    Evaluation::find_by_id(evaluation_id).lock_exclusive()
}

async fn load<C: ConnectionTrait>(
    db: &C,
    evaluation_id: i32,
) -> Result<EvaluationWithTags, EvaluationError> {
    let evaluation = exists(Evaluation::find_by_id(evaluation_id).one(db).await?, evaluation_id)?;
    let tags = evaluation_tag_service::find_all_for_evaluation(db, evaluation_id).await?;
    Ok(EvaluationWithTags::new(evaluation, tags))
}

pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<EvaluationWithTags>, EvaluationError> {
    let rows = Evaluation::find()
        .find_with_related(EvaluationTag)
        .order_by_asc(evaluation::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(evaluation, tags)| EvaluationWithTags::new(evaluation, tags))
        .collect())
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    evaluation_id: i32,
) -> Result<EvaluationWithTags, EvaluationError> {
    load(db, evaluation_id).await
}

pub async fn create(
    db: &DatabaseConnection,
    payload: CreateEvaluation,
) -> Result<EvaluationWithTags, EvaluationError> {
    let data = payload
        .data
        .filter(|value| !value.is_null())
        .ok_or_else(|| EvaluationError::Validation("Evaluation.data cannot be null".to_string()))?;
    let version = payload
        .version
        .ok_or_else(|| EvaluationError::Validation("Evaluation.version cannot be null".to_string()))?;

    let now = Utc::now();
    let new_evaluation = evaluation::ActiveModel {
        data: Set(data),
        version: Set(version),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let txn = db.begin().await?;

    let saved = new_evaluation.insert(&txn).await?;
    let tags: Vec<NewTag> = payload
        .evaluation_tags
        .unwrap_or_default()
        .into_iter()
        .map(|tag| NewTag {
            key: tag.key,
            value: tag.value,
        })
        .collect();
    let tag_count = tags.len();
    evaluation_tag_service::create_many(&txn, saved.id, tags).await?;

    txn.commit().await?;

    info!(evaluation_id = saved.id, tag_count, "Evaluation created.");
    load(db, saved.id).await
}

/// Applies a partial update.
///
/// Scalar fields are written only when present, so a tags-only update leaves the
/// evaluation's `updated_at` untouched. When `evaluation_tags` is present the
/// evaluation's tags are reconciled against it.
pub async fn update(
    db: &DatabaseConnection,
    evaluation_id: i32,
    payload: UpdateEvaluation,
) -> Result<EvaluationWithTags, EvaluationError> {
    if payload.data.as_ref().is_some_and(|data| data.is_null()) {
        return Err(EvaluationError::Validation("Evaluation.data cannot be null".to_string()));
    }

    let touches_scalars = payload.touches_scalars();
    let txn = db.begin().await?;

    let evaluation = exists(find_for_update(evaluation_id).one(&txn).await?, evaluation_id)?;

    if touches_scalars {
        let mut active_evaluation: evaluation::ActiveModel = evaluation.into();
        if let Some(data) = payload.data {
            active_evaluation.data = Set(data);
        }
        if let Some(version) = payload.version {
            active_evaluation.version = Set(version);
        }
        active_evaluation.updated_at = Set(Utc::now());
        active_evaluation.update(&txn).await?;
    }

    if let Some(desired_tags) = payload.evaluation_tags {
        let existing = evaluation_tag_service::find_all_for_evaluation(&txn, evaluation_id).await?;
        let changes = reconcile::plan_tag_changes(&existing, desired_tags)?;
        if !changes.is_empty() {
            evaluation_tag_service::apply_changes(&txn, evaluation_id, existing, changes).await?;
        }
    }

    txn.commit().await?;

    debug!(evaluation_id, touches_scalars, "Evaluation updated.");
    load(db, evaluation_id).await
}

/// Deletes an evaluation and all of its tags, returning the state before deletion.
pub async fn remove(
    db: &DatabaseConnection,
    evaluation_id: i32,
) -> Result<EvaluationWithTags, EvaluationError> {
    let txn = db.begin().await?;

    let evaluation = exists(find_for_update(evaluation_id).one(&txn).await?, evaluation_id)?;
    let tags = evaluation_tag_service::find_all_for_evaluation(&txn, evaluation_id).await?;
    let snapshot = EvaluationWithTags::new(evaluation, tags);
    let removed_tags = evaluation_tag_service::delete_all_for_evaluation(&txn, evaluation_id).await?;
    Evaluation::delete_by_id(evaluation_id).exec(&txn).await?;

    txn.commit().await?;

    info!(evaluation_id, removed_tags, "Evaluation removed.");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::web::models::evaluation_models::{CreateEvaluationTag, UpdateEvaluationTag};
    use serde_json::json;
    use std::time::Duration;

    fn evaluation_with_tags() -> CreateEvaluation {
        CreateEvaluation {
            data: Some(json!({ "version": "4.19.2", "profiles": [] })),
            version: Some("1.0.0".to_string()),
            evaluation_tags: Some(vec![CreateEvaluationTag {
                key: "environment".to_string(),
                value: "production".to_string(),
            }]),
        }
    }

    // Timestamps must be distinguishable between consecutive writes.
    async fn tick() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[test]
    fn test_exists_rejects_none() {
        assert!(matches!(exists(None, 7), Err(EvaluationError::NotFound(7))));
    }

    #[tokio::test]
    async fn test_find_all_returns_created() {
        let db = test_db().await;
        assert!(find_all(&db).await.unwrap().is_empty());

        let one = create(&db, evaluation_with_tags()).await.unwrap();
        let two = create(&db, evaluation_with_tags()).await.unwrap();

        let all = find_all(&db).await.unwrap();
        assert_eq!(all, vec![one, two]);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();
        assert_eq!(find_by_id(&db, created.id()).await.unwrap(), created);

        assert!(matches!(find_by_id(&db, -1).await, Err(EvaluationError::NotFound(-1))));
    }

    #[tokio::test]
    async fn test_create_with_tags() {
        let db = test_db().await;
        let payload = evaluation_with_tags();
        let created = create(&db, payload.clone()).await.unwrap();

        assert_eq!(Some(created.evaluation.data.clone()), payload.data);
        assert_eq!(Some(created.evaluation.version.clone()), payload.version);
        assert_eq!(created.evaluation_tags.len(), 1);

        let tag = &created.evaluation_tags[0];
        assert_eq!(tag.evaluation_id, created.id());
        assert_eq!(tag.key, "environment");
        assert_eq!(tag.value, "production");
        assert_eq!(tag.created_at, tag.updated_at);
    }

    #[tokio::test]
    async fn test_create_without_tags() {
        let db = test_db().await;
        let created = create(
            &db,
            CreateEvaluation {
                evaluation_tags: None,
                ..evaluation_with_tags()
            },
        )
        .await
        .unwrap();

        assert!(created.evaluation_tags.is_empty());
        assert!(evaluation_tag_service::find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_data_and_version() {
        let db = test_db().await;

        let without_data = create(&db, CreateEvaluation { data: None, ..evaluation_with_tags() }).await;
        assert!(matches!(without_data, Err(EvaluationError::Validation(msg)) if msg == "Evaluation.data cannot be null"));

        let without_version =
            create(&db, CreateEvaluation { version: None, ..evaluation_with_tags() }).await;
        assert!(matches!(without_version, Err(EvaluationError::Validation(msg)) if msg == "Evaluation.version cannot be null"));

        assert!(find_all(&db).await.unwrap().is_empty());
        assert!(evaluation_tag_service::find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rolls_back_on_tag_failure() {
        let db = test_db().await;
        // Drop the tag table so the nested insert fails after the evaluation insert.
        db.execute_unprepared("DROP TABLE evaluation_tags").await.unwrap();

        let result = create(&db, evaluation_with_tags()).await;
        assert!(matches!(result, Err(EvaluationError::Persistence(_))));
        assert!(Evaluation::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_evaluation() {
        let db = test_db().await;
        let result = update(&db, -1, UpdateEvaluation::default()).await;
        assert!(matches!(result, Err(EvaluationError::NotFound(-1))));
    }

    #[tokio::test]
    async fn test_update_all_fields() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();
        tick().await;

        let updated = update(
            &db,
            created.id(),
            UpdateEvaluation {
                data: Some(json!({ "updated": true })),
                version: Some("2.0.0".to_string()),
                evaluation_tags: Some(vec![UpdateEvaluationTag {
                    id: None,
                    key: Some("owner".to_string()),
                    value: Some("security".to_string()),
                }]),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.evaluation.created_at, created.evaluation.created_at);
        assert!(updated.evaluation.updated_at > created.evaluation.updated_at);
        assert_eq!(updated.evaluation.data, json!({ "updated": true }));
        assert_eq!(updated.evaluation.version, "2.0.0");
        assert_ne!(updated.evaluation_tags, created.evaluation_tags);
        assert_eq!(updated.evaluation_tags.len(), 1);
        assert_eq!(updated.evaluation_tags[0].key, "owner");
    }

    #[tokio::test]
    async fn test_update_data_only() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();
        tick().await;

        let updated = update(
            &db,
            created.id(),
            UpdateEvaluation {
                data: Some(json!({ "changed": 1 })),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(updated.evaluation.updated_at > created.evaluation.updated_at);
        assert_eq!(updated.evaluation.version, created.evaluation.version);
        assert_ne!(updated.evaluation.data, created.evaluation.data);
        assert_eq!(updated.evaluation_tags, created.evaluation_tags);
    }

    #[tokio::test]
    async fn test_update_version_only() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();
        tick().await;

        let updated = update(
            &db,
            created.id(),
            UpdateEvaluation {
                version: Some("9.9.9".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(updated.evaluation.updated_at > created.evaluation.updated_at);
        assert_eq!(updated.evaluation.data, created.evaluation.data);
        assert_eq!(updated.evaluation.version, "9.9.9");
        assert_eq!(updated.evaluation_tags, created.evaluation_tags);
    }

    #[tokio::test]
    async fn test_update_existing_tag_leaves_evaluation_timestamp() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();
        let original_tag = created.evaluation_tags[0].clone();
        tick().await;

        let updated = update(
            &db,
            created.id(),
            UpdateEvaluation {
                evaluation_tags: Some(vec![UpdateEvaluationTag {
                    id: Some(original_tag.id),
                    key: Some("updated key".to_string()),
                    value: Some("updated value".to_string()),
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.evaluation, created.evaluation);
        assert_eq!(updated.evaluation_tags.len(), 1);
        let updated_tag = &updated.evaluation_tags[0];
        assert_eq!(updated_tag.id, original_tag.id);
        assert_eq!(updated_tag.created_at, original_tag.created_at);
        assert!(updated_tag.updated_at > original_tag.updated_at);
        assert_eq!(updated_tag.key, "updated key");
        assert_eq!(updated_tag.value, "updated value");
    }

    #[tokio::test]
    async fn test_update_keeps_one_and_adds_one() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();
        let original_tag = created.evaluation_tags[0].clone();
        tick().await;

        let updated = update(
            &db,
            created.id(),
            UpdateEvaluation {
                evaluation_tags: Some(vec![
                    UpdateEvaluationTag {
                        id: Some(original_tag.id),
                        key: Some("renamed".to_string()),
                        value: Some("value".to_string()),
                    },
                    UpdateEvaluationTag {
                        id: None,
                        key: Some("new".to_string()),
                        value: Some("tag".to_string()),
                    },
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.evaluation.updated_at, created.evaluation.updated_at);
        assert_eq!(updated.evaluation_tags.len(), 2);

        let kept = updated
            .evaluation_tags
            .iter()
            .find(|tag| tag.id == original_tag.id)
            .unwrap();
        assert_eq!(kept.created_at, original_tag.created_at);
        assert_eq!(kept.key, "renamed");

        let added = updated
            .evaluation_tags
            .iter()
            .find(|tag| tag.id != original_tag.id)
            .unwrap();
        assert_eq!(added.key, "new");
        assert_eq!(added.evaluation_id, created.id());
        assert!(added.created_at > original_tag.created_at);
    }

    #[tokio::test]
    async fn test_update_partial_tag_fields() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();
        let original_tag = created.evaluation_tags[0].clone();

        let updated = update(
            &db,
            created.id(),
            UpdateEvaluation {
                evaluation_tags: Some(vec![UpdateEvaluationTag {
                    id: Some(original_tag.id),
                    key: None,
                    value: Some("staging".to_string()),
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.evaluation_tags[0].key, original_tag.key);
        assert_eq!(updated.evaluation_tags[0].value, "staging");
    }

    #[tokio::test]
    async fn test_update_empty_tag_list_removes_all() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();
        tick().await;

        let updated = update(
            &db,
            created.id(),
            UpdateEvaluation {
                evaluation_tags: Some(Vec::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.evaluation, created.evaluation);
        assert!(updated.evaluation_tags.is_empty());
        assert!(evaluation_tag_service::find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_invalid_new_tag_writes_nothing() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();

        let result = update(
            &db,
            created.id(),
            UpdateEvaluation {
                version: Some("2.0.0".to_string()),
                evaluation_tags: Some(vec![UpdateEvaluationTag {
                    id: None,
                    key: Some("orphan".to_string()),
                    value: None,
                }]),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(EvaluationError::Validation(_))));
        assert_eq!(find_by_id(&db, created.id()).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_rejects_null_data() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();

        let result = update(
            &db,
            created.id(),
            UpdateEvaluation {
                data: Some(serde_json::Value::Null),
                version: Some("2.0.0".to_string()),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(EvaluationError::Validation(msg)) if msg == "Evaluation.data cannot be null"));
        assert_eq!(find_by_id(&db, created.id()).await.unwrap(), created);
    }

    #[test]
    fn test_writers_lock_the_evaluation_row() {
        use sea_orm::{DbBackend, QueryTrait};

        let sql = find_for_update(5).build(DbBackend::Postgres).to_string();
        assert!(sql.ends_with("FOR UPDATE"), "unexpected SQL: {sql}");
        assert!(sql.contains("\"evaluations\".\"id\" = 5"), "unexpected SQL: {sql}");

        let sqlite_sql = find_for_update(5).build(DbBackend::Sqlite).to_string();
        assert!(!sqlite_sql.contains("FOR UPDATE"), "unexpected SQL: {sqlite_sql}");
    }

    #[tokio::test]
    async fn test_remove_deletes_tags() {
        let db = test_db().await;
        let created = create(&db, evaluation_with_tags()).await.unwrap();

        let removed = remove(&db, created.id()).await.unwrap();
        assert_eq!(removed, created);
        assert!(evaluation_tag_service::find_all(&db).await.unwrap().is_empty());
        assert!(matches!(
            find_by_id(&db, created.id()).await,
            Err(EvaluationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_missing_evaluation() {
        let db = test_db().await;
        assert!(matches!(remove(&db, -1).await, Err(EvaluationError::NotFound(-1))));
    }
}
