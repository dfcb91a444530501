//! Tag reconciliation for evaluation updates.
//!
//! Compares the tags an evaluation currently owns with the desired list from an
//! update payload and works out which rows to create, update and delete. Nothing
//! here touches the database; `evaluation_tag_service::apply_changes` writes the
//! result inside the caller's transaction.

use std::collections::{BTreeSet, HashSet};

use crate::db::entities::evaluation_tag;
use crate::db::services::evaluation_service::EvaluationError;
use crate::web::models::evaluation_models::UpdateEvaluationTag;

/// A tag row that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub key: String,
    pub value: String,
}

/// Field changes for an existing tag. `None` leaves the column as it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPatch {
    pub id: i32,
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagChangeSet {
    pub to_create: Vec<NewTag>,
    pub to_update: Vec<TagPatch>,
    /// Ascending ids of tags absent from the desired list.
    pub to_delete: Vec<i32>,
}

impl TagChangeSet {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Plans the writes that turn `existing` into `desired`.
///
/// An element whose id matches an existing tag updates it; any other element is a
/// new tag and must carry both `key` and `value`. Existing tags that no element
/// matched are deleted, so an empty `desired` list deletes everything.
pub fn plan_tag_changes(
    existing: &[evaluation_tag::Model],
    desired: Vec<UpdateEvaluationTag>,
) -> Result<TagChangeSet, EvaluationError> {
    let existing_ids: HashSet<i32> = existing.iter().map(|tag| tag.id).collect();
    let mut pending_deletion: BTreeSet<i32> = existing_ids.iter().copied().collect();
    let mut changes = TagChangeSet::default();

    for element in desired {
        match element.id {
            Some(id) if existing_ids.contains(&id) => {
                pending_deletion.remove(&id);
                changes.to_update.push(TagPatch {
                    id,
                    key: element.key,
                    value: element.value,
                });
            }
            _ => {
                let key = element
                    .key
                    .ok_or_else(|| EvaluationError::Validation("EvaluationTag.key cannot be null".to_string()))?;
                let value = element
                    .value
                    .ok_or_else(|| EvaluationError::Validation("EvaluationTag.value cannot be null".to_string()))?;
                changes.to_create.push(NewTag { key, value });
            }
        }
    }

    changes.to_delete = pending_deletion.into_iter().collect();
    Ok(changes)
}
