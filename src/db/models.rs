use serde::{Deserialize, Serialize};

use crate::db::entities::{evaluation, evaluation_tag};

/// An evaluation together with every tag it owns.
/// This is the shape returned by all evaluation service operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationWithTags {
    #[serde(flatten)]
    pub evaluation: evaluation::Model,
    pub evaluation_tags: Vec<evaluation_tag::Model>,
}

impl EvaluationWithTags {
    pub fn new(evaluation: evaluation::Model, mut evaluation_tags: Vec<evaluation_tag::Model>) -> Self {
        evaluation_tags.sort_by_key(|tag| tag.id);
        Self {
            evaluation,
            evaluation_tags,
        }
    }

    pub fn id(&self) -> i32 {
        self.evaluation.id
    }
}
