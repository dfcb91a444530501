use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationTag {
    pub key: String,
    pub value: String,
}

/// Body of `POST /api/evaluations`.
///
/// `data` and `version` are optional here so that a missing field is reported
/// by the service as a validation error naming it.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluation {
    pub data: Option<serde_json::Value>,
    pub version: Option<String>,
    #[serde(default)]
    pub evaluation_tags: Option<Vec<CreateEvaluationTag>>,
}

/// One element of the desired tag list in an update.
/// Without an `id` (or with an id the evaluation does not own) it describes a new tag.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvaluationTag {
    pub id: Option<i32>,
    pub key: Option<String>,
    pub value: Option<String>,
}

/// Body of `PUT /api/evaluations/{id}`.
///
/// `evaluation_tags: None` leaves the tags alone, `Some(vec![])` deletes them all.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvaluation {
    pub data: Option<serde_json::Value>,
    pub version: Option<String>,
    #[serde(default)]
    pub evaluation_tags: Option<Vec<UpdateEvaluationTag>>,
}

impl UpdateEvaluation {
    /// True when the evaluation row itself has to be written.
    pub fn touches_scalars(&self) -> bool {
        self.data.is_some() || self.version.is_some()
    }
}
