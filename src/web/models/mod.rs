use serde::Serialize;

use crate::intake::inspec::StatusCounts;

pub mod evaluation_models;

/// Profile header shown above the result cards.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    pub name: String,
    pub title: Option<String>,
    pub version: Option<String>,
    pub maintainer: Option<String>,
    pub summary: Option<String>,
    pub sha256: String,
}

/// Response of `GET /api/evaluations/{id}/summary`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub evaluation_id: i32,
    pub inspec_version: String,
    pub platform: String,
    pub duration: Option<f64>,
    pub profiles: Vec<ProfileInfo>,
    pub status_counts: StatusCounts,
}
