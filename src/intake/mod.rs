//! Intake of InSpec execution and profile files.
//!
//! Files are parsed and contextualized once when they are loaded; the
//! [`data_store::InspecData`] store derives every view from its file lists on read.

pub mod data_store;
pub mod inspec;

use serde::Serialize;
use uuid::Uuid;

use inspec::{ContextualizedEvaluation, ContextualizedProfile, Execution, Profile};

pub type FileId = Uuid;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Failed to parse file '{filename}': {source}")]
    Parse {
        filename: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("File '{0}' is neither an InSpec execution nor an InSpec profile")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationFile {
    pub unique_id: FileId,
    pub filename: String,
    pub evaluation: ContextualizedEvaluation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileFile {
    pub unique_id: FileId,
    pub filename: String,
    pub profile: ContextualizedProfile,
}

/// Either kind of loaded file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnyFile<'a> {
    Evaluation(&'a EvaluationFile),
    Profile(&'a ProfileFile),
}

impl AnyFile<'_> {
    pub fn unique_id(&self) -> FileId {
        match self {
            AnyFile::Evaluation(f) => f.unique_id,
            AnyFile::Profile(f) => f.unique_id,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            AnyFile::Evaluation(f) => &f.filename,
            AnyFile::Profile(f) => &f.filename,
        }
    }
}

/// The result of [`ingest`].
#[derive(Debug, Clone, PartialEq)]
pub enum IngestedFile {
    Evaluation(EvaluationFile),
    Profile(ProfileFile),
}

pub fn load_execution(filename: &str, value: serde_json::Value) -> Result<EvaluationFile, IntakeError> {
    let execution: Execution = serde_json::from_value(value).map_err(|source| IntakeError::Parse {
        filename: filename.to_string(),
        source,
    })?;
    Ok(EvaluationFile {
        unique_id: Uuid::new_v4(),
        filename: filename.to_string(),
        evaluation: inspec::contextualize_execution(execution),
    })
}

pub fn load_profile(filename: &str, value: serde_json::Value) -> Result<ProfileFile, IntakeError> {
    let profile: Profile = serde_json::from_value(value).map_err(|source| IntakeError::Parse {
        filename: filename.to_string(),
        source,
    })?;
    Ok(ProfileFile {
        unique_id: Uuid::new_v4(),
        filename: filename.to_string(),
        profile: inspec::contextualize_profile_file(profile),
    })
}

/// Parses `text` and decides from its shape whether it is an execution
/// (has `profiles` and `platform`) or a profile (has `controls`).
pub fn ingest(filename: &str, text: &str) -> Result<IngestedFile, IntakeError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|source| IntakeError::Parse {
        filename: filename.to_string(),
        source,
    })?;

    if value.get("profiles").is_some() && value.get("platform").is_some() {
        load_execution(filename, value).map(IngestedFile::Evaluation)
    } else if value.get("controls").is_some() {
        load_profile(filename, value).map(IngestedFile::Profile)
    } else {
        Err(IntakeError::UnknownFormat(filename.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_detects_execution() {
        let text = fixtures::execution().to_string();
        let ingested = ingest("acme.json", &text).unwrap();
        let IngestedFile::Evaluation(file) = ingested else {
            panic!("expected an execution file");
        };
        assert_eq!(file.filename, "acme.json");
        assert_eq!(file.evaluation.version, "4.19.2");
        assert_eq!(file.evaluation.contains[0].contains.len(), 4);
    }

    #[test]
    fn test_ingest_detects_profile() {
        let text = fixtures::profile().to_string();
        assert!(matches!(ingest("baseline.json", &text), Ok(IngestedFile::Profile(_))));
    }

    #[test]
    fn test_ingest_rejects_unknown_documents() {
        assert!(matches!(
            ingest("other.json", r#"{ "hello": "world" }"#),
            Err(IntakeError::UnknownFormat(name)) if name == "other.json"
        ));
        assert!(matches!(ingest("broken.json", "{"), Err(IntakeError::Parse { .. })));
    }
}
