//! Tracks loaded files and their parsed contents.

use super::inspec::{ContextualizedControl, ContextualizedEvaluation, ContextualizedProfile};
use super::{AnyFile, EvaluationFile, FileId, IngestedFile, ProfileFile};

#[derive(Debug, Clone, Default)]
pub struct InspecData {
    execution_files: Vec<EvaluationFile>,
    profile_files: Vec<ProfileFile>,
}

impl InspecData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execution files first, then profile files, each in insertion order.
    pub fn all_files(&self) -> Vec<AnyFile<'_>> {
        self.execution_files
            .iter()
            .map(AnyFile::Evaluation)
            .chain(self.profile_files.iter().map(AnyFile::Profile))
            .collect()
    }

    pub fn all_evaluation_files(&self) -> &[EvaluationFile] {
        &self.execution_files
    }

    pub fn all_profile_files(&self) -> &[ProfileFile] {
        &self.profile_files
    }

    pub fn contextual_executions(&self) -> Vec<&ContextualizedEvaluation> {
        self.execution_files.iter().map(|f| &f.evaluation).collect()
    }

    /// Profiles contained in executions, followed by standalone profile files.
    pub fn contextual_profiles(&self) -> Vec<&ContextualizedProfile> {
        self.execution_files
            .iter()
            .flat_map(|f| f.evaluation.contains.iter())
            .chain(self.profile_files.iter().map(|f| &f.profile))
            .collect()
    }

    pub fn contextual_controls(&self) -> Vec<&ContextualizedControl> {
        self.contextual_profiles()
            .into_iter()
            .flat_map(|p| p.contains.iter())
            .collect()
    }

    pub fn add_profile(&mut self, new_profile: ProfileFile) {
        self.profile_files.push(new_profile);
    }

    pub fn add_execution(&mut self, new_execution: EvaluationFile) {
        self.execution_files.push(new_execution);
    }

    pub fn add(&mut self, file: IngestedFile) -> FileId {
        match file {
            IngestedFile::Evaluation(f) => {
                let id = f.unique_id;
                self.add_execution(f);
                id
            }
            IngestedFile::Profile(f) => {
                let id = f.unique_id;
                self.add_profile(f);
                id
            }
        }
    }

    /// Unloads the file with the given id. Returns false when no file matched.
    pub fn remove_file(&mut self, file_id: FileId) -> bool {
        let before = self.execution_files.len() + self.profile_files.len();
        self.profile_files.retain(|pf| pf.unique_id != file_id);
        self.execution_files.retain(|ef| ef.unique_id != file_id);
        before != self.execution_files.len() + self.profile_files.len()
    }

    /// Clear all stored data.
    pub fn reset(&mut self) {
        self.profile_files.clear();
        self.execution_files.clear();
    }
}
