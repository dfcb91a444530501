//! InSpec result and profile documents, and their contextualized forms.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Passed,
    Failed,
    Skipped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResult {
    pub status: ResultStatus,
    #[serde(default)]
    pub code_desc: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub run_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub impact: f64,
    #[serde(default)]
    pub tags: serde_json::Map<String, serde_json::Value>,
    /// Absent for controls read from a profile file.
    #[serde(default)]
    pub results: Vec<ControlResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub maintainer: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    #[serde(default)]
    pub release: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub duration: Option<f64>,
}

/// An `inspec exec --reporter json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub version: String,
    pub platform: Platform,
    #[serde(default)]
    pub statistics: Statistics,
    pub profiles: Vec<Profile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlStatus {
    Passed,
    Failed,
    #[serde(rename = "Not Applicable")]
    NotApplicable,
    #[serde(rename = "Not Reviewed")]
    NotReviewed,
    #[serde(rename = "Profile Error")]
    ProfileError,
    #[serde(rename = "From Profile")]
    FromProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextualizedControl {
    pub data: Control,
    pub status: ControlStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextualizedProfile {
    pub data: Profile,
    /// True when the profile came from a standalone profile file rather than an execution.
    pub from_profile_file: bool,
    pub contains: Vec<ContextualizedControl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextualizedEvaluation {
    pub version: String,
    pub platform: Platform,
    pub statistics: Statistics,
    pub contains: Vec<ContextualizedProfile>,
}

fn execution_control_status(control: &Control) -> ControlStatus {
    let has = |status: ResultStatus| control.results.iter().any(|r| r.status == status);

    if has(ResultStatus::Error) {
        ControlStatus::ProfileError
    } else if control.impact == 0.0 {
        ControlStatus::NotApplicable
    } else if has(ResultStatus::Failed) {
        ControlStatus::Failed
    } else if has(ResultStatus::Passed) {
        ControlStatus::Passed
    } else {
        ControlStatus::NotReviewed
    }
}

fn contextualize_profile(mut profile: Profile, from_profile_file: bool) -> ContextualizedProfile {
    let contains = std::mem::take(&mut profile.controls)
        .into_iter()
        .map(|control| {
            let status = if from_profile_file {
                ControlStatus::FromProfile
            } else {
                execution_control_status(&control)
            };
            ContextualizedControl { data: control, status }
        })
        .collect();

    ContextualizedProfile {
        data: profile,
        from_profile_file,
        contains,
    }
}

pub fn contextualize_execution(execution: Execution) -> ContextualizedEvaluation {
    ContextualizedEvaluation {
        version: execution.version,
        platform: execution.platform,
        statistics: execution.statistics,
        contains: execution
            .profiles
            .into_iter()
            .map(|profile| contextualize_profile(profile, false))
            .collect(),
    }
}

pub fn contextualize_profile_file(profile: Profile) -> ContextualizedProfile {
    contextualize_profile(profile, true)
}

/// Per-status control counts, as shown on the results page cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub not_applicable: usize,
    pub not_reviewed: usize,
    pub profile_error: usize,
}

impl StatusCounts {
    pub fn from_controls<'a, I>(controls: I) -> Self
    where
        I: IntoIterator<Item = &'a ContextualizedControl>,
    {
        let mut counts = StatusCounts::default();
        for control in controls {
            match control.status {
                ControlStatus::Passed => counts.passed += 1,
                ControlStatus::Failed => counts.failed += 1,
                ControlStatus::NotApplicable => counts.not_applicable += 1,
                ControlStatus::NotReviewed => counts.not_reviewed += 1,
                ControlStatus::ProfileError => counts.profile_error += 1,
                ControlStatus::FromProfile => {}
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.not_applicable + self.not_reviewed + self.profile_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(impact: f64, statuses: &[ResultStatus]) -> Control {
        Control {
            id: "C-1".to_string(),
            title: None,
            desc: None,
            impact,
            tags: Default::default(),
            results: statuses
                .iter()
                .cloned()
                .map(|status| ControlResult {
                    status,
                    code_desc: String::new(),
                    message: None,
                    run_time: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_execution_control_status() {
        use ResultStatus::*;

        assert_eq!(execution_control_status(&control(0.7, &[Passed, Failed])), ControlStatus::Failed);
        assert_eq!(execution_control_status(&control(0.7, &[Passed, Passed])), ControlStatus::Passed);
        assert_eq!(execution_control_status(&control(0.0, &[Failed])), ControlStatus::NotApplicable);
        assert_eq!(execution_control_status(&control(0.5, &[Skipped])), ControlStatus::NotReviewed);
        assert_eq!(execution_control_status(&control(0.5, &[])), ControlStatus::NotReviewed);
        assert_eq!(execution_control_status(&control(0.0, &[Error, Passed])), ControlStatus::ProfileError);
    }

    #[test]
    fn test_profile_file_controls_are_from_profile() {
        let profile = Profile {
            name: "baseline".to_string(),
            version: Some("0.2.0".to_string()),
            title: None,
            maintainer: None,
            summary: None,
            sha256: String::new(),
            controls: vec![control(0.7, &[])],
        };

        let contextualized = contextualize_profile_file(profile);
        assert!(contextualized.from_profile_file);
        assert!(contextualized.data.controls.is_empty());
        assert_eq!(contextualized.contains[0].status, ControlStatus::FromProfile);
        assert_eq!(StatusCounts::from_controls(&contextualized.contains).total(), 0);
    }
}
