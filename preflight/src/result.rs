use crate::collision::{IndexCollision, IndexDistanceMatrix};
use crate::color_balance::LaneColorBalance;
use crate::configuration::{ConfigurationIssue, Severity};
use crate::dark_cycle::DarkCycleFinding;
use crate::sample_ids::DuplicateSampleId;
use run_types::{InstrumentChannelConfig, SequencingRun};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// An issue raised outside the index checks, e.g. by an application profile
/// lookup, that still counts against the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIssue {
    pub severity: Severity,
    pub message: String,
}

impl ExternalIssue {
    pub fn error(message: impl Into<String>) -> Self {
        ExternalIssue {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        ExternalIssue {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Everything found by one validation pass over a run. Lane-keyed maps are
/// ordered by lane number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub duplicate_sample_ids: Vec<DuplicateSampleId>,
    pub index_collisions: Vec<IndexCollision>,
    pub distance_matrices: BTreeMap<usize, IndexDistanceMatrix>,
    pub dark_cycle_findings: Vec<DarkCycleFinding>,
    pub color_balance: BTreeMap<usize, LaneColorBalance>,
    pub configuration_issues: Vec<ConfigurationIssue>,
    #[serde(default)]
    pub external_issues: Vec<ExternalIssue>,
    /// Absent for four-color instruments, which skip the dark-cycle and
    /// color-balance checks.
    pub channel_config: Option<InstrumentChannelConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalRefused {
    #[error("run has no samples")]
    NoSamples,
    #[error("{0} sample(s) have no i7 index assigned")]
    MissingIndex(usize),
    #[error("validation found {0} error(s)")]
    Errors(usize),
}

impl ValidationResult {
    pub fn add_external_issues(&mut self, issues: impl IntoIterator<Item = ExternalIssue>) {
        self.external_issues.extend(issues);
    }

    pub fn dark_cycle_errors(&self) -> impl Iterator<Item = &DarkCycleFinding> {
        self.dark_cycle_findings.iter().filter(|f| f.is_error())
    }

    fn issue_count(&self, severity: Severity) -> usize {
        self.configuration_issues
            .iter()
            .filter(|i| i.severity == severity)
            .count()
            + self
                .external_issues
                .iter()
                .filter(|i| i.severity == severity)
                .count()
    }

    pub fn error_count(&self) -> usize {
        self.duplicate_sample_ids.len()
            + self.index_collisions.len()
            + self.dark_cycle_errors().count()
            + self.issue_count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.issue_count(Severity::Warning)
    }

    /// Lanes with at least one cycle that is not ok.
    pub fn color_balance_issue_count(&self) -> usize {
        self.color_balance
            .values()
            .filter(|lane| lane.has_issues())
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Why `run` may not be approved on the strength of this result, if at all.
    pub fn check_approval(&self, run: &SequencingRun) -> Result<(), ApprovalRefused> {
        if run.samples.is_empty() {
            return Err(ApprovalRefused::NoSamples);
        }
        let unindexed = run.samples.iter().filter(|s| !s.has_index()).count();
        if unindexed > 0 {
            return Err(ApprovalRefused::MissingIndex(unindexed));
        }
        match self.error_count() {
            0 => Ok(()),
            n => Err(ApprovalRefused::Errors(n)),
        }
    }

    pub fn can_approve(&self, run: &SequencingRun) -> bool {
        self.check_approval(run).is_ok()
    }
}

/// Mark `run` approved when `result` allows it. The run is left untouched on
/// refusal.
pub fn approve(run: &mut SequencingRun, result: &ValidationResult) -> Result<(), ApprovalRefused> {
    result.check_approval(run)?;
    run.validation_approved = true;
    Ok(())
}
