use super::{PartitionRules, RejectReason};
use crate::core::{Event, Runner};
use crate::validation::{
    CheckpointDraft, FieldError, HeatDraft, RunnerDraft, SplitDraft, SplitSubmission,
    validate_checkpoint_shape, validate_heat_shape, validate_id, validate_runner_shape,
    validate_split_shape, validate_split_submission,
};
use serde_json::Value;
use std::collections::HashSet;

fn detail(err: FieldError) -> String {
    err.to_string()
}

// ============================================================================
// Heats
// ============================================================================

pub struct NewHeatRules<'a> {
    existing_names: HashSet<&'a str>,
}

impl<'a> NewHeatRules<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self {
            existing_names: event.heat_names(),
        }
    }
}

impl PartitionRules for NewHeatRules<'_> {
    type Candidate = HeatDraft;
    type Key = String;

    fn check_structure(&self, item: &Value) -> Result<HeatDraft, RejectReason> {
        validate_heat_shape(item).map_err(|err| RejectReason::InvalidHeat {
            detail: detail(err),
        })
    }

    fn batch_key(&self, candidate: &HeatDraft) -> String {
        candidate.name.clone()
    }

    fn duplicate_reason(&self) -> RejectReason {
        RejectReason::DuplicateHeatName
    }

    fn check_existing(&self, candidate: &HeatDraft) -> Result<(), RejectReason> {
        if self.existing_names.contains(candidate.name.as_str()) {
            return Err(RejectReason::HeatExists);
        }
        Ok(())
    }
}

/// Removal targets: must exist and have no runner assigned.
pub struct HeatRemovalRules<'a> {
    event: &'a Event,
    in_use: HashSet<String>,
}

impl<'a> HeatRemovalRules<'a> {
    /// `in_use` holds the heat ids referenced by the event's runner documents.
    pub fn new(event: &'a Event, in_use: HashSet<String>) -> Self {
        Self { event, in_use }
    }
}

impl PartitionRules for HeatRemovalRules<'_> {
    type Candidate = String;
    type Key = String;

    fn check_structure(&self, item: &Value) -> Result<String, RejectReason> {
        validate_id("heatID", Some(item)).map_err(|err| RejectReason::InvalidHeatId {
            detail: detail(err),
        })
    }

    fn batch_key(&self, candidate: &String) -> String {
        candidate.clone()
    }

    fn duplicate_reason(&self) -> RejectReason {
        RejectReason::DuplicateHeatId
    }

    fn check_existing(&self, candidate: &String) -> Result<(), RejectReason> {
        if !self.event.heats.contains_key(candidate) {
            return Err(RejectReason::HeatNotFound);
        }
        Ok(())
    }

    fn check_references(&self, candidate: String) -> Result<String, RejectReason> {
        if self.in_use.contains(&candidate) {
            return Err(RejectReason::HeatInUse);
        }
        Ok(candidate)
    }
}

// ============================================================================
// Checkpoints
// ============================================================================

pub struct NewCheckpointRules<'a> {
    existing_names: HashSet<&'a str>,
}

impl<'a> NewCheckpointRules<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self {
            existing_names: event.checkpoint_names(),
        }
    }
}

impl PartitionRules for NewCheckpointRules<'_> {
    type Candidate = CheckpointDraft;
    type Key = String;

    fn check_structure(&self, item: &Value) -> Result<CheckpointDraft, RejectReason> {
        validate_checkpoint_shape(item).map_err(|err| RejectReason::InvalidCheckpoint {
            detail: detail(err),
        })
    }

    fn batch_key(&self, candidate: &CheckpointDraft) -> String {
        candidate.name.clone()
    }

    fn duplicate_reason(&self) -> RejectReason {
        RejectReason::DuplicateCheckpointName
    }

    fn check_existing(&self, candidate: &CheckpointDraft) -> Result<(), RejectReason> {
        if self.existing_names.contains(candidate.name.as_str()) {
            return Err(RejectReason::CheckpointExists);
        }
        Ok(())
    }
}

pub struct CheckpointRemovalRules<'a> {
    event: &'a Event,
}

impl<'a> CheckpointRemovalRules<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self { event }
    }
}

impl PartitionRules for CheckpointRemovalRules<'_> {
    type Candidate = String;
    type Key = String;

    fn check_structure(&self, item: &Value) -> Result<String, RejectReason> {
        validate_id("checkpointID", Some(item)).map_err(|err| RejectReason::InvalidCheckpointId {
            detail: detail(err),
        })
    }

    fn batch_key(&self, candidate: &String) -> String {
        candidate.clone()
    }

    fn duplicate_reason(&self) -> RejectReason {
        RejectReason::DuplicateCheckpointId
    }

    fn check_existing(&self, candidate: &String) -> Result<(), RejectReason> {
        if !self.event.checkpoints.contains_key(candidate) {
            return Err(RejectReason::CheckpointNotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Runners
// ============================================================================

/// New runners: bib unique across batch and event, heat must exist.
///
/// The accepted draft's `heat` is rewritten to the heat id.
pub struct NewRunnerRules<'a> {
    event: &'a Event,
    taken_bibs: HashSet<&'a str>,
}

impl<'a> NewRunnerRules<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self {
            event,
            taken_bibs: event.bibs(),
        }
    }
}

impl PartitionRules for NewRunnerRules<'_> {
    type Candidate = RunnerDraft;
    type Key = String;

    fn check_structure(&self, item: &Value) -> Result<RunnerDraft, RejectReason> {
        validate_runner_shape(item).map_err(|err| RejectReason::InvalidRunner {
            detail: detail(err),
        })
    }

    fn batch_key(&self, candidate: &RunnerDraft) -> String {
        candidate.bib.clone()
    }

    fn duplicate_reason(&self) -> RejectReason {
        RejectReason::DuplicateBib
    }

    fn check_existing(&self, candidate: &RunnerDraft) -> Result<(), RejectReason> {
        if self.taken_bibs.contains(candidate.bib.as_str()) {
            return Err(RejectReason::BibTaken);
        }
        Ok(())
    }

    fn check_references(&self, mut candidate: RunnerDraft) -> Result<RunnerDraft, RejectReason> {
        let heat_id = self
            .event
            .resolve_heat(&candidate.heat)
            .ok_or(RejectReason::HeatNotFound)?;
        candidate.heat = heat_id.to_string();
        Ok(candidate)
    }
}

/// Runner ids to look up. Existence is decided by the fetch, not here.
#[derive(Debug, Default)]
pub struct RunnerLookupRules;

impl PartitionRules for RunnerLookupRules {
    type Candidate = String;
    type Key = String;

    fn check_structure(&self, item: &Value) -> Result<String, RejectReason> {
        validate_id("runnerID", Some(item)).map_err(|err| RejectReason::InvalidRunnerId {
            detail: detail(err),
        })
    }

    fn batch_key(&self, candidate: &String) -> String {
        candidate.clone()
    }

    fn duplicate_reason(&self) -> RejectReason {
        RejectReason::DuplicateRunnerId
    }
}

// ============================================================================
// Splits
// ============================================================================

/// Runner-level pass of addSplits.
pub struct SplitSubmissionRules<'a> {
    event: &'a Event,
}

impl<'a> SplitSubmissionRules<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self { event }
    }
}

impl PartitionRules for SplitSubmissionRules<'_> {
    type Candidate = SplitSubmission;
    type Key = String;

    fn check_structure(&self, item: &Value) -> Result<SplitSubmission, RejectReason> {
        validate_split_submission(item).map_err(|err| match err.field() {
            Some("id") => RejectReason::InvalidRunnerId {
                detail: detail(err),
            },
            _ => RejectReason::InvalidRunner {
                detail: detail(err),
            },
        })
    }

    fn batch_key(&self, candidate: &SplitSubmission) -> String {
        candidate.runner_id.clone()
    }

    fn duplicate_reason(&self) -> RejectReason {
        RejectReason::DuplicateRunnerId
    }

    fn check_existing(&self, candidate: &SplitSubmission) -> Result<(), RejectReason> {
        if !self.event.has_runner(&candidate.runner_id) {
            return Err(RejectReason::RunnerNotInEvent);
        }
        Ok(())
    }

    fn check_references(&self, candidate: SplitSubmission) -> Result<SplitSubmission, RejectReason> {
        if let Some(heat) = &candidate.heat {
            if self.event.resolve_heat(heat).is_none() {
                return Err(RejectReason::HeatNotFound);
            }
        }
        Ok(candidate)
    }
}

/// Split-level pass of addSplits, against one freshly fetched runner.
pub struct SplitEntryRules<'a> {
    event: &'a Event,
    runner: &'a Runner,
}

impl<'a> SplitEntryRules<'a> {
    pub fn new(event: &'a Event, runner: &'a Runner) -> Self {
        Self { event, runner }
    }
}

impl PartitionRules for SplitEntryRules<'_> {
    type Candidate = SplitDraft;
    type Key = String;

    fn check_structure(&self, item: &Value) -> Result<SplitDraft, RejectReason> {
        validate_split_shape(item).map_err(|err| match err.field() {
            Some("splitTime") => RejectReason::InvalidSplitTime {
                detail: detail(err),
            },
            _ => RejectReason::InvalidCheckpointId {
                detail: detail(err),
            },
        })
    }

    fn batch_key(&self, candidate: &SplitDraft) -> String {
        candidate.checkpoint_id.clone()
    }

    fn duplicate_reason(&self) -> RejectReason {
        RejectReason::DuplicateSplit
    }

    fn check_existing(&self, candidate: &SplitDraft) -> Result<(), RejectReason> {
        if self.runner.has_split(&candidate.checkpoint_id) {
            return Err(RejectReason::SplitExists);
        }
        Ok(())
    }

    fn check_references(&self, candidate: SplitDraft) -> Result<SplitDraft, RejectReason> {
        if !self.event.checkpoints.contains_key(&candidate.checkpoint_id) {
            return Err(RejectReason::CheckpointNotFound);
        }
        Ok(candidate)
    }
}
