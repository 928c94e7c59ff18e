use crate::core::{ErrorKind, Version};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Why a batch item was rejected. `code()` is the stable machine tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("Invalidly formatted runner: {detail}")]
    InvalidRunner { detail: String },

    #[error("Invalidly formatted heat: {detail}")]
    InvalidHeat { detail: String },

    #[error("Invalidly formatted checkpoint: {detail}")]
    InvalidCheckpoint { detail: String },

    #[error("Invalid runner ID: {detail}")]
    InvalidRunnerId { detail: String },

    #[error("Invalid heat ID: {detail}")]
    InvalidHeatId { detail: String },

    #[error("Invalid checkpoint ID: {detail}")]
    InvalidCheckpointId { detail: String },

    #[error("Invalid split time: {detail}")]
    InvalidSplitTime { detail: String },

    #[error("User submitted runners with duplicate bib")]
    DuplicateBib,

    #[error("User submitted heats with duplicate name")]
    DuplicateHeatName,

    #[error("User submitted checkpoints with duplicate name")]
    DuplicateCheckpointName,

    #[error("User submitted duplicate runners")]
    DuplicateRunnerId,

    #[error("User submitted duplicate heat IDs")]
    DuplicateHeatId,

    #[error("User submitted duplicate checkpoint IDs")]
    DuplicateCheckpointId,

    #[error("User submitted the same checkpoint more than once for this runner")]
    DuplicateSplit,

    #[error("Bib already taken by an existing runner")]
    BibTaken,

    #[error("Heat already exists in the event")]
    HeatExists,

    #[error("Checkpoint already exists in the event")]
    CheckpointExists,

    #[error("A split already exists for that checkpoint")]
    SplitExists,

    #[error("Heat not found in event")]
    HeatNotFound,

    #[error("Checkpoint not found in event")]
    CheckpointNotFound,

    #[error("Unable to find runner in database")]
    RunnerNotFound,

    #[error("Runner does not exist in event")]
    RunnerNotInEvent,

    #[error("None of the runner's splits were accepted")]
    NoSplitsAccepted,

    #[error("Cannot remove a heat that still has runners associated with it")]
    HeatInUse,

    #[error(
        "Runner has been modified by another user (expected version {expected}, found {actual}); re-fetch and resubmit"
    )]
    StaleVersion { expected: Version, actual: Version },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRunner { .. } => "invalidRunner",
            Self::InvalidHeat { .. } => "invalidHeat",
            Self::InvalidCheckpoint { .. } => "invalidCheckpoint",
            Self::InvalidRunnerId { .. } => "invalidRunnerId",
            Self::InvalidHeatId { .. } => "invalidHeatId",
            Self::InvalidCheckpointId { .. } => "invalidCheckpointId",
            Self::InvalidSplitTime { .. } => "invalidSplitTime",
            Self::DuplicateBib => "duplicateBib",
            Self::DuplicateHeatName => "duplicateHeatName",
            Self::DuplicateCheckpointName => "duplicateCheckpointName",
            Self::DuplicateRunnerId => "duplicateRunnerId",
            Self::DuplicateHeatId => "duplicateHeatId",
            Self::DuplicateCheckpointId => "duplicateCheckpointId",
            Self::DuplicateSplit => "duplicateSplit",
            Self::BibTaken => "bibTaken",
            Self::HeatExists => "heatExists",
            Self::CheckpointExists => "checkpointExists",
            Self::SplitExists => "splitExists",
            Self::HeatNotFound => "heatNotFound",
            Self::CheckpointNotFound => "checkpointNotFound",
            Self::RunnerNotFound => "runnerNotFound",
            Self::RunnerNotInEvent => "runnerNotInEvent",
            Self::NoSplitsAccepted => "noSplitsAccepted",
            Self::HeatInUse => "heatInUse",
            Self::StaleVersion { .. } => "staleVersion",
            Self::StoreUnavailable(_) => "storeUnavailable",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRunner { .. }
            | Self::InvalidHeat { .. }
            | Self::InvalidCheckpoint { .. }
            | Self::InvalidRunnerId { .. }
            | Self::InvalidHeatId { .. }
            | Self::InvalidCheckpointId { .. }
            | Self::InvalidSplitTime { .. } => ErrorKind::InvalidInput,
            Self::RunnerNotFound | Self::RunnerNotInEvent => ErrorKind::NotFound,
            Self::StaleVersion { .. } => ErrorKind::Conflict,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            _ => ErrorKind::ConstraintViolation,
        }
    }
}

impl Serialize for RejectReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RejectReason", 3)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
