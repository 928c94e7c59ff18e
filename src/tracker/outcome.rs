use crate::core::{Event, Runner};
use crate::partition::{RejectReason, Rejected};
use serde::Serialize;
use serde_json::Value;

/// What a batch operation accepted and rejected.
///
/// Implemented by every batch outcome so the API layer can classify it
/// without knowing its shape.
pub trait BatchReport {
    fn accepted_count(&self) -> usize;
    fn rejection_reasons(&self) -> Vec<&RejectReason>;
}

/// Result of add/remove heats and checkpoints. `event` is the state after the write,
/// or the unchanged event when nothing was accepted.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome<A> {
    pub event: Event,
    pub accepted: Vec<A>,
    pub rejected: Vec<Rejected>,
}

impl<A> BatchOutcome<A> {
    pub fn unchanged(event: Event, rejected: Vec<Rejected>) -> Self {
        Self {
            event,
            accepted: Vec::new(),
            rejected,
        }
    }
}

impl<A> BatchReport for BatchOutcome<A> {
    fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    fn rejection_reasons(&self) -> Vec<&RejectReason> {
        self.rejected.iter().map(|r| &r.reason).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatEntry {
    pub id: String,
    pub name: String,
    pub start_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunnersOutcome {
    pub event: Event,
    pub created_runners: Vec<Runner>,
    pub rejected_runners: Vec<Rejected>,
}

impl BatchReport for CreateRunnersOutcome {
    fn accepted_count(&self) -> usize {
        self.created_runners.len()
    }

    fn rejection_reasons(&self) -> Vec<&RejectReason> {
        self.rejected_runners.iter().map(|r| &r.reason).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetRunnersOutcome {
    pub runners: Vec<Runner>,
    #[serde(rename = "rejectedIDs")]
    pub rejected_ids: Vec<Rejected>,
}

impl BatchReport for GetRunnersOutcome {
    fn accepted_count(&self) -> usize {
        self.runners.len()
    }

    fn rejection_reasons(&self) -> Vec<&RejectReason> {
        self.rejected_ids.iter().map(|r| &r.reason).collect()
    }
}

/// One split rejected from a runner that passed the runner-level checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedSplit {
    pub runner_id: String,
    pub split: Value,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSplitsOutcome {
    pub updated_runners: Vec<Runner>,
    pub rejected_runners: Vec<Rejected>,
    pub rejected_splits: Vec<RejectedSplit>,
}

impl BatchReport for AddSplitsOutcome {
    fn accepted_count(&self) -> usize {
        self.updated_runners.len()
    }

    fn rejection_reasons(&self) -> Vec<&RejectReason> {
        self.rejected_runners
            .iter()
            .map(|r| &r.reason)
            .chain(self.rejected_splits.iter().map(|r| &r.reason))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreContents {
    pub events: Vec<Event>,
    pub runners: Vec<Runner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteAllOutcome {
    pub deleted: usize,
}
