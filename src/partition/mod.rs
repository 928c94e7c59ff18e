//! Batch partition engine
//!
//! Every mutating operation splits its batch into accepted and rejected items
//! with the same ordered pipeline, short-circuiting at the first failure:
//!
//! 1. structural validity
//! 2. duplicate of an item already accepted earlier in the batch
//! 3. collision with (or absence from) the current aggregate
//! 4. referential integrity against a sibling collection
//!
//! Operations only supply the per-step rules through [`PartitionRules`].

pub mod reason;
pub mod rules;

pub use reason::RejectReason;
pub use rules::{
    CheckpointRemovalRules, HeatRemovalRules, NewCheckpointRules, NewHeatRules, NewRunnerRules,
    RunnerLookupRules, SplitEntryRules, SplitSubmissionRules,
};

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::hash::Hash;

pub trait PartitionRules {
    /// Validated form of one raw batch item.
    type Candidate;
    /// Identity used for in-batch duplicate detection.
    type Key: Eq + Hash;

    fn check_structure(&self, item: &Value) -> Result<Self::Candidate, RejectReason>;

    fn batch_key(&self, candidate: &Self::Candidate) -> Self::Key;

    fn duplicate_reason(&self) -> RejectReason;

    fn check_existing(&self, _candidate: &Self::Candidate) -> Result<(), RejectReason> {
        Ok(())
    }

    /// May rewrite the candidate, e.g. to resolve a reference to its canonical id.
    fn check_references(&self, candidate: Self::Candidate) -> Result<Self::Candidate, RejectReason> {
        Ok(candidate)
    }
}

/// A rejected batch item, echoed back as submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejected {
    pub item: Value,
    pub reason: RejectReason,
}

impl Rejected {
    pub fn new(item: Value, reason: RejectReason) -> Self {
        Self { item, reason }
    }
}

#[derive(Debug, Clone)]
pub struct Partition<C> {
    /// In submission order.
    pub accepted: Vec<C>,
    pub rejected: Vec<Rejected>,
}

impl<C> Partition<C> {
    pub fn is_noop(&self) -> bool {
        self.accepted.is_empty()
    }
}

pub fn partition<R: PartitionRules>(rules: &R, items: Vec<Value>) -> Partition<R::Candidate> {
    let mut accepted_keys: HashSet<R::Key> = HashSet::new();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for item in items {
        match admit(rules, &item, &accepted_keys) {
            Ok((key, candidate)) => {
                accepted_keys.insert(key);
                accepted.push(candidate);
            }
            Err(reason) => rejected.push(Rejected::new(item, reason)),
        }
    }

    Partition { accepted, rejected }
}

fn admit<R: PartitionRules>(
    rules: &R,
    item: &Value,
    accepted_keys: &HashSet<R::Key>,
) -> Result<(R::Key, R::Candidate), RejectReason> {
    let candidate = rules.check_structure(item)?;
    let key = rules.batch_key(&candidate);
    if accepted_keys.contains(&key) {
        return Err(rules.duplicate_reason());
    }
    rules.check_existing(&candidate)?;
    let candidate = rules.check_references(candidate)?;
    Ok((key, candidate))
}
