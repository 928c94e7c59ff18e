//! Mutation orchestrator
//!
//! Every public operation follows the same three stages:
//!
//! 1. **Fetch** the event (and, for runner-level operations, the runner
//!    documents named in the batch, concurrently).
//! 2. **Partition** the batch against the fetched state.
//! 3. **Apply** the accepted subset with one conditional write per touched
//!    document, keyed by the version observed in step 1.
//!
//! An empty accepted set performs no write, so a fully rejected batch never
//! moves a version. Nothing is retried here; a version conflict is reported
//! to the caller, who re-fetches and resubmits.

mod admin;
mod event_ops;
pub mod outcome;
mod runner_ops;
mod split_ops;

pub use outcome::{
    AddSplitsOutcome, BatchOutcome, BatchReport, CheckpointEntry, CreateRunnersOutcome,
    DeleteAllOutcome, GetRunnersOutcome, HeatEntry, RejectedSplit, StoreContents,
};

use crate::core::{Event, RaceError, Result};
use crate::storage::{DocumentStore, InMemoryDocumentStore, TypedStoreExt};
use crate::validation::parse_id;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct RaceTracker {
    store: Arc<dyn DocumentStore>,
}

impl RaceTracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Tracker over a fresh, unpersisted in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDocumentStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    async fn load_event(&self, event_id: &str) -> Result<Event> {
        self.store
            .fetch(event_id)
            .await?
            .ok_or_else(|| RaceError::not_found(format!("Event '{event_id}' does not exist")))
    }

    /// Conditionally writes `mutate` against the version of `event` observed by the caller.
    async fn commit_event<F>(&self, event: &Event, mutate: F) -> Result<Event>
    where
        F: FnOnce(&mut Event) + Send + 'static,
    {
        self.store
            .update_if_match(&event.id, event.version, mutate)
            .await
            .map_err(|err| {
                warn!(event_id = %event.id, error = %err, "event write rejected");
                RaceError::from(err)
            })
    }
}

fn parse_event_id(event_id: &str) -> Result<String> {
    parse_id(event_id).ok_or_else(|| RaceError::invalid_input("Invalid eventID"))
}

fn require_batch(batch: Option<Vec<Value>>, field: &str) -> Result<Vec<Value>> {
    batch.ok_or_else(|| RaceError::invalid_input(format!("'{field}' is required")))
}
