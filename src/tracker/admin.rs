use super::RaceTracker;
use super::outcome::{DeleteAllOutcome, StoreContents};
use crate::core::Result;
use crate::storage::StoredDocument;
use tracing::warn;

impl RaceTracker {
    /// Every event and runner in the store.
    pub async fn get_all(&self) -> Result<StoreContents> {
        let mut contents = StoreContents {
            events: Vec::new(),
            runners: Vec::new(),
        };
        for document in self.store.list_all().await? {
            match document {
                StoredDocument::Event(event) => contents.events.push(event),
                StoredDocument::Runner(runner) => contents.runners.push(runner),
            }
        }
        Ok(contents)
    }

    /// Wipes the whole store.
    pub async fn delete_all(&self) -> Result<DeleteAllOutcome> {
        let deleted = self.store.delete_all().await?;
        warn!(deleted, "all documents deleted");
        Ok(DeleteAllOutcome { deleted })
    }
}
