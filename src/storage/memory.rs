use super::document::{Document, DocumentKind, StoredDocument};
use super::engine::{DocumentStore, Mutation, Predicate, StoreError, StoreResult};
use super::persistence::{SnapshotManager, StoreSnapshot};
use crate::core::{Event, Runner, Version};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

type Collection = BTreeMap<String, StoredDocument>;

/// Periodic snapshot bookkeeping.
struct SnapshotSchedule {
    manager: SnapshotManager,
    every_ops: usize,
    ops_since_snapshot: usize,
}

/// Reference [`DocumentStore`]: one lock per document kind, optional on-disk snapshots.
///
/// Compare-and-swap is performed under the collection's write lock, so two
/// conditional updates against the same document can never both succeed with
/// the same expected version.
pub struct InMemoryDocumentStore {
    events: RwLock<Collection>,
    runners: RwLock<Collection>,
    snapshots: Option<Mutex<SnapshotSchedule>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Collection::new()),
            runners: RwLock::new(Collection::new()),
            snapshots: None,
        }
    }

    /// Opens a store backed by snapshots in `data_dir`, restoring the latest one if present.
    pub fn open<P: AsRef<Path>>(data_dir: P, snapshot_every_ops: usize) -> StoreResult<Self> {
        let manager = SnapshotManager::in_dir(data_dir);
        let mut events = Collection::new();
        let mut runners = Collection::new();

        if let Some(snapshot) = manager.load()? {
            info!(
                path = %manager.path().display(),
                documents = snapshot.metadata.document_count,
                "restored document snapshot"
            );
            for event in snapshot.events {
                events.insert(event.id.clone(), event.into_stored());
            }
            for runner in snapshot.runners {
                runners.insert(runner.id.clone(), runner.into_stored());
            }
        }

        Ok(Self {
            events: RwLock::new(events),
            runners: RwLock::new(runners),
            snapshots: Some(Mutex::new(SnapshotSchedule {
                manager,
                every_ops: snapshot_every_ops.max(1),
                ops_since_snapshot: 0,
            })),
        })
    }

    fn collection(&self, kind: DocumentKind) -> &RwLock<Collection> {
        match kind {
            DocumentKind::Event => &self.events,
            DocumentKind::Runner => &self.runners,
        }
    }

    /// Number of stored documents of `kind`.
    pub async fn count(&self, kind: DocumentKind) -> usize {
        self.collection(kind).read().await.len()
    }

    /// Writes a snapshot now, regardless of the schedule. No-op for a purely in-memory store.
    pub async fn flush(&self) -> StoreResult<()> {
        let Some(schedule) = &self.snapshots else {
            return Ok(());
        };
        let mut schedule = schedule.lock().await;
        self.write_snapshot(&schedule.manager).await?;
        schedule.ops_since_snapshot = 0;
        Ok(())
    }

    async fn write_snapshot(&self, manager: &SnapshotManager) -> StoreResult<()> {
        let events: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .cloned()
            .filter_map(Event::from_stored)
            .collect();
        let runners: Vec<Runner> = self
            .runners
            .read()
            .await
            .values()
            .cloned()
            .filter_map(Runner::from_stored)
            .collect();
        let snapshot = StoreSnapshot::new(events, runners);
        manager.save(&snapshot)?;
        debug!(
            path = %manager.path().display(),
            documents = snapshot.metadata.document_count,
            "document snapshot written"
        );
        Ok(())
    }

    /// Counts a successful write and snapshots when the schedule says so.
    ///
    /// A failed snapshot never fails the write that triggered it.
    async fn record_write(&self) {
        let Some(schedule) = &self.snapshots else {
            return;
        };
        let mut schedule = schedule.lock().await;
        schedule.ops_since_snapshot += 1;
        if schedule.ops_since_snapshot < schedule.every_ops {
            return;
        }
        match self.write_snapshot(&schedule.manager).await {
            Ok(()) => schedule.ops_since_snapshot = 0,
            Err(err) => warn!(error = %err, "document snapshot failed"),
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, kind: DocumentKind, id: &str) -> StoreResult<Option<StoredDocument>> {
        Ok(self.collection(kind).read().await.get(id).cloned())
    }

    async fn create(&self, document: StoredDocument) -> StoreResult<StoredDocument> {
        let kind = document.kind();
        let id = document.id().to_string();
        {
            let mut collection = self.collection(kind).write().await;
            if collection.contains_key(&id) {
                return Err(StoreError::DuplicateId { kind, id });
            }
            collection.insert(id, document.clone());
        }
        self.record_write().await;
        Ok(document)
    }

    async fn conditional_update(
        &self,
        kind: DocumentKind,
        id: &str,
        expected: Version,
        mutation: Mutation,
    ) -> StoreResult<StoredDocument> {
        let updated = {
            let mut collection = self.collection(kind).write().await;
            let current = collection.get(id).ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })?;

            let actual = current.version();
            if actual != expected {
                return Err(StoreError::VersionConflict {
                    kind,
                    id: id.to_string(),
                    expected,
                    actual,
                });
            }

            let mut next = current.clone();
            mutation(&mut next);
            if next.kind() != kind || next.id() != id {
                return Err(StoreError::InvalidMutation {
                    kind,
                    id: id.to_string(),
                });
            }
            next.stamp(expected.next(), Utc::now());
            collection.insert(id.to_string(), next.clone());
            next
        };
        self.record_write().await;
        Ok(updated)
    }

    async fn query(
        &self,
        kind: DocumentKind,
        predicate: Predicate<'_>,
    ) -> StoreResult<Vec<StoredDocument>> {
        let collection = self.collection(kind).read().await;
        Ok(collection
            .values()
            .filter(|document| predicate(document))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> StoreResult<Vec<StoredDocument>> {
        let mut documents: Vec<StoredDocument> =
            self.events.read().await.values().cloned().collect();
        documents.extend(self.runners.read().await.values().cloned());
        Ok(documents)
    }

    async fn delete_all(&self) -> StoreResult<usize> {
        let removed = {
            let mut events = self.events.write().await;
            let mut runners = self.runners.write().await;
            let removed = events.len() + runners.len();
            events.clear();
            runners.clear();
            removed
        };
        self.record_write().await;
        Ok(removed)
    }
}
