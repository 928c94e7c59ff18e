//! Snapshot persistence for the in-memory document store.

use super::engine::{StoreError, StoreResult};
use crate::core::{Event, Runner};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_FILE_NAME: &str = "race-tracker.snapshot";
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Store Snapshot
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub format_version: u32,
    pub events: Vec<Event>,
    pub runners: Vec<Runner>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub document_count: usize,
}

impl StoreSnapshot {
    pub fn new(events: Vec<Event>, runners: Vec<Runner>) -> Self {
        let document_count = events.len() + runners.len();
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            events,
            runners,
            metadata: SnapshotMetadata {
                created_at: Utc::now(),
                document_count,
            },
        }
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Manager for the default snapshot file inside `data_dir`.
    pub fn in_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir.as_ref().join(SNAPSHOT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Wraps an I/O or codec failure with the snapshot path and format.
    fn failure<E: std::fmt::Display>(
        &self,
        action: &'static str,
    ) -> impl FnOnce(E) -> StoreError + '_ {
        move |err| {
            StoreError::Snapshot(format!(
                "cannot {action} v{SNAPSHOT_FORMAT_VERSION} snapshot at {}: {err}",
                self.snapshot_path.display()
            ))
        }
    }

    /// Encodes before touching disk, then writes a synced temp file and renames it into place.
    pub fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()> {
        let encoded = rmp_serde::to_vec_named(snapshot).map_err(self.failure("encode"))?;
        if let Some(parent) = self.snapshot_path.parent() {
            fs::create_dir_all(parent).map_err(self.failure("create directory for"))?;
        }

        let temp_path = self.snapshot_path.with_extension("tmp");
        let mut temp_file = File::create(&temp_path).map_err(self.failure("stage"))?;
        temp_file.write_all(&encoded).map_err(self.failure("write"))?;
        temp_file.sync_all().map_err(self.failure("sync"))?;
        fs::rename(&temp_path, &self.snapshot_path).map_err(self.failure("install"))?;
        Ok(())
    }

    /// `Ok(None)` when no snapshot has been written yet.
    pub fn load(&self) -> StoreResult<Option<StoreSnapshot>> {
        let data = match fs::read(&self.snapshot_path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.failure("read")(err)),
        };
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data).map_err(self.failure("decode"))?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(self.failure("load")(format!(
                "file has format version {}",
                snapshot.format_version
            )));
        }
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }
}
