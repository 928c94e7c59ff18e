use crate::core::{Event, Runner, Version};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two document kinds held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Event,
    Runner,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => f.write_str("event"),
            Self::Runner => f.write_str("runner"),
        }
    }
}

/// A document as the store sees it: kind-tagged, keyed by id, version-stamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "lowercase")]
pub enum StoredDocument {
    Event(Event),
    Runner(Runner),
}

impl StoredDocument {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Event(_) => DocumentKind::Event,
            Self::Runner(_) => DocumentKind::Runner,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Event(event) => &event.id,
            Self::Runner(runner) => &runner.id,
        }
    }

    pub fn version(&self) -> Version {
        match self {
            Self::Event(event) => event.version,
            Self::Runner(runner) => runner.version,
        }
    }

    /// Records a successful write. Only the store calls this.
    pub(crate) fn stamp(&mut self, version: Version, at: DateTime<Utc>) {
        match self {
            Self::Event(event) => {
                event.version = version;
                event.last_modified = at;
            }
            Self::Runner(runner) => {
                runner.version = version;
                runner.last_modified = at;
            }
        }
    }
}

/// Typed view over [`StoredDocument`], used by the typed store helpers.
pub trait Document: Clone + Send + Sync + 'static {
    const KIND: DocumentKind;

    fn id(&self) -> &str;
    fn version(&self) -> Version;
    fn into_stored(self) -> StoredDocument;
    fn from_stored(document: StoredDocument) -> Option<Self>;
    fn as_stored(document: &StoredDocument) -> Option<&Self>;
    fn as_stored_mut(document: &mut StoredDocument) -> Option<&mut Self>;
}

impl Document for Event {
    const KIND: DocumentKind = DocumentKind::Event;

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn into_stored(self) -> StoredDocument {
        StoredDocument::Event(self)
    }

    fn from_stored(document: StoredDocument) -> Option<Self> {
        match document {
            StoredDocument::Event(event) => Some(event),
            StoredDocument::Runner(_) => None,
        }
    }

    fn as_stored(document: &StoredDocument) -> Option<&Self> {
        match document {
            StoredDocument::Event(event) => Some(event),
            StoredDocument::Runner(_) => None,
        }
    }

    fn as_stored_mut(document: &mut StoredDocument) -> Option<&mut Self> {
        match document {
            StoredDocument::Event(event) => Some(event),
            StoredDocument::Runner(_) => None,
        }
    }
}

impl Document for Runner {
    const KIND: DocumentKind = DocumentKind::Runner;

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn into_stored(self) -> StoredDocument {
        StoredDocument::Runner(self)
    }

    fn from_stored(document: StoredDocument) -> Option<Self> {
        match document {
            StoredDocument::Runner(runner) => Some(runner),
            StoredDocument::Event(_) => None,
        }
    }

    fn as_stored(document: &StoredDocument) -> Option<&Self> {
        match document {
            StoredDocument::Runner(runner) => Some(runner),
            StoredDocument::Event(_) => None,
        }
    }

    fn as_stored_mut(document: &mut StoredDocument) -> Option<&mut Self> {
        match document {
            StoredDocument::Runner(runner) => Some(runner),
            StoredDocument::Event(_) => None,
        }
    }
}
