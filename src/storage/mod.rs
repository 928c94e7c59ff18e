pub mod document;
pub mod engine;
pub mod memory;
pub mod persistence;

pub use document::{Document, DocumentKind, StoredDocument};
pub use engine::{DocumentStore, Mutation, Predicate, StoreError, StoreResult, TypedStoreExt};
pub use memory::InMemoryDocumentStore;
pub use persistence::{SnapshotManager, StoreSnapshot};
