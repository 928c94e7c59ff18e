use super::document::{Document, DocumentKind, StoredDocument};
use crate::core::Version;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: DocumentKind, id: String },

    #[error("{kind} '{id}' was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict {
        kind: DocumentKind,
        id: String,
        expected: Version,
        actual: Version,
    },

    #[error("{kind} '{id}' already exists")]
    DuplicateId { kind: DocumentKind, id: String },

    #[error("mutation of {kind} '{id}' changed its identity")]
    InvalidMutation { kind: DocumentKind, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// In-place change applied by the store to a private copy of the current document.
pub type Mutation = Box<dyn FnOnce(&mut StoredDocument) + Send>;

pub type Predicate<'a> = &'a (dyn Fn(&StoredDocument) -> bool + Send + Sync);

/// Key-indexed document store - allows pluggable storage backends.
///
/// The only write primitive that touches an existing document is
/// [`conditional_update`](DocumentStore::conditional_update), a single-document
/// compare-and-swap on the version stamp. Implementations advance the version
/// and refresh the modification time themselves; mutations never see a
/// half-applied state.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by kind and exact id.
    async fn get(&self, kind: DocumentKind, id: &str) -> StoreResult<Option<StoredDocument>>;

    /// Insert a document whose id was assigned by the caller.
    async fn create(&self, document: StoredDocument) -> StoreResult<StoredDocument>;

    /// Apply `mutation` if the stored version still equals `expected`.
    async fn conditional_update(
        &self,
        kind: DocumentKind,
        id: &str,
        expected: Version,
        mutation: Mutation,
    ) -> StoreResult<StoredDocument>;

    /// All documents of `kind` matching `predicate`.
    async fn query(
        &self,
        kind: DocumentKind,
        predicate: Predicate<'_>,
    ) -> StoreResult<Vec<StoredDocument>>;

    /// Every document in the store (administrative).
    async fn list_all(&self) -> StoreResult<Vec<StoredDocument>>;

    /// Remove every document, returning how many were removed (administrative).
    async fn delete_all(&self) -> StoreResult<usize>;
}

/// Typed helpers over any [`DocumentStore`].
#[async_trait]
pub trait TypedStoreExt: DocumentStore {
    async fn fetch<D: Document>(&self, id: &str) -> StoreResult<Option<D>> {
        Ok(self.get(D::KIND, id).await?.and_then(D::from_stored))
    }

    async fn insert<D: Document>(&self, document: D) -> StoreResult<D> {
        let id = document.id().to_string();
        let stored = self.create(document.into_stored()).await?;
        D::from_stored(stored).ok_or(StoreError::InvalidMutation { kind: D::KIND, id })
    }

    async fn update_if_match<D, F>(&self, id: &str, expected: Version, mutate: F) -> StoreResult<D>
    where
        D: Document,
        F: FnOnce(&mut D) + Send + 'static,
    {
        let mutation: Mutation = Box::new(move |document: &mut StoredDocument| {
            if let Some(typed) = D::as_stored_mut(document) {
                mutate(typed);
            }
        });
        let stored = self
            .conditional_update(D::KIND, id, expected, mutation)
            .await?;
        D::from_stored(stored).ok_or_else(|| StoreError::InvalidMutation {
            kind: D::KIND,
            id: id.to_string(),
        })
    }

    async fn find<D, P>(&self, predicate: P) -> StoreResult<Vec<D>>
    where
        D: Document,
        P: Fn(&D) -> bool + Send + Sync,
    {
        let filter = move |document: &StoredDocument| D::as_stored(document).is_some_and(&predicate);
        let found = self.query(D::KIND, &filter).await?;
        Ok(found.into_iter().filter_map(D::from_stored).collect())
    }
}

impl<S: DocumentStore + ?Sized> TypedStoreExt for S {}
