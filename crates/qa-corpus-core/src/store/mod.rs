//! Storage abstraction for the corpus.
//!
//! The [`Store`] trait is the persistence adapter seen by the ingestion
//! pipeline and the HTTP handlers. Backends own their connection lifecycle;
//! callers only ever see the trait.
//!
//! Implementations must be `Send + Sync`: a single store is shared by every
//! in-flight request.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, DocumentFamily, DocumentId, StoredDocument};
use crate::stats::CollectionStats;

/// Abstract document store.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_many`](Store::insert_many) | Insert a batch atomically |
/// | [`find`](Store::find) | Oldest-first listing with a limit |
/// | [`find_by_id`](Store::find_by_id) | Lookup by external id string |
/// | [`delete_by_id`](Store::delete_by_id) | Delete by external id string |
/// | [`distinct_contexts`](Store::distinct_contexts) | Taxonomy: contexts, optionally by type |
/// | [`distinct_categories`](Store::distinct_categories) | Taxonomy: categories, optionally by context |
/// | [`stats`](Store::stats) | Aggregate statistics |
/// | [`ping`](Store::ping) | Connectivity check for health reporting |
/// | [`close`](Store::close) | Release the underlying connection |
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert every document or none of them.
    ///
    /// Returns the store-assigned ids in input order.
    async fn insert_many(&self, docs: &[Document]) -> Result<Vec<DocumentId>>;

    /// List stored documents in insertion order, optionally restricted to
    /// one family.
    async fn find(&self, family: Option<DocumentFamily>, limit: i64)
        -> Result<Vec<StoredDocument>>;

    /// Look up a document by the external form of its id.
    ///
    /// A malformed id fails with [`InvalidDocumentId`](crate::models::InvalidDocumentId);
    /// a well-formed unknown id is `Ok(None)`.
    async fn find_by_id(&self, id: &str) -> Result<Option<StoredDocument>>;

    /// Delete a document by the external form of its id.
    ///
    /// Returns `true` if a document was removed.
    async fn delete_by_id(&self, id: &str) -> Result<bool>;

    /// Distinct `context` values, sorted, optionally only from documents of
    /// the given `type`.
    async fn distinct_contexts(&self, doc_type: Option<&str>) -> Result<Vec<String>>;

    /// Distinct `category` values, sorted, optionally only from documents
    /// with the given `context`.
    async fn distinct_categories(&self, context: Option<&str>) -> Result<Vec<String>>;

    async fn stats(&self) -> Result<CollectionStats>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Release the backend's connection. Safe to call more than once.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
