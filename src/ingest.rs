//! Batch ingestion.
//!
//! One request body becomes one call to [`ingest_batch`]: every draft is
//! validated, stamped with the batch timestamp and handed to the store in a
//! single [`Store::insert_many`]. A batch is accepted whole or not at all.

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use qa_corpus_core::models::{DocumentFamily, DocumentId, DraftDocument};
use qa_corpus_core::store::Store;
use qa_corpus_core::validate::{validate_batch, BatchError};

/// Outcome of an accepted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted_count: usize,
    pub ids: Vec<DocumentId>,
}

impl IngestReport {
    pub fn message(&self) -> String {
        format!("Successfully inserted {} QA pairs", self.inserted_count)
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// The client sent a bad batch. Nothing was written.
    #[error(transparent)]
    Rejected(#[from] BatchError),

    #[error("Failed to insert QA pairs: {0}")]
    Store(anyhow::Error),
}

/// Current time in the form stored in `created_at`, e.g. `2024-05-01T12:00:00.000Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Validate and persist one batch of drafts submitted under `family`.
pub async fn ingest_batch(
    store: &dyn Store,
    family: DocumentFamily,
    drafts: &[DraftDocument],
) -> Result<IngestReport, IngestError> {
    let mut docs = validate_batch(family, drafts).map_err(|e| {
        tracing::warn!(family = %family, error = %e, "rejected batch");
        e
    })?;

    let now = timestamp_now();
    for doc in docs.iter_mut() {
        doc.stamp_created_at(&now);
    }

    let ids = store.insert_many(&docs).await.map_err(|e| {
        tracing::error!(family = %family, error = %e, "batch insert failed");
        IngestError::Store(e)
    })?;

    tracing::info!(family = %family, count = ids.len(), "inserted batch");
    Ok(IngestReport {
        inserted_count: ids.len(),
        ids,
    })
}
