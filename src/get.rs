//! `corpus get` and `corpus list`: read stored documents from the local
//! database and print them as JSON.

use anyhow::{bail, Result};

use qa_corpus_core::models::{DocumentFamily, StoredDocument};
use qa_corpus_core::store::Store;

use crate::config::Config;
use crate::server::effective_limit;
use crate::sqlite_store::SqliteStore;

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = SqliteStore::open(&config.db);
    let found = store.find_by_id(id).await;
    store.close().await?;

    let Some(doc) = found? else {
        bail!("document not found: {}", id);
    };
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

/// The oldest `limit` documents of `family`. A non-positive limit falls
/// back to the default, as on the HTTP list routes.
pub async fn list_documents(
    config: &Config,
    family: DocumentFamily,
    limit: i64,
) -> Result<Vec<StoredDocument>> {
    let store = SqliteStore::open(&config.db);
    let docs = store.find(Some(family), effective_limit(limit)).await;
    store.close().await?;
    docs
}

/// Print the oldest `limit` documents of `family`.
pub async fn run_list(config: &Config, family: DocumentFamily, limit: i64) -> Result<()> {
    let docs = list_documents(config, family, limit).await?;
    if docs.is_empty() {
        eprintln!("No {} documents stored.", family);
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&docs)?);
    Ok(())
}
