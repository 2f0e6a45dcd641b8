//! `corpus contexts` and `corpus categories`.
//!
//! Both read the local database unless a server URL is given, in which case
//! the names come from the server's taxonomy routes.

use anyhow::Result;

use qa_corpus_core::models::TaxonomyEntry;
use qa_corpus_core::store::Store;

use crate::client::CorpusClient;
use crate::config::Config;
use crate::sqlite_store::SqliteStore;

pub async fn run_contexts(
    config: &Config,
    doc_type: Option<&str>,
    server: Option<&str>,
) -> Result<()> {
    let names = match server {
        Some(url) => entry_names(CorpusClient::new(url).contexts(doc_type).await?),
        None => {
            let store = SqliteStore::open(&config.db);
            let names = store.distinct_contexts(doc_type).await;
            store.close().await?;
            names?
        }
    };
    print_names(&names);
    Ok(())
}

pub async fn run_categories(
    config: &Config,
    context: Option<&str>,
    server: Option<&str>,
) -> Result<()> {
    let names = match server {
        Some(url) => entry_names(CorpusClient::new(url).categories(context).await?),
        None => {
            let store = SqliteStore::open(&config.db);
            let names = store.distinct_categories(context).await;
            store.close().await?;
            names?
        }
    };
    print_names(&names);
    Ok(())
}

/// Print a server's health body. Exits non-zero when the server reports
/// its store unavailable.
pub async fn run_health(server: &str) -> Result<()> {
    let body = CorpusClient::new(server).health().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if body["status"] != "healthy" {
        anyhow::bail!("server at {} is unhealthy", server);
    }
    Ok(())
}

fn entry_names(entries: Vec<TaxonomyEntry>) -> Vec<String> {
    entries.into_iter().map(|e| e.name).collect()
}

fn print_names(names: &[String]) {
    if names.is_empty() {
        println!("(none)");
    }
    for name in names {
        println!("{}", name);
    }
}
