//! `corpus stats`: a summary of what the local database, or a running
//! server, holds.

use anyhow::Result;

use qa_corpus_core::stats::CollectionStats;
use qa_corpus_core::store::Store;

use crate::client::CorpusClient;
use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Query the local database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.db);
    let stats = store.stats().await?;
    let contexts = store.distinct_contexts(None).await?.len();
    let categories = store.distinct_categories(None).await?.len();
    store.close().await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    print_banner();
    println!("  Database:          {}", config.db.path.display());
    println!("  Size:              {}", format_bytes(db_size));
    print_summary(&stats, contexts, categories);
    Ok(())
}

/// Same summary, read from a running server's API.
pub async fn run_remote_stats(server: &str) -> Result<()> {
    let client = CorpusClient::new(server);
    let stats = client.stats().await?;
    let contexts = client.contexts(None).await?.len();
    let categories = client.categories(None).await?.len();

    print_banner();
    println!("  Server:            {}", server);
    print_summary(&stats, contexts, categories);
    Ok(())
}

fn print_banner() {
    println!("QA Corpus Database Stats");
    println!("========================");
    println!();
}

fn print_summary(stats: &CollectionStats, contexts: usize, categories: usize) {
    println!();
    println!("  Documents:         {}", stats.total_pairs);
    println!("  Contexts:          {}", contexts);
    println!("  Categories:        {}", categories);
    println!();
    println!("  Prompt tokens:     {}", stats.total_prompt_tokens);
    println!("  Response tokens:   {}", stats.total_response_tokens);
    println!("  Total tokens:      {}", stats.total_tokens);
    println!("  Average weight:    {:.2}", stats.average_weight);
    println!();
    println!(
        "  With source:       {} ({}%)",
        stats.with_source,
        percent(stats.with_source, stats.total_pairs)
    );
    println!(
        "  With attribution:  {} ({}%)",
        stats.with_attribution,
        percent(stats.with_attribution, stats.total_pairs)
    );
    println!();
}

fn percent(part: i64, whole: i64) -> i64 {
    if whole > 0 {
        (part * 100) / whole
    } else {
        0
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
