use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::Database;

/// Collection label reported by the health route.
pub const COLLECTION_NAME: &str = "qa-pairs";

/// Create the corpus database and its schema, then close it.
///
/// Used by `corpus init`. Idempotent.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let db = Database::new(config.db.clone());
    db.connect().await?;
    db.close().await?;
    Ok(())
}

/// Create tables and indexes if they do not exist.
///
/// The full document is kept as JSON in `body_json`; the other columns are
/// projections used by the taxonomy, listing and stats queries.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS qa_pairs (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            family TEXT NOT NULL,
            doc_type TEXT,
            context TEXT,
            category TEXT,
            source TEXT,
            attribution TEXT,
            prompt_tokens INTEGER,
            response_tokens INTEGER,
            total_tokens INTEGER,
            weighting INTEGER,
            created_at TEXT,
            body_json TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_qa_pairs_family ON qa_pairs(family, seq)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_qa_pairs_type_context ON qa_pairs(doc_type, context)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_qa_pairs_context_category ON qa_pairs(context, category)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
