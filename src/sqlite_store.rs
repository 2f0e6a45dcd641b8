//! SQLite-backed [`Store`] implementation.
//!
//! Every operation goes through [`Database::connect`], so the pool is opened
//! on first use and shared afterwards. Documents are stored as JSON in
//! `body_json` alongside the projected columns that the taxonomy, listing
//! and statistics queries filter and aggregate on.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use qa_corpus_core::models::{Document, DocumentFamily, DocumentId, StoredDocument};
use qa_corpus_core::stats::CollectionStats;
use qa_corpus_core::store::Store;

use crate::config::DbConfig;
use crate::db::Database;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Build an unconnected store for the database described by `config`.
    pub fn open(config: &DbConfig) -> Self {
        Self::new(Arc::new(Database::new(config.clone())))
    }
}

fn row_to_stored(row: &SqliteRow) -> Result<StoredDocument> {
    let id: String = row.get("id");
    let body: String = row.get("body_json");
    let document: Document = serde_json::from_str(&body)
        .with_context(|| format!("corrupt document body for id {}", id))?;
    Ok(StoredDocument {
        id: DocumentId::parse(&id)?,
        document,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_many(&self, docs: &[Document]) -> Result<Vec<DocumentId>> {
        let pool = self.db.connect().await?;
        let mut tx = pool.begin().await?;
        let mut ids = Vec::with_capacity(docs.len());

        for doc in docs {
            let id = DocumentId::generate();
            let body = serde_json::to_string(doc)?;
            let meta = doc.training_metadata();

            sqlx::query(
                r#"
                INSERT INTO qa_pairs (id, family, doc_type, context, category, source,
                                      attribution, prompt_tokens, response_tokens,
                                      total_tokens, weighting, created_at, body_json)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(doc.family().as_str())
            .bind(doc.doc_type())
            .bind(doc.context())
            .bind(doc.category())
            .bind(doc.source())
            .bind(doc.attribution())
            .bind(meta.map(|m| m.prompt_tokens() as i64))
            .bind(meta.map(|m| m.response_tokens() as i64))
            .bind(meta.map(|m| m.total_tokens() as i64))
            .bind(meta.map(|m| i64::from(m.weighting())))
            .bind(doc.created_at())
            .bind(&body)
            .execute(&mut *tx)
            .await?;

            ids.push(id);
        }

        tx.commit().await?;
        Ok(ids)
    }

    async fn find(
        &self,
        family: Option<DocumentFamily>,
        limit: i64,
    ) -> Result<Vec<StoredDocument>> {
        let pool = self.db.connect().await?;
        let family = family.map(|f| f.as_str());

        let rows = sqlx::query(
            r#"
            SELECT id, body_json FROM qa_pairs
            WHERE (? IS NULL OR family = ?)
            ORDER BY seq ASC
            LIMIT ?
            "#,
        )
        .bind(family)
        .bind(family)
        .bind(limit.max(0))
        .fetch_all(&pool)
        .await?;

        rows.iter().map(row_to_stored).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredDocument>> {
        let id = DocumentId::parse(id)?;
        let pool = self.db.connect().await?;

        let row = sqlx::query("SELECT id, body_json FROM qa_pairs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&pool)
            .await?;

        row.as_ref().map(row_to_stored).transpose()
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let id = DocumentId::parse(id)?;
        let pool = self.db.connect().await?;

        let result = sqlx::query("DELETE FROM qa_pairs WHERE id = ?")
            .bind(id.to_string())
            .execute(&pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn distinct_contexts(&self, doc_type: Option<&str>) -> Result<Vec<String>> {
        let pool = self.db.connect().await?;
        let names = sqlx::query_scalar(
            r#"
            SELECT DISTINCT context FROM qa_pairs
            WHERE context IS NOT NULL AND (? IS NULL OR doc_type = ?)
            ORDER BY context ASC
            "#,
        )
        .bind(doc_type)
        .bind(doc_type)
        .fetch_all(&pool)
        .await?;
        Ok(names)
    }

    async fn distinct_categories(&self, context: Option<&str>) -> Result<Vec<String>> {
        let pool = self.db.connect().await?;
        let names = sqlx::query_scalar(
            r#"
            SELECT DISTINCT category FROM qa_pairs
            WHERE category IS NOT NULL AND (? IS NULL OR context = ?)
            ORDER BY category ASC
            "#,
        )
        .bind(context)
        .bind(context)
        .fetch_all(&pool)
        .await?;
        Ok(names)
    }

    async fn stats(&self) -> Result<CollectionStats> {
        let pool = self.db.connect().await?;
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_pairs,
                COALESCE(SUM(prompt_tokens), 0) AS total_prompt_tokens,
                COALESCE(SUM(response_tokens), 0) AS total_response_tokens,
                COALESCE(SUM(total_tokens), 0) AS total_tokens,
                COALESCE(AVG(weighting), 0.0) AS average_weight,
                COUNT(source) AS with_source,
                COUNT(attribution) AS with_attribution
            FROM qa_pairs
            "#,
        )
        .fetch_one(&pool)
        .await?;

        Ok(CollectionStats {
            total_pairs: row.get("total_pairs"),
            total_prompt_tokens: row.get("total_prompt_tokens"),
            total_response_tokens: row.get("total_response_tokens"),
            total_tokens: row.get("total_tokens"),
            average_weight: row.get("average_weight"),
            with_source: row.get("with_source"),
            with_attribution: row.get("with_attribution"),
        })
    }

    async fn ping(&self) -> Result<()> {
        let pool = self.db.connect().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.db.close().await
    }
}
