//! In-memory [`Store`] implementation for tests and ephemeral runs.
//!
//! Documents live in a `Vec` behind `std::sync::RwLock`, in insertion
//! order. Statistics are folded in-process with
//! [`CollectionStats::from_documents`].

use std::collections::BTreeSet;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Document, DocumentFamily, DocumentId, StoredDocument};
use crate::stats::CollectionStats;

use super::Store;

/// In-memory store.
pub struct InMemoryStore {
    docs: RwLock<Vec<StoredDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_many(&self, docs: &[Document]) -> Result<Vec<DocumentId>> {
        let mut stored = self.docs.write().map_err(poisoned)?;
        let ids: Vec<DocumentId> = docs.iter().map(|_| DocumentId::generate()).collect();
        stored.extend(ids.iter().zip(docs).map(|(id, doc)| StoredDocument {
            id: *id,
            document: doc.clone(),
        }));
        Ok(ids)
    }

    async fn find(
        &self,
        family: Option<DocumentFamily>,
        limit: i64,
    ) -> Result<Vec<StoredDocument>> {
        let stored = self.docs.read().map_err(poisoned)?;
        Ok(stored
            .iter()
            .filter(|s| family.map_or(true, |f| s.document.family() == f))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredDocument>> {
        let id = DocumentId::parse(id)?;
        let stored = self.docs.read().map_err(poisoned)?;
        Ok(stored.iter().find(|s| s.id == id).cloned())
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let id = DocumentId::parse(id)?;
        let mut stored = self.docs.write().map_err(poisoned)?;
        let before = stored.len();
        stored.retain(|s| s.id != id);
        Ok(stored.len() != before)
    }

    async fn distinct_contexts(&self, doc_type: Option<&str>) -> Result<Vec<String>> {
        let stored = self.docs.read().map_err(poisoned)?;
        let names: BTreeSet<String> = stored
            .iter()
            .filter(|s| doc_type.map_or(true, |t| s.document.doc_type() == Some(t)))
            .filter_map(|s| s.document.context().map(str::to_string))
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn distinct_categories(&self, context: Option<&str>) -> Result<Vec<String>> {
        let stored = self.docs.read().map_err(poisoned)?;
        let names: BTreeSet<String> = stored
            .iter()
            .filter(|s| context.map_or(true, |c| s.document.context() == Some(c)))
            .filter_map(|s| s.document.category().map(str::to_string))
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn stats(&self) -> Result<CollectionStats> {
        let stored = self.docs.read().map_err(poisoned)?;
        Ok(CollectionStats::from_documents(
            stored.iter().map(|s| &s.document),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FaqDocument, InvalidDocumentId, ReversePromptDocument};

    fn faq(context: &str, category: &str) -> Document {
        FaqDocument {
            context: context.to_string(),
            category: category.to_string(),
            subcategory: None,
            prompt: "What is protein?".to_string(),
            response: "A macronutrient.".to_string(),
            source: None,
            attribution: None,
            created_at: None,
        }
        .into()
    }

    fn reverse_prompt(context: &str, category: &str) -> Document {
        ReversePromptDocument {
            name: "log-meal".to_string(),
            context: context.to_string(),
            category: category.to_string(),
            subcategory: None,
            prompt: "I had oatmeal".to_string(),
            action: "log_meal".to_string(),
            next_prompt: "Anything else?".to_string(),
            source: None,
            attribution: None,
            created_at: None,
        }
        .into()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryStore::new();
        let ids = store
            .insert_many(&[faq("nutrition", "basics"), faq("fitness", "cardio")])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);

        let found = store.find(None, 10).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, ids[0]);

        let limited = store.find(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_id_and_delete() {
        let store = InMemoryStore::new();
        let ids = store.insert_many(&[faq("nutrition", "basics")]).await.unwrap();
        let id = ids[0].to_string();

        assert!(store.find_by_id(&id).await.unwrap().is_some());
        assert!(store.delete_by_id(&id).await.unwrap());
        assert!(!store.delete_by_id(&id).await.unwrap());
        assert!(store.find_by_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_id_is_typed_error() {
        let store = InMemoryStore::new();
        let err = store.find_by_id("42").await.unwrap_err();
        assert!(err.downcast_ref::<InvalidDocumentId>().is_some());
    }

    #[tokio::test]
    async fn test_distinct_contexts_filtered_by_type() {
        let store = InMemoryStore::new();
        store
            .insert_many(&[
                faq("nutrition", "basics"),
                faq("nutrition", "vitamins"),
                faq("fitness", "cardio"),
                reverse_prompt("tracking", "meals"),
            ])
            .await
            .unwrap();

        assert_eq!(
            store.distinct_contexts(Some("faq")).await.unwrap(),
            vec!["fitness", "nutrition"]
        );
        assert_eq!(
            store.distinct_contexts(None).await.unwrap(),
            vec!["fitness", "nutrition", "tracking"]
        );
        assert_eq!(
            store.distinct_categories(Some("nutrition")).await.unwrap(),
            vec!["basics", "vitamins"]
        );
    }
}
