//! Core data models for the training corpus.
//!
//! Three document shapes flow through the pipeline:
//!
//! | Shape | Wire discriminator | Rust type |
//! |-------|--------------------|-----------|
//! | FAQ | `"type": "faq"` | [`FaqDocument`] |
//! | Reverse-prompt | `"type": "reverse-prompt"` | [`ReversePromptDocument`] |
//! | Generic QA pair | none | [`QaPairDocument`] |
//!
//! FAQ and reverse-prompt documents form the internally tagged
//! [`TypedDocument`]; [`Document`] wraps that and the untagged QA pair.
//!
//! Documents arriving over the wire are first parsed into a lenient
//! [`DraftDocument`] (every field optional) and only become a [`Document`]
//! by passing through [`crate::validate`].

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::tokens::TrainingMetadata;

/// Discriminator value for FAQ documents.
pub const FAQ_TYPE: &str = "faq";
/// Discriminator value for reverse-prompt documents.
pub const REVERSE_PROMPT_TYPE: &str = "reverse-prompt";

/// The ingestion family a document belongs to.
///
/// Each family has its own insert route and listing route; a single batch
/// never mixes families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentFamily {
    /// FAQ and reverse-prompt documents (`/api/insert-promptme`).
    PromptMe,
    /// Generic QA pairs with training metadata (`/api/insert-qa-pairs`).
    QaPair,
}

impl DocumentFamily {
    /// Stable string stored in the `family` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFamily::PromptMe => "promptme",
            DocumentFamily::QaPair => "qa-pair",
        }
    }
}

impl fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqDocument {
    pub context: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub prompt: String,
    pub response: String,
    pub source: Option<String>,
    pub attribution: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversePromptDocument {
    /// Slug identifier, e.g. `log-meal`.
    pub name: String,
    pub context: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub prompt: String,
    pub action: String,
    #[serde(rename = "next-prompt")]
    pub next_prompt: String,
    pub source: Option<String>,
    pub attribution: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPairDocument {
    pub prompt: String,
    pub response: String,
    pub source: Option<String>,
    pub attribution: Option<String>,
    pub training_metadata: TrainingMetadata,
    pub created_at: Option<String>,
}

/// A document carrying a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TypedDocument {
    #[serde(rename = "faq")]
    Faq(FaqDocument),
    #[serde(rename = "reverse-prompt")]
    ReversePrompt(ReversePromptDocument),
}

/// A fully shaped, validated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    Typed(TypedDocument),
    QaPair(QaPairDocument),
}

impl Document {
    pub fn family(&self) -> DocumentFamily {
        match self {
            Document::Typed(_) => DocumentFamily::PromptMe,
            Document::QaPair(_) => DocumentFamily::QaPair,
        }
    }

    /// The `type` discriminator, or `None` for generic QA pairs.
    pub fn doc_type(&self) -> Option<&'static str> {
        match self {
            Document::Typed(TypedDocument::Faq(_)) => Some(FAQ_TYPE),
            Document::Typed(TypedDocument::ReversePrompt(_)) => Some(REVERSE_PROMPT_TYPE),
            Document::QaPair(_) => None,
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            Document::Typed(TypedDocument::Faq(d)) => Some(&d.context),
            Document::Typed(TypedDocument::ReversePrompt(d)) => Some(&d.context),
            Document::QaPair(_) => None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Document::Typed(TypedDocument::Faq(d)) => Some(&d.category),
            Document::Typed(TypedDocument::ReversePrompt(d)) => Some(&d.category),
            Document::QaPair(_) => None,
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            Document::Typed(TypedDocument::Faq(d)) => &d.prompt,
            Document::Typed(TypedDocument::ReversePrompt(d)) => &d.prompt,
            Document::QaPair(d) => &d.prompt,
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            Document::Typed(TypedDocument::Faq(d)) => d.source.as_deref(),
            Document::Typed(TypedDocument::ReversePrompt(d)) => d.source.as_deref(),
            Document::QaPair(d) => d.source.as_deref(),
        }
    }

    pub fn attribution(&self) -> Option<&str> {
        match self {
            Document::Typed(TypedDocument::Faq(d)) => d.attribution.as_deref(),
            Document::Typed(TypedDocument::ReversePrompt(d)) => d.attribution.as_deref(),
            Document::QaPair(d) => d.attribution.as_deref(),
        }
    }

    pub fn training_metadata(&self) -> Option<&TrainingMetadata> {
        match self {
            Document::QaPair(d) => Some(&d.training_metadata),
            Document::Typed(_) => None,
        }
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at_slot().as_deref()
    }

    /// Set `created_at` unless the document already carries one.
    ///
    /// Returns `true` if the timestamp was written.
    pub fn stamp_created_at(&mut self, timestamp: &str) -> bool {
        let slot = self.created_at_slot_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(timestamp.to_string());
        true
    }

    fn created_at_slot(&self) -> &Option<String> {
        match self {
            Document::Typed(TypedDocument::Faq(d)) => &d.created_at,
            Document::Typed(TypedDocument::ReversePrompt(d)) => &d.created_at,
            Document::QaPair(d) => &d.created_at,
        }
    }

    fn created_at_slot_mut(&mut self) -> &mut Option<String> {
        match self {
            Document::Typed(TypedDocument::Faq(d)) => &mut d.created_at,
            Document::Typed(TypedDocument::ReversePrompt(d)) => &mut d.created_at,
            Document::QaPair(d) => &mut d.created_at,
        }
    }
}

impl From<FaqDocument> for Document {
    fn from(doc: FaqDocument) -> Self {
        Document::Typed(TypedDocument::Faq(doc))
    }
}

impl From<ReversePromptDocument> for Document {
    fn from(doc: ReversePromptDocument) -> Self {
        Document::Typed(TypedDocument::ReversePrompt(doc))
    }
}

impl From<QaPairDocument> for Document {
    fn from(doc: QaPairDocument) -> Self {
        Document::QaPair(doc)
    }
}

/// Lenient wire form of a document, before validation.
///
/// Field names match the JSON documents posted by clients. Nothing here is
/// trusted: [`crate::validate`] decides which fields are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftDocument {
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub name: Option<String>,
    pub context: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub prompt: Option<String>,
    pub response: Option<String>,
    pub action: Option<String>,
    #[serde(rename = "next-prompt")]
    pub next_prompt: Option<String>,
    pub source: Option<String>,
    pub attribution: Option<String>,
    pub training_metadata: Option<DraftTrainingMetadata>,
    pub created_at: Option<String>,
}

/// The only client-supplied part of training metadata that survives
/// validation. Token counts are always recomputed from the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftTrainingMetadata {
    pub weighting: Option<u32>,
}

impl From<&Document> for DraftDocument {
    fn from(doc: &Document) -> Self {
        match doc {
            Document::Typed(TypedDocument::Faq(d)) => DraftDocument {
                doc_type: Some(FAQ_TYPE.to_string()),
                context: Some(d.context.clone()),
                category: Some(d.category.clone()),
                subcategory: d.subcategory.clone(),
                prompt: Some(d.prompt.clone()),
                response: Some(d.response.clone()),
                source: d.source.clone(),
                attribution: d.attribution.clone(),
                created_at: d.created_at.clone(),
                ..Default::default()
            },
            Document::Typed(TypedDocument::ReversePrompt(d)) => DraftDocument {
                doc_type: Some(REVERSE_PROMPT_TYPE.to_string()),
                name: Some(d.name.clone()),
                context: Some(d.context.clone()),
                category: Some(d.category.clone()),
                subcategory: d.subcategory.clone(),
                prompt: Some(d.prompt.clone()),
                action: Some(d.action.clone()),
                next_prompt: Some(d.next_prompt.clone()),
                source: d.source.clone(),
                attribution: d.attribution.clone(),
                created_at: d.created_at.clone(),
                ..Default::default()
            },
            Document::QaPair(d) => DraftDocument {
                prompt: Some(d.prompt.clone()),
                response: Some(d.response.clone()),
                source: d.source.clone(),
                attribution: d.attribution.clone(),
                training_metadata: Some(DraftTrainingMetadata {
                    weighting: Some(d.training_metadata.weighting()),
                }),
                created_at: d.created_at.clone(),
                ..Default::default()
            },
        }
    }
}

/// Store-assigned document identity.
///
/// Stored natively as a UUID; the external form is its hyphenated string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Allocate a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Translate the external string form into a native identity.
    pub fn parse(input: &str) -> Result<Self, InvalidDocumentId> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|_| InvalidDocumentId(input.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Returned when an external id string is not a valid document identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid document id: '{0}'")]
pub struct InvalidDocumentId(pub String);

/// A persisted document together with its identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    #[serde(flatten)]
    pub document: Document,
}

/// One entry of a taxonomy listing (`[{ "name": "nutrition" }, ...]`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub name: String,
}

impl From<String> for TaxonomyEntry {
    fn from(name: String) -> Self {
        Self { name }
    }
}

/// Success body of the insert routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub success: bool,
    pub inserted_count: usize,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn faq() -> FaqDocument {
        FaqDocument {
            context: "nutrition".to_string(),
            category: "basics".to_string(),
            subcategory: None,
            prompt: "What is protein?".to_string(),
            response: "A macronutrient.".to_string(),
            source: None,
            attribution: None,
            created_at: None,
        }
    }

    #[test]
    fn test_faq_serializes_with_type_tag_and_null_optionals() {
        let doc: Document = faq().into();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], "faq");
        assert_eq!(value["context"], "nutrition");
        assert!(value["source"].is_null());
        assert!(value.get("training_metadata").is_none());
    }

    #[test]
    fn test_reverse_prompt_uses_hyphenated_next_prompt() {
        let doc: Document = ReversePromptDocument {
            name: "log-meal".to_string(),
            context: "tracking".to_string(),
            category: "meals".to_string(),
            subcategory: None,
            prompt: "I had oatmeal".to_string(),
            action: "log_meal".to_string(),
            next_prompt: "Anything else?".to_string(),
            source: None,
            attribution: None,
            created_at: None,
        }
        .into();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], "reverse-prompt");
        assert_eq!(value["next-prompt"], "Anything else?");
    }

    #[test]
    fn test_untagged_json_reads_back_as_qa_pair() {
        let value = json!({
            "prompt": "Hi",
            "response": "Hello",
            "source": null,
            "attribution": null,
            "training_metadata": {"prompt_tokens": 1, "response_tokens": 2, "total_tokens": 3, "weighting": 5},
            "created_at": null
        });
        let doc: Document = serde_json::from_value(value).unwrap();
        assert_eq!(doc.family(), DocumentFamily::QaPair);
        assert_eq!(doc.doc_type(), None);
    }

    #[test]
    fn test_tagged_json_reads_back_as_typed() {
        let doc: Document = faq().into();
        let text = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_stamp_created_at_only_once() {
        let mut doc: Document = faq().into();
        assert!(doc.stamp_created_at("2024-01-01T00:00:00.000Z"));
        assert!(!doc.stamp_created_at("2025-01-01T00:00:00.000Z"));
        assert_eq!(doc.created_at(), Some("2024-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_document_id_parse() {
        let id = DocumentId::generate();
        assert_eq!(DocumentId::parse(&id.to_string()).unwrap(), id);
        assert!(DocumentId::parse("not-an-id").is_err());
    }

    #[test]
    fn test_stored_document_flattens_id() {
        let stored = StoredDocument {
            id: DocumentId::generate(),
            document: faq().into(),
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["id"], stored.id.to_string());
        assert_eq!(value["type"], "faq");
        assert_eq!(value["prompt"], "What is protein?");
    }
}
