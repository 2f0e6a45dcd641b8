//! Client-side document shaping.
//!
//! [`FormInput`] holds the raw strings of the curation form. Shaping runs
//! them through the same validator the server uses and yields a typed
//! [`Document`]. Shaped documents are queued in a [`PendingBatch`] until the
//! whole batch is submitted in one request.
//!
//! Nothing in this module performs I/O.
//!
//! ```rust
//! use qa_corpus_core::models::DocumentFamily;
//! use qa_corpus_core::shaper::{FormInput, PendingBatch};
//!
//! let form = FormInput {
//!     doc_type: "faq".into(),
//!     context: "nutrition".into(),
//!     category: "basics".into(),
//!     prompt: "What is protein?".into(),
//!     response: "A macronutrient.".into(),
//!     ..Default::default()
//! };
//!
//! let mut batch = PendingBatch::new();
//! batch.push_form(&form, DocumentFamily::PromptMe).unwrap();
//! assert_eq!(batch.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Document, DocumentFamily, DraftDocument, DraftTrainingMetadata, TypedDocument};
use crate::validate::{validate_document, ValidationError};

/// Raw curation form fields.
///
/// Every field is a plain string, as typed. Blank optional fields are sent
/// as absent, never as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormInput {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub context: String,
    pub category: String,
    pub subcategory: String,
    pub name: String,
    pub prompt: String,
    pub response: String,
    pub action: String,
    #[serde(rename = "next-prompt")]
    pub next_prompt: String,
    pub source: String,
    pub attribution: String,
    /// Weighting for generic QA pairs; the default applies when unset.
    pub weighting: Option<u32>,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl FormInput {
    /// Convert the form to the wire draft, dropping blank fields.
    pub fn to_draft(&self) -> DraftDocument {
        DraftDocument {
            doc_type: non_blank(&self.doc_type),
            name: non_blank(&self.name),
            context: non_blank(&self.context),
            category: non_blank(&self.category),
            subcategory: non_blank(&self.subcategory),
            prompt: non_blank(&self.prompt),
            response: non_blank(&self.response),
            action: non_blank(&self.action),
            next_prompt: non_blank(&self.next_prompt),
            source: non_blank(&self.source),
            attribution: non_blank(&self.attribution),
            training_metadata: self.weighting.map(|weighting| DraftTrainingMetadata {
                weighting: Some(weighting),
            }),
            created_at: None,
        }
    }

    /// Shape the form as a document of the given family.
    pub fn shape(&self, family: DocumentFamily) -> Result<Document, ValidationError> {
        validate_document(family, &self.to_draft())
    }

    /// Repopulate a form from a previously shaped document, for editing.
    pub fn from_document(doc: &Document) -> Self {
        let mut form = FormInput::default();
        match doc {
            Document::Typed(TypedDocument::Faq(d)) => {
                form.doc_type = crate::models::FAQ_TYPE.to_string();
                form.context = d.context.clone();
                form.category = d.category.clone();
                form.subcategory = d.subcategory.clone().unwrap_or_default();
                form.prompt = d.prompt.clone();
                form.response = d.response.clone();
            }
            Document::Typed(TypedDocument::ReversePrompt(d)) => {
                form.doc_type = crate::models::REVERSE_PROMPT_TYPE.to_string();
                form.name = d.name.clone();
                form.context = d.context.clone();
                form.category = d.category.clone();
                form.subcategory = d.subcategory.clone().unwrap_or_default();
                form.prompt = d.prompt.clone();
                form.action = d.action.clone();
                form.next_prompt = d.next_prompt.clone();
            }
            Document::QaPair(d) => {
                form.prompt = d.prompt.clone();
                form.response = d.response.clone();
                form.weighting = Some(d.training_metadata.weighting());
            }
        }
        form.source = doc.source().unwrap_or_default().to_string();
        form.attribution = doc.attribution().unwrap_or_default().to_string();
        form
    }

    /// Clear the data-entry fields. Type, context and category are session
    /// state and survive.
    pub fn clear_entry_fields(&mut self) {
        self.subcategory.clear();
        self.name.clear();
        self.prompt.clear();
        self.response.clear();
        self.action.clear();
        self.next_prompt.clear();
        self.source.clear();
        self.attribution.clear();
        self.weighting = None;
    }

    /// True if any data-entry field holds non-blank text.
    pub fn has_unsaved_data(&self) -> bool {
        [
            &self.subcategory,
            &self.name,
            &self.prompt,
            &self.response,
            &self.action,
            &self.next_prompt,
            &self.source,
            &self.attribution,
        ]
        .iter()
        .any(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("cannot add a {found} document to a {expected} batch")]
    MixedFamily {
        expected: DocumentFamily,
        found: DocumentFamily,
    },
}

/// Shaped documents waiting to be submitted together.
///
/// Entries have no identity beyond their position. All entries belong to
/// one [`DocumentFamily`], fixed by the first entry.
#[derive(Debug, Clone, Default)]
pub struct PendingBatch {
    documents: Vec<Document>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Family of the queued documents, or `None` while empty.
    pub fn family(&self) -> Option<DocumentFamily> {
        self.documents.first().map(Document::family)
    }

    /// Append an already shaped document. Returns the new length.
    pub fn push(&mut self, doc: Document) -> Result<usize, ShapeError> {
        if let Some(expected) = self.family() {
            let found = doc.family();
            if expected != found {
                return Err(ShapeError::MixedFamily { expected, found });
            }
        }
        self.documents.push(doc);
        Ok(self.documents.len())
    }

    /// Shape and validate a form, then append it. Returns the new length.
    pub fn push_form(
        &mut self,
        form: &FormInput,
        family: DocumentFamily,
    ) -> Result<usize, ShapeError> {
        let doc = form.shape(family)?;
        self.push(doc)
    }

    /// Remove the entry at `index` and return it as a form for editing.
    pub fn take_for_edit(&mut self, index: usize) -> Option<FormInput> {
        if index >= self.documents.len() {
            return None;
        }
        let doc = self.documents.remove(index);
        Some(FormInput::from_document(&doc))
    }

    /// Drop every entry, e.g. after a successful submission.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
