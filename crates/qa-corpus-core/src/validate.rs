//! Required-field validation.
//!
//! Turns a lenient [`DraftDocument`] into a typed [`Document`], or reports
//! which required fields are missing. The required set is derived purely
//! from the draft's `type`; nothing a client claims about prior validation
//! is consulted.
//!
//! Fields are checked in a fixed order and every missing field is collected:
//!
//! ```text
//! type → context → category → prompt → [reverse-prompt: name → action → next-prompt] → [faq: response]
//! ```
//!
//! Generic QA pairs only require `prompt` and `response`.
//!
//! Blank strings count as missing. Optional fields are trimmed and blank
//! values become `None`, so "not provided" and "provided as empty" are the
//! same thing downstream.

use thiserror::Error;

use crate::models::{
    Document, DocumentFamily, DraftDocument, FaqDocument, QaPairDocument, ReversePromptDocument,
    FAQ_TYPE, REVERSE_PROMPT_TYPE,
};
use crate::tokens::{TrainingMetadata, DEFAULT_WEIGHTING};

/// Why a single document was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}", describe_missing(.kind, .fields))]
    MissingFields {
        /// Document type, when it could be determined.
        kind: Option<&'static str>,
        /// Missing fields in check order.
        fields: Vec<&'static str>,
    },

    #[error("unknown document type '{0}' (expected 'faq' or 'reverse-prompt')")]
    UnknownType(String),

    /// A `type` was sent on the generic QA route, which stores untagged pairs.
    #[error("unexpected document type '{0}' for a QA pair")]
    UnexpectedType(String),

    #[error("(reverse-prompt) invalid name '{0}': use lowercase letters, digits, '-' or '_'")]
    InvalidName(String),
}

impl ValidationError {
    /// The first missing field, if this is a missing-field error.
    pub fn first_missing(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingFields { fields, .. } => fields.first().copied(),
            _ => None,
        }
    }
}

fn describe_missing(kind: &Option<&'static str>, fields: &[&'static str]) -> String {
    let noun = if fields.len() == 1 { "field" } else { "fields" };
    let list = fields.join(", ");
    match kind {
        Some(kind) => format!("({}) missing required {}: {}", kind, noun, list),
        None => format!("missing required {}: {}", noun, list),
    }
}

/// Why a whole batch was rejected. Nothing from a rejected batch is stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("Missing or invalid documents array")]
    Empty,

    /// `index` is zero-based; the message is one-based.
    #[error("Document {} {error}", .index + 1)]
    Invalid {
        index: usize,
        error: ValidationError,
    },

    /// The document is not an object of the expected field types.
    #[error("Document {} is malformed: {reason}", .index + 1)]
    Malformed { index: usize, reason: String },
}

/// Trim a field; blank or absent becomes `None`.
pub fn normalize(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Collects missing required fields in check order.
#[derive(Default)]
struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    fn field(&mut self, name: &'static str, value: &Option<String>) -> Option<String> {
        let value = normalize(value);
        if value.is_none() {
            self.missing.push(name);
        }
        value
    }

    fn mark_missing(&mut self, name: &'static str) {
        self.missing.push(name);
    }

    fn into_error(self, kind: Option<&'static str>) -> ValidationError {
        ValidationError::MissingFields {
            kind,
            fields: self.missing,
        }
    }
}

/// Returns true if `name` is a slug: lowercase ASCII letters, digits,
/// `-` and `_`, not starting or ending with `-`.
pub fn is_slug(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.ends_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Validate an FAQ or reverse-prompt draft.
pub fn validate_typed(draft: &DraftDocument) -> Result<Document, ValidationError> {
    let doc_type = normalize(&draft.doc_type);
    let kind = match doc_type.as_deref() {
        None => None,
        Some(FAQ_TYPE) => Some(FAQ_TYPE),
        Some(REVERSE_PROMPT_TYPE) => Some(REVERSE_PROMPT_TYPE),
        Some(other) => return Err(ValidationError::UnknownType(other.to_string())),
    };

    let mut required = Required::default();
    if kind.is_none() {
        required.mark_missing("type");
    }
    let context = required.field("context", &draft.context);
    let category = required.field("category", &draft.category);
    let prompt = required.field("prompt", &draft.prompt);

    let subcategory = normalize(&draft.subcategory);
    let source = normalize(&draft.source);
    let attribution = normalize(&draft.attribution);
    let created_at = normalize(&draft.created_at);

    match kind {
        Some(REVERSE_PROMPT_TYPE) => {
            let name = required.field("name", &draft.name);
            let action = required.field("action", &draft.action);
            let next_prompt = required.field("next-prompt", &draft.next_prompt);
            match (context, category, prompt, name, action, next_prompt) {
                (
                    Some(context),
                    Some(category),
                    Some(prompt),
                    Some(name),
                    Some(action),
                    Some(next_prompt),
                ) => {
                    if !is_slug(&name) {
                        return Err(ValidationError::InvalidName(name));
                    }
                    Ok(ReversePromptDocument {
                        name,
                        context,
                        category,
                        subcategory,
                        prompt,
                        action,
                        next_prompt,
                        source,
                        attribution,
                        created_at,
                    }
                    .into())
                }
                _ => Err(required.into_error(kind)),
            }
        }
        Some(_) => {
            let response = required.field("response", &draft.response);
            match (context, category, prompt, response) {
                (Some(context), Some(category), Some(prompt), Some(response)) => Ok(FaqDocument {
                    context,
                    category,
                    subcategory,
                    prompt,
                    response,
                    source,
                    attribution,
                    created_at,
                }
                .into()),
                _ => Err(required.into_error(kind)),
            }
        }
        None => Err(required.into_error(None)),
    }
}

/// Validate a generic QA draft and derive its training metadata.
///
/// Token counts are always recomputed from the text; only the client's
/// `weighting` is kept, defaulting to [`DEFAULT_WEIGHTING`].
pub fn validate_qa_pair(draft: &DraftDocument) -> Result<Document, ValidationError> {
    if let Some(doc_type) = normalize(&draft.doc_type) {
        return Err(ValidationError::UnexpectedType(doc_type));
    }

    let mut required = Required::default();
    let prompt = required.field("prompt", &draft.prompt);
    let response = required.field("response", &draft.response);

    let (prompt, response) = match (prompt, response) {
        (Some(prompt), Some(response)) => (prompt, response),
        _ => return Err(required.into_error(None)),
    };

    let weighting = draft
        .training_metadata
        .and_then(|meta| meta.weighting)
        .unwrap_or(DEFAULT_WEIGHTING);

    Ok(QaPairDocument {
        training_metadata: TrainingMetadata::for_pair(&prompt, &response, weighting),
        prompt,
        response,
        source: normalize(&draft.source),
        attribution: normalize(&draft.attribution),
        created_at: normalize(&draft.created_at),
    }
    .into())
}

/// Validate a draft according to the family it was submitted under.
pub fn validate_document(
    family: DocumentFamily,
    draft: &DraftDocument,
) -> Result<Document, ValidationError> {
    match family {
        DocumentFamily::PromptMe => validate_typed(draft),
        DocumentFamily::QaPair => validate_qa_pair(draft),
    }
}

/// Parse the raw JSON documents of a request body into drafts.
///
/// Each element is decoded on its own so a bad one is reported by position.
pub fn parse_drafts(values: Vec<serde_json::Value>) -> Result<Vec<DraftDocument>, BatchError> {
    if values.is_empty() {
        return Err(BatchError::Empty);
    }
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| BatchError::Malformed {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Validate every draft of a batch.
///
/// The batch fails as a whole on the first invalid document.
pub fn validate_batch(
    family: DocumentFamily,
    drafts: &[DraftDocument],
) -> Result<Vec<Document>, BatchError> {
    if drafts.is_empty() {
        return Err(BatchError::Empty);
    }
    drafts
        .iter()
        .enumerate()
        .map(|(index, draft)| {
            validate_document(family, draft).map_err(|error| BatchError::Invalid { index, error })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faq_draft() -> DraftDocument {
        DraftDocument {
            doc_type: Some("faq".to_string()),
            context: Some("nutrition".to_string()),
            category: Some("basics".to_string()),
            prompt: Some("What is protein?".to_string()),
            response: Some("A macronutrient.".to_string()),
            ..Default::default()
        }
    }

    fn reverse_prompt_draft() -> DraftDocument {
        DraftDocument {
            doc_type: Some("reverse-prompt".to_string()),
            name: Some("log-meal".to_string()),
            context: Some("tracking".to_string()),
            category: Some("meals".to_string()),
            prompt: Some("I had oatmeal for breakfast".to_string()),
            action: Some("log_meal".to_string()),
            next_prompt: Some("Anything to drink?".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_faq() {
        let doc = validate_typed(&faq_draft()).unwrap();
        assert_eq!(doc.doc_type(), Some("faq"));
        assert_eq!(doc.context(), Some("nutrition"));
    }

    #[test]
    fn test_valid_reverse_prompt() {
        let doc = validate_typed(&reverse_prompt_draft()).unwrap();
        assert_eq!(doc.doc_type(), Some("reverse-prompt"));
    }

    #[test]
    fn test_missing_type_reported_first() {
        let mut draft = faq_draft();
        draft.doc_type = None;
        draft.prompt = None;
        let err = validate_typed(&draft).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields {
                kind: None,
                fields: vec!["type", "prompt"],
            }
        );
        assert_eq!(err.first_missing(), Some("type"));
    }

    #[test]
    fn test_faq_requires_response() {
        let mut draft = faq_draft();
        draft.response = Some("   ".to_string());
        let err = validate_typed(&draft).unwrap_err();
        assert_eq!(err.first_missing(), Some("response"));
        assert_eq!(err.to_string(), "(faq) missing required field: response");
    }

    #[test]
    fn test_reverse_prompt_field_order() {
        let mut draft = reverse_prompt_draft();
        draft.category = None;
        draft.name = None;
        draft.next_prompt = None;
        let err = validate_typed(&draft).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields {
                kind: Some("reverse-prompt"),
                fields: vec!["category", "name", "next-prompt"],
            }
        );
    }

    #[test]
    fn test_reverse_prompt_does_not_require_response() {
        let mut draft = reverse_prompt_draft();
        draft.response = None;
        assert!(validate_typed(&draft).is_ok());
    }

    fn clear_field(draft: &mut DraftDocument, field: &str) {
        match field {
            "context" => draft.context = None,
            "category" => draft.category = None,
            "prompt" => draft.prompt = None,
            "response" => draft.response = None,
            "name" => draft.name = None,
            "action" => draft.action = None,
            "next-prompt" => draft.next_prompt = None,
            other => panic!("unexpected field {}", other),
        }
    }

    #[test]
    fn test_each_required_field_is_enforced() {
        for field in ["context", "category", "prompt", "response"] {
            let mut draft = faq_draft();
            clear_field(&mut draft, field);
            let err = validate_typed(&draft).unwrap_err();
            assert_eq!(err.first_missing(), Some(field), "faq without {}", field);
        }
        for field in ["context", "category", "prompt", "name", "action", "next-prompt"] {
            let mut draft = reverse_prompt_draft();
            clear_field(&mut draft, field);
            let err = validate_typed(&draft).unwrap_err();
            assert_eq!(err.first_missing(), Some(field), "reverse-prompt without {}", field);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut draft = faq_draft();
        draft.doc_type = Some("blog".to_string());
        assert_eq!(
            validate_typed(&draft).unwrap_err(),
            ValidationError::UnknownType("blog".to_string())
        );
    }

    #[test]
    fn test_name_must_be_slug() {
        let mut draft = reverse_prompt_draft();
        draft.name = Some("Log Meal".to_string());
        assert!(matches!(
            validate_typed(&draft),
            Err(ValidationError::InvalidName(_))
        ));
        assert!(is_slug("log-meal"));
        assert!(is_slug("log_meal_2"));
        assert!(!is_slug("-log"));
        assert!(!is_slug("log-"));
    }

    #[test]
    fn test_blank_optionals_become_none() {
        let mut draft = faq_draft();
        draft.source = Some("  ".to_string());
        draft.attribution = Some(" USDA ".to_string());
        draft.subcategory = Some(String::new());
        let doc = validate_typed(&draft).unwrap();
        assert_eq!(doc.source(), None);
        assert_eq!(doc.attribution(), Some("USDA"));
    }

    #[test]
    fn test_qa_pair_requires_prompt_and_response_only() {
        let draft = DraftDocument {
            prompt: Some("Hi".to_string()),
            ..Default::default()
        };
        let err = validate_qa_pair(&draft).unwrap_err();
        assert_eq!(err.to_string(), "missing required field: response");

        let draft = DraftDocument {
            prompt: Some("Hi".to_string()),
            response: Some("Hello".to_string()),
            ..Default::default()
        };
        let doc = validate_qa_pair(&draft).unwrap();
        assert_eq!(doc.doc_type(), None);
    }

    #[test]
    fn test_qa_pair_metadata_recomputed() {
        let draft = DraftDocument {
            prompt: Some("abcdefg".to_string()),
            response: Some("abcde".to_string()),
            training_metadata: Some(crate::models::DraftTrainingMetadata { weighting: Some(3) }),
            ..Default::default()
        };
        let doc = validate_qa_pair(&draft).unwrap();
        let meta = doc.training_metadata().unwrap();
        assert_eq!(meta.prompt_tokens(), 2);
        assert_eq!(meta.response_tokens(), 2);
        assert_eq!(meta.total_tokens(), 4);
        assert_eq!(meta.weighting(), 3);
    }

    #[test]
    fn test_qa_pair_default_weighting() {
        let draft = DraftDocument {
            prompt: Some("Hi".to_string()),
            response: Some("Hello".to_string()),
            ..Default::default()
        };
        let doc = validate_qa_pair(&draft).unwrap();
        assert_eq!(doc.training_metadata().unwrap().weighting(), DEFAULT_WEIGHTING);
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert_eq!(
            validate_batch(DocumentFamily::PromptMe, &[]),
            Err(BatchError::Empty)
        );
    }

    #[test]
    fn test_batch_fails_on_first_invalid_document() {
        let mut bad = reverse_prompt_draft();
        bad.action = None;
        bad.next_prompt = None;
        let drafts = vec![faq_draft(), bad, faq_draft()];
        let err = validate_batch(DocumentFamily::PromptMe, &drafts).unwrap_err();
        assert!(matches!(err, BatchError::Invalid { index: 1, .. }));
        assert_eq!(
            err.to_string(),
            "Document 2 (reverse-prompt) missing required fields: action, next-prompt"
        );
    }

    #[test]
    fn test_valid_batch_keeps_order() {
        let drafts = vec![faq_draft(), reverse_prompt_draft()];
        let docs = validate_batch(DocumentFamily::PromptMe, &drafts).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].doc_type(), Some("faq"));
        assert_eq!(docs[1].doc_type(), Some("reverse-prompt"));
    }

    #[test]
    fn test_qa_pair_rejects_typed_document() {
        let err = validate_batch(DocumentFamily::QaPair, &[faq_draft()]).unwrap_err();
        assert_eq!(
            err,
            BatchError::Invalid {
                index: 0,
                error: ValidationError::UnexpectedType("faq".to_string()),
            }
        );
        assert_eq!(
            err.to_string(),
            "Document 1 unexpected document type 'faq' for a QA pair"
        );
    }

    #[test]
    fn test_qa_pair_ignores_blank_type() {
        let draft = DraftDocument {
            doc_type: Some("  ".to_string()),
            prompt: Some("Hi".to_string()),
            response: Some("Hello".to_string()),
            ..Default::default()
        };
        assert!(validate_qa_pair(&draft).is_ok());
    }

    #[test]
    fn test_parse_drafts_names_malformed_document() {
        let values = vec![
            serde_json::json!({"prompt": "a", "response": "b"}),
            serde_json::json!({"prompt": "c", "training_metadata": {"weighting": 4.5}}),
        ];
        let err = parse_drafts(values).unwrap_err();
        assert!(matches!(err, BatchError::Malformed { index: 1, .. }));
        assert!(err.to_string().starts_with("Document 2 is malformed: "));
    }

    #[test]
    fn test_parse_drafts_rejects_non_object() {
        let err = parse_drafts(vec![serde_json::json!("just a string")]).unwrap_err();
        assert!(matches!(err, BatchError::Malformed { index: 0, .. }));
        assert_eq!(parse_drafts(Vec::new()), Err(BatchError::Empty));
    }
}
