//! Token estimation and derived training metadata.
//!
//! Token counts are a heuristic, not a real tokenizer: one token per four
//! characters, rounded up. The same ratio is used everywhere so that counts
//! computed by the shaper and by the server agree exactly.
//!
//! ```rust
//! use qa_corpus_core::tokens::estimate_tokens;
//!
//! assert_eq!(estimate_tokens(""), 0);
//! assert_eq!(estimate_tokens("abcd"), 1);
//! assert_eq!(estimate_tokens("abcde"), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Approximate characters-per-token ratio.
pub const CHARS_PER_TOKEN: usize = 4;

/// Weighting attached to every generic QA pair unless the client sent one.
pub const DEFAULT_WEIGHTING: u32 = 5;

/// Estimate the token count of `text` as `ceil(chars / 4)`.
///
/// Length is counted in Unicode scalar values.
pub fn estimate_tokens(text: &str) -> u64 {
    text.chars().count().div_ceil(CHARS_PER_TOKEN) as u64
}

/// Like [`estimate_tokens`], but absent text counts as zero.
pub fn estimate_optional_tokens(text: Option<&str>) -> u64 {
    text.map_or(0, estimate_tokens)
}

/// Training metadata attached to generic QA pairs.
///
/// `total_tokens` is always `prompt_tokens + response_tokens`: it is
/// computed on construction and recomputed on deserialization, so a stored
/// or client-supplied total is never trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TrainingMetadataRepr")]
pub struct TrainingMetadata {
    prompt_tokens: u64,
    response_tokens: u64,
    total_tokens: u64,
    weighting: u32,
}

impl TrainingMetadata {
    pub fn new(prompt_tokens: u64, response_tokens: u64, weighting: u32) -> Self {
        Self {
            prompt_tokens,
            response_tokens,
            total_tokens: prompt_tokens + response_tokens,
            weighting,
        }
    }

    /// Derive metadata from a prompt/response pair.
    pub fn for_pair(prompt: &str, response: &str, weighting: u32) -> Self {
        Self::new(estimate_tokens(prompt), estimate_tokens(response), weighting)
    }

    pub fn prompt_tokens(&self) -> u64 {
        self.prompt_tokens
    }

    pub fn response_tokens(&self) -> u64 {
        self.response_tokens
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn weighting(&self) -> u32 {
        self.weighting
    }
}

#[derive(Deserialize)]
struct TrainingMetadataRepr {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    response_tokens: u64,
    #[serde(default = "default_weighting")]
    weighting: u32,
}

fn default_weighting() -> u32 {
    DEFAULT_WEIGHTING
}

impl From<TrainingMetadataRepr> for TrainingMetadata {
    fn from(repr: TrainingMetadataRepr) -> Self {
        Self::new(repr.prompt_tokens, repr.response_tokens, repr.weighting)
    }
}
