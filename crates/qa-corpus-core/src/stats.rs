//! Aggregate statistics over the stored collection.

use serde::{Deserialize, Serialize};

use crate::models::Document;

/// Aggregate record returned by `GET /api/stats`.
///
/// Documents without training metadata (FAQ and reverse-prompt) count
/// toward `total_pairs` and the presence counters but add nothing to the
/// token sums. An empty collection yields the all-zero [`Default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total_pairs: i64,
    pub total_prompt_tokens: i64,
    pub total_response_tokens: i64,
    pub total_tokens: i64,
    /// Mean weighting over documents that carry training metadata.
    pub average_weight: f64,
    pub with_source: i64,
    pub with_attribution: i64,
}

impl CollectionStats {
    /// Fold statistics over an in-memory set of documents.
    pub fn from_documents<'a>(docs: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut stats = CollectionStats::default();
        let mut weight_sum = 0.0;
        let mut weighted = 0u64;

        for doc in docs {
            stats.total_pairs += 1;
            if let Some(meta) = doc.training_metadata() {
                stats.total_prompt_tokens += meta.prompt_tokens() as i64;
                stats.total_response_tokens += meta.response_tokens() as i64;
                stats.total_tokens += meta.total_tokens() as i64;
                weight_sum += f64::from(meta.weighting());
                weighted += 1;
            }
            if doc.source().is_some() {
                stats.with_source += 1;
            }
            if doc.attribution().is_some() {
                stats.with_attribution += 1;
            }
        }

        if weighted > 0 {
            stats.average_weight = weight_sum / weighted as f64;
        }
        stats
    }
}
