//! HTTP client for a running corpus server.
//!
//! Used by `corpus submit` to post a shaped batch, and by the read commands
//! (`stats`, `contexts`, `categories`, `health`) when given `--server`.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use qa_corpus_core::models::{Document, DocumentFamily, InsertResponse, TaxonomyEntry};
use qa_corpus_core::stats::CollectionStats;

/// Insert route for a document family.
pub fn insert_path(family: DocumentFamily) -> &'static str {
    match family {
        DocumentFamily::PromptMe => "/api/insert-promptme",
        DocumentFamily::QaPair => "/api/insert-qa-pairs",
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct CorpusClient {
    base_url: String,
    http: reqwest::Client,
}

impl CorpusClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit a whole batch in one request.
    pub async fn insert(
        &self,
        family: DocumentFamily,
        docs: &[Document],
    ) -> Result<InsertResponse> {
        let resp = self
            .http
            .post(self.url(insert_path(family)))
            .json(&serde_json::json!({ "documents": docs }))
            .send()
            .await
            .with_context(|| format!("failed to reach corpus server at {}", self.base_url))?;
        read_json(resp).await
    }

    pub async fn contexts(&self, doc_type: Option<&str>) -> Result<Vec<TaxonomyEntry>> {
        let mut req = self.http.get(self.url("/api/contexts"));
        if let Some(t) = doc_type {
            req = req.query(&[("type", t)]);
        }
        read_json(req.send().await?).await
    }

    pub async fn categories(&self, context: Option<&str>) -> Result<Vec<TaxonomyEntry>> {
        let mut req = self.http.get(self.url("/api/categories"));
        if let Some(c) = context {
            req = req.query(&[("context", c)]);
        }
        read_json(req.send().await?).await
    }

    pub async fn stats(&self) -> Result<CollectionStats> {
        read_json(self.http.get(self.url("/api/stats")).send().await?).await
    }

    /// Raw health body. A 503 is still returned as `Ok` so the caller can
    /// show the reported error.
    pub async fn health(&self) -> Result<serde_json::Value> {
        let resp = self.http.get(self.url("/api/health")).send().await?;
        Ok(resp.json().await?)
    }
}

/// Decode a success body, or turn the server's `{ "error": .. }` into an error.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        bail!("server returned {}: {}", status.as_u16(), message);
    }
    Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_path_per_family() {
        assert_eq!(insert_path(DocumentFamily::PromptMe), "/api/insert-promptme");
        assert_eq!(insert_path(DocumentFamily::QaPair), "/api/insert-qa-pairs");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = CorpusClient::new("http://127.0.0.1:3001/");
        assert_eq!(client.url("/api/stats"), "http://127.0.0.1:3001/api/stats");
    }
}
