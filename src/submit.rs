//! `corpus submit`: shape curation forms from a file and post them to the
//! server as one batch.
//!
//! The input file is either a JSON array of form objects or one form object
//! per line (JSON Lines). Every form is shaped and validated locally first;
//! a single bad form stops the command before anything is sent.

use std::path::Path;

use anyhow::{Context, Result};

use qa_corpus_core::models::DocumentFamily;
use qa_corpus_core::shaper::{FormInput, PendingBatch};

use crate::client::CorpusClient;
use crate::config::Config;

/// Parse form inputs from a JSON array or JSON Lines text.
pub fn parse_forms(text: &str) -> Result<Vec<FormInput>> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).context("invalid JSON array of forms");
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid form on line {}", i + 1))
        })
        .collect()
}

/// Shape every form into one pending batch.
pub fn build_batch(forms: &[FormInput], family: DocumentFamily) -> Result<PendingBatch> {
    let mut batch = PendingBatch::new();
    for (i, form) in forms.iter().enumerate() {
        batch
            .push_form(form, family)
            .with_context(|| format!("form {} rejected", i + 1))?;
    }
    Ok(batch)
}

pub async fn run_submit(
    config: &Config,
    path: &Path,
    family: DocumentFamily,
    server: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let forms = parse_forms(&text)?;
    let mut batch = build_batch(&forms, family)?;

    if batch.is_empty() {
        println!("No forms found in {}", path.display());
        return Ok(());
    }

    if dry_run {
        println!("submit {} (dry-run)", family);
        println!("  documents shaped: {}", batch.len());
        println!("{}", serde_json::to_string_pretty(batch.documents())?);
        return Ok(());
    }

    let client = CorpusClient::new(server.unwrap_or(&config.client.base_url));
    let response = client.insert(family, batch.documents()).await?;
    tracing::info!(family = %family, count = response.inserted_count, "batch submitted");
    batch.clear();

    println!("{}", response.message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        let forms = parse_forms(r#"[{"type": "faq", "prompt": "a"}, {"prompt": "b"}]"#).unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].doc_type, "faq");
        assert_eq!(forms[1].prompt, "b");
    }

    #[test]
    fn test_parse_json_lines_skips_blank_lines() {
        let text = concat!(
            "{\"prompt\": \"a\", \"response\": \"x\"}\n",
            "\n",
            "{\"prompt\": \"b\", \"response\": \"y\"}\n",
        );
        let forms = parse_forms(text).unwrap();
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let err = parse_forms("{\"prompt\": \"a\"}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_build_batch_names_rejected_form() {
        let forms = vec![
            FormInput {
                prompt: "p".into(),
                response: "r".into(),
                ..Default::default()
            },
            FormInput {
                prompt: "p".into(),
                ..Default::default()
            },
        ];
        let err = build_batch(&forms, DocumentFamily::QaPair).unwrap_err();
        assert_eq!(err.to_string(), "form 2 rejected");
        assert!(format!("{:#}", err).contains("response"));
    }

    #[test]
    fn test_build_batch_shapes_qa_pairs() {
        let forms = vec![FormInput {
            prompt: "abcdefg".into(),
            response: "abcd".into(),
            source: "  ".into(),
            ..Default::default()
        }];
        let batch = build_batch(&forms, DocumentFamily::QaPair).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.family(), Some(DocumentFamily::QaPair));
        assert_eq!(batch.documents()[0].source(), None);
    }
}
