//! Dataset files accepted by the ingest command

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::domain::index::Metadata;
use crate::domain::retrieval::NewDocument;

/// One dataset entry: a bare prompt or `{content, metadata}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DatasetItem {
    Text(String),
    Document {
        content: String,
        #[serde(default)]
        metadata: Metadata,
    },
}

impl From<DatasetItem> for NewDocument {
    fn from(item: DatasetItem) -> Self {
        match item {
            DatasetItem::Text(content) => NewDocument::new(content),
            DatasetItem::Document { content, metadata } => {
                NewDocument::new(content).with_all_metadata(metadata)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// A single JSON array
    Json,
    /// One JSON value per line
    JsonLines,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                Self::JsonLines
            }
            _ => Self::Json,
        }
    }
}

pub fn load_documents(path: &Path) -> anyhow::Result<Vec<NewDocument>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    parse_documents(&raw, DatasetFormat::from_path(path))
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Parses a dataset; content is trimmed and blank entries are dropped
pub fn parse_documents(raw: &str, format: DatasetFormat) -> anyhow::Result<Vec<NewDocument>> {
    let items: Vec<DatasetItem> = match format {
        DatasetFormat::Json => serde_json::from_str(raw)?,
        DatasetFormat::JsonLines => raw
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).with_context(|| format!("line {}", n + 1))
            })
            .collect::<anyhow::Result<_>>()?,
    };

    Ok(items
        .into_iter()
        .map(NewDocument::from)
        .filter_map(|mut document| {
            document.content = document.content.trim().to_string();
            (!document.content.is_empty()).then_some(document)
        })
        .collect())
}

/// Drops documents whose content was already seen, keeping the first
pub fn dedupe(documents: Vec<NewDocument>) -> Vec<NewDocument> {
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter(|document| seen.insert(document.content.clone()))
        .collect()
}
