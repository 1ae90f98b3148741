//! Reading extraction batches from disk
//!
//! Extraction output arrives as JSON or YAML. The format is picked from the
//! file extension; anything that is not `.json` is read as YAML, which also
//! accepts most JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::domain::ExtractionBatch;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON in {path}: {message}")]
    Json { path: String, message: String },

    #[error("Invalid YAML in {path}: {message}")]
    Yaml { path: String, message: String },
}

/// Input format of an extraction file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Json,
    Yaml,
}

impl BatchFormat {
    /// Picks the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => BatchFormat::Json,
            _ => BatchFormat::Yaml,
        }
    }
}

/// Parses an extraction batch from text
pub fn parse_batch(content: &str, format: BatchFormat, origin: &str) -> Result<ExtractionBatch, ImportError> {
    match format {
        BatchFormat::Json => serde_json::from_str(content).map_err(|e| ImportError::Json {
            path: origin.to_string(),
            message: e.to_string(),
        }),
        BatchFormat::Yaml => serde_yaml::from_str(content).map_err(|e| ImportError::Yaml {
            path: origin.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Reads an extraction batch from a file
pub fn read_batch(path: &Path) -> Result<ExtractionBatch> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read milestone file: {}", path.display()))?;

    // An empty document is an empty batch
    if content.trim().is_empty() {
        return Ok(ExtractionBatch::default());
    }

    Ok(parse_batch(
        &content,
        BatchFormat::from_path(path),
        &path.display().to_string(),
    )?)
}
