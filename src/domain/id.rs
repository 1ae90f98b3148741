//! Deal identifiers and label keys
//!
//! ID Format:
//! - Deal IDs: `d-{7-char-hash}` (e.g., `d-7f2b4c1`)
//!
//! Hash is derived from deal name + creation timestamp, so the same name
//! created twice produces two different deals.
//!
//! Milestone labels and anchor names are free text coming from documents,
//! so they are compared through a normalized [`label_key`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid deal ID format: expected 'd-{{7-char-hash}}', got '{0}'")]
    InvalidDealId(String),
}

/// Generates a 7-character hash from name and timestamp
fn generate_hash(name: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", name, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Deal ID in the format `d-{7-char-hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DealId {
    hash: String,
}

impl DealId {
    /// Creates a new deal ID from name and timestamp
    pub fn new(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(name, timestamp),
        }
    }

    /// Returns the hash portion of the ID
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d-{}", self.hash)
    }
}

impl FromStr for DealId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hash = s
            .strip_prefix("d-")
            .ok_or_else(|| IdError::InvalidDealId(s.to_string()))?;

        if hash.len() != 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidDealId(s.to_string()));
        }

        Ok(Self {
            hash: hash.to_ascii_lowercase(),
        })
    }
}

impl TryFrom<String> for DealId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DealId> for String {
    fn from(id: DealId) -> Self {
        id.to_string()
    }
}

/// Normalizes a milestone label or anchor name into its lookup key.
///
/// Lowercases, trims, and collapses every run of non-alphanumeric
/// characters into a single `_`, so "Escrow Open", "escrow-open" and
/// `escrow_open` all share the key `escrow_open`.
pub fn label_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    key
}
