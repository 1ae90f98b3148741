//! Milestone domain model
//!
//! A milestone is a named point in a deal's timeline. It is pinned either to
//! an absolute calendar date or to a signed day offset from another
//! milestone or an anchor event. Storage keeps milestones as flat records;
//! the dependency structure only exists inside the resolver.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::label_key;

#[derive(Debug, Error, PartialEq)]
pub enum MilestoneError {
    #[error("Milestone label cannot be empty")]
    EmptyLabel,

    #[error("Invalid date '{0}': expected YYYY-MM-DD, MM/DD/YYYY or 'Month D, YYYY'")]
    InvalidDate(String),

    #[error("Milestone '{0}' needs either a date or an offset with a reference, not both")]
    ConflictingModes(String),

    #[error("Milestone '{0}' needs a date or an offset with a reference")]
    MissingMode(String),
}

/// Accepted input formats for calendar dates, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%B %d %Y"];

/// Parses a calendar date from the formats documents and users commonly use
pub fn parse_date(raw: &str) -> Result<NaiveDate, MilestoneError> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| MilestoneError::InvalidDate(trimmed.to_string()))
}

/// A named date target within a deal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Display label, unique within a deal (compared via [`label_key`])
    pub label: String,

    /// Absolute calendar date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Signed day offset from `offset_reference`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_days: Option<i64>,

    /// Label of another milestone, or an anchor name
    #[serde(
        default,
        rename = "offset_from",
        alias = "offset_reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub offset_reference: Option<String>,

    /// Display ordering only
    #[serde(default)]
    pub sort_order: i32,
}

/// How a milestone's date is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneSpec<'a> {
    /// Pinned to a calendar date
    Absolute(NaiveDate),
    /// Offset from another milestone or an anchor
    Relative { days: i64, reference: &'a str },
    /// Neither or both modes are populated
    Invalid(SpecProblem),
}

/// Why a milestone's fields do not describe exactly one mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecProblem {
    /// A date and offset fields are both present
    BothModes,
    /// No date and no offset fields
    NoMode,
    /// Only one of `offset_days` / `offset_reference` is present
    IncompleteOffset,
}

impl Milestone {
    /// Creates a milestone pinned to a calendar date
    pub fn absolute(label: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            label: label.into(),
            date: Some(date),
            offset_days: None,
            offset_reference: None,
            sort_order: 0,
        }
    }

    /// Creates a milestone offset from another milestone or an anchor
    pub fn relative(label: impl Into<String>, days: i64, reference: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            date: None,
            offset_days: Some(days),
            offset_reference: Some(reference.into()),
            sort_order: 0,
        }
    }

    /// Sets the display order
    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Returns the normalized lookup key for this milestone's label
    pub fn key(&self) -> String {
        label_key(&self.label)
    }

    /// Returns the reference, treating blank strings as absent
    pub fn reference(&self) -> Option<&str> {
        self.offset_reference
            .as_deref()
            .filter(|r| !label_key(r).is_empty())
    }

    /// Classifies the milestone into exactly one resolution mode
    pub fn spec(&self) -> MilestoneSpec<'_> {
        let reference = self.reference();
        let has_offset = self.offset_days.is_some() || reference.is_some();

        match (self.date, self.offset_days, reference) {
            (Some(_), _, _) if has_offset => MilestoneSpec::Invalid(SpecProblem::BothModes),
            (Some(date), None, None) => MilestoneSpec::Absolute(date),
            (None, Some(days), Some(reference)) => MilestoneSpec::Relative { days, reference },
            (None, None, None) => MilestoneSpec::Invalid(SpecProblem::NoMode),
            _ => MilestoneSpec::Invalid(SpecProblem::IncompleteOffset),
        }
    }

    /// Checks the record is well-formed for manual entry
    ///
    /// The resolver tolerates malformed records and reports them per
    /// milestone; this is for callers that want to reject input up front.
    pub fn validate(&self) -> Result<(), MilestoneError> {
        if self.key().is_empty() {
            return Err(MilestoneError::EmptyLabel);
        }

        match self.spec() {
            MilestoneSpec::Invalid(SpecProblem::BothModes) => {
                Err(MilestoneError::ConflictingModes(self.label.clone()))
            }
            MilestoneSpec::Invalid(_) => Err(MilestoneError::MissingMode(self.label.clone())),
            _ => Ok(()),
        }
    }
}
