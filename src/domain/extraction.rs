//! Extracted milestone candidates
//!
//! Document extraction produces loosely-typed candidates: dates in whatever
//! format the document used, blank strings instead of missing fields, no
//! explicit ordering. This module normalizes them into [`Milestone`]
//! records without judging whether they resolve.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::anchor::AnchorSet;
use super::milestone::{parse_date, Milestone};

/// Deserializes an optional date in any accepted format; blank is `None`
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Deserializes an anchor map, skipping blank values
fn lenient_anchors<'de, D>(deserializer: D) -> Result<AnchorSet, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Option<String>> = BTreeMap::deserialize(deserializer)?;
    let mut anchors = AnchorSet::new();
    for (name, value) in raw {
        match value.as_deref().map(str::trim) {
            None | Some("") => continue,
            Some(s) => {
                let date = parse_date(s).map_err(serde::de::Error::custom)?;
                anchors.set(&name, date);
            }
        }
    }
    Ok(anchors)
}

/// Deserializes an optional reference; blank is `None`
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// One milestone as produced by extraction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MilestoneCandidate {
    pub label: String,

    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub offset_days: Option<i64>,

    #[serde(default, alias = "offset_reference", deserialize_with = "lenient_text")]
    pub offset_from: Option<String>,

    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// A batch of extracted anchors and milestones
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractionBatch {
    #[serde(default, deserialize_with = "lenient_anchors")]
    pub anchors: AnchorSet,

    #[serde(default)]
    pub milestones: Vec<MilestoneCandidate>,
}

impl ExtractionBatch {
    /// Converts candidates into milestone records
    ///
    /// Candidates without a sort order get `first_sort_order` plus their
    /// position in the batch.
    pub fn into_milestones(self, first_sort_order: i32) -> (AnchorSet, Vec<Milestone>) {
        let milestones = self
            .milestones
            .into_iter()
            .enumerate()
            .map(|(i, c)| Milestone {
                label: c.label.trim().to_string(),
                date: c.date,
                offset_days: c.offset_days,
                offset_reference: c.offset_from,
                sort_order: c.sort_order.unwrap_or_else(|| {
                    first_sort_order.saturating_add(i32::try_from(i).unwrap_or(i32::MAX))
                }),
            })
            .collect();

        (self.anchors, milestones)
    }
}
