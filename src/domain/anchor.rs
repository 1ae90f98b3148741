//! Anchor events
//!
//! Anchors are externally supplied dates a deal's milestones can be offset
//! from (escrow opening, contract effective date, ...). They are always
//! resolved and never depend on milestones.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::id::label_key;

/// Anchor names recognized when no configuration overrides them
pub const DEFAULT_KNOWN_ANCHORS: &[&str] = &["escrow_open", "effective_date", "closing_date"];

/// Supplied anchor dates, keyed by normalized name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, NaiveDate>")]
pub struct AnchorSet(BTreeMap<String, NaiveDate>);

impl AnchorSet {
    /// Creates an empty anchor set
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets an anchor date, returning the previous value
    pub fn set(&mut self, name: &str, date: NaiveDate) -> Option<NaiveDate> {
        self.0.insert(label_key(name), date)
    }

    /// Builder-style [`AnchorSet::set`]
    pub fn with(mut self, name: &str, date: NaiveDate) -> Self {
        self.set(name, date);
        self
    }

    /// Removes an anchor, returning its value
    pub fn remove(&mut self, name: &str) -> Option<NaiveDate> {
        self.0.remove(&label_key(name))
    }

    /// Looks up an anchor by (unnormalized) name
    pub fn get(&self, name: &str) -> Option<NaiveDate> {
        self.0.get(&label_key(name)).copied()
    }

    /// Returns true if no anchors are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of anchors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates anchors in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, NaiveDate)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Merges `other` into this set; `other` wins on conflicts
    pub fn merge(&mut self, other: &AnchorSet) {
        for (name, date) in other.iter() {
            self.0.insert(name.to_string(), date);
        }
    }
}

impl From<BTreeMap<String, NaiveDate>> for AnchorSet {
    fn from(raw: BTreeMap<String, NaiveDate>) -> Self {
        Self(
            raw.into_iter()
                .map(|(name, date)| (label_key(&name), date))
                .collect(),
        )
    }
}

impl FromIterator<(String, NaiveDate)> for AnchorSet {
    fn from_iter<I: IntoIterator<Item = (String, NaiveDate)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<BTreeMap<_, _>>())
    }
}

/// Anchor names a deal is expected to supply
///
/// A reference to a known name without a supplied date is a missing
/// anchor; a reference to anything else is an unknown reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownAnchors(BTreeSet<String>);

impl KnownAnchors {
    /// Creates a catalog from the given names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|n| label_key(n.as_ref()))
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    /// Returns true if the name is a recognized anchor
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&label_key(name))
    }

    /// Iterates names in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for KnownAnchors {
    fn default() -> Self {
        Self::new(DEFAULT_KNOWN_ANCHORS)
    }
}
