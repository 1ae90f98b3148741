//! Deal domain model
//!
//! A deal owns its anchor dates and the flat list of milestone records.
//! Nothing is resolved at rest; callers run the resolver whenever they
//! need concrete dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::anchor::{AnchorSet, KnownAnchors};
use super::graph::ResolutionGraph;
use super::id::{label_key, DealId};
use super::milestone::Milestone;
use super::resolver::{MilestoneResolver, ResolutionReport};

/// A deal with its timeline inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Unique identifier
    pub id: DealId,

    /// Human-readable name (usually the property address)
    pub name: String,

    /// Anchor event dates
    #[serde(default, skip_serializing_if = "AnchorSet::is_empty")]
    pub anchors: AnchorSet,

    /// Milestone records in insertion order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestones: Vec<Milestone>,

    /// When the deal was created
    pub created_at: DateTime<Utc>,

    /// When the deal was last updated
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Creates an empty deal
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: DealId::new(&name, now),
            name,
            anchors: AnchorSet::new(),
            milestones: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets an anchor date
    pub fn set_anchor(&mut self, name: &str, date: NaiveDate) -> Option<NaiveDate> {
        self.updated_at = Utc::now();
        self.anchors.set(name, date)
    }

    /// Clears an anchor date
    pub fn clear_anchor(&mut self, name: &str) -> Option<NaiveDate> {
        let removed = self.anchors.remove(name);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Returns the milestone with a matching label
    pub fn milestone(&self, label: &str) -> Option<&Milestone> {
        let key = label_key(label);
        self.milestones.iter().find(|m| m.key() == key)
    }

    /// Inserts or replaces a milestone by label, returning the replaced one
    ///
    /// Every existing record sharing the label is replaced, which also
    /// clears duplicates left behind by an import.
    pub fn upsert_milestone(&mut self, milestone: Milestone) -> Option<Milestone> {
        let key = milestone.key();
        self.updated_at = Utc::now();

        match self.milestones.iter().position(|m| m.key() == key) {
            Some(pos) => {
                let previous = std::mem::replace(&mut self.milestones[pos], milestone);
                let mut i = pos + 1;
                while i < self.milestones.len() {
                    if self.milestones[i].key() == key {
                        self.milestones.remove(i);
                    } else {
                        i += 1;
                    }
                }
                Some(previous)
            }
            None => {
                self.milestones.push(milestone);
                None
            }
        }
    }

    /// Removes every milestone with a matching label
    pub fn remove_milestone(&mut self, label: &str) -> Vec<Milestone> {
        let key = label_key(label);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.milestones)
            .into_iter()
            .partition(|m| m.key() == key);
        self.milestones = kept;
        if !removed.is_empty() {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Replaces all milestones with an imported batch
    pub fn replace_milestones(&mut self, milestones: Vec<Milestone>) {
        self.milestones = milestones;
        self.updated_at = Utc::now();
    }

    /// Appends an imported batch as-is
    pub fn extend_milestones(&mut self, milestones: impl IntoIterator<Item = Milestone>) {
        self.milestones.extend(milestones);
        self.updated_at = Utc::now();
    }

    /// Next free sort order after the existing milestones
    pub fn next_sort_order(&self) -> i32 {
        self.milestones
            .iter()
            .map(|m| m.sort_order)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    /// Resolves the deal's timeline
    pub fn resolve(&self, resolver: &MilestoneResolver) -> ResolutionReport {
        resolver.resolve(&self.milestones, &self.anchors)
    }

    /// Labels of milestones that would lose their reference if `label`
    /// were removed
    pub fn dependents_of(&self, label: &str) -> Vec<String> {
        let graph = ResolutionGraph::build(&self.milestones, &self.anchors, &KnownAnchors::default());

        let mut labels: Vec<String> = graph
            .downstream_of(label)
            .into_iter()
            .map(|i| self.milestones[i].label.clone())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }
}
