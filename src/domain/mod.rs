//! Domain models for deal timelines
//!
//! Contains the core business logic without any I/O concerns.

mod anchor;
mod deal;
mod extraction;
mod graph;
mod id;
mod milestone;
mod resolver;

pub use anchor::{AnchorSet, KnownAnchors, DEFAULT_KNOWN_ANCHORS};
pub use deal::Deal;
pub use extraction::{ExtractionBatch, MilestoneCandidate};
pub use graph::{Node, ResolutionGraph};
pub use id::{label_key, DealId, IdError};
pub use milestone::{parse_date, Milestone, MilestoneError, MilestoneSpec, SpecProblem};
pub use resolver::{
    MilestoneResolver, Resolution, ResolutionReport, ResolvedMilestone, UnresolvedReason,
};
