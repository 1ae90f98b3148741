//! dealdates - Milestone date resolution for real-estate deals
//!
//! A deal's timeline is a set of named milestones, each pinned to a
//! calendar date or offset by some days from another milestone or from an
//! anchor event such as escrow opening. This crate resolves those chains
//! into concrete dates, reporting a typed reason for every milestone it
//! cannot resolve, and ships a local-first CLI for keeping deals on disk.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    AnchorSet, Deal, DealId, Milestone, MilestoneResolver, Resolution, ResolutionReport,
    UnresolvedReason,
};
