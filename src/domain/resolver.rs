//! Milestone date resolution
//!
//! Turns a batch of milestones plus the deal's anchor dates into a concrete
//! calendar date (or a typed failure) for every milestone. Resolution is a
//! pure function of its inputs: no I/O, no retained state, and the result
//! does not depend on input order.
//!
//! Failures are isolated. A bad milestone only fails itself and the
//! milestones offset from it (transitively); those inherit the upstream
//! reason and name the milestone where the failure started in `via`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::anchor::{AnchorSet, KnownAnchors};
use super::graph::{Node, ResolutionGraph};
use super::id::label_key;
use super::milestone::{Milestone, MilestoneSpec};

/// Why a milestone has no date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// References a known anchor whose date was not supplied
    MissingAnchor,
    /// Depends on itself, directly or through other milestones
    CyclicReference,
    /// Both or neither of date and offset are set, or the label is not unique
    AmbiguousSpec,
    /// References no milestone, supplied anchor or known anchor name
    UnknownReference,
    /// The offset moves the date outside the supported calendar range
    OutOfRange,
}

impl UnresolvedReason {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            UnresolvedReason::MissingAnchor => "missing_anchor",
            UnresolvedReason::CyclicReference => "cyclic_reference",
            UnresolvedReason::AmbiguousSpec => "ambiguous_spec",
            UnresolvedReason::UnknownReference => "unknown_reference",
            UnresolvedReason::OutOfRange => "out_of_range",
        }
    }

    /// User-facing explanation
    pub fn message(&self) -> &'static str {
        match self {
            UnresolvedReason::MissingAnchor => {
                "depends on a deal date that has not been entered yet"
            }
            UnresolvedReason::CyclicReference => {
                "is part of a circular chain of offsets; one milestone in the chain needs a fixed date"
            }
            UnresolvedReason::AmbiguousSpec => {
                "needs exactly one of a fixed date or an offset, and a label no other milestone uses"
            }
            UnresolvedReason::UnknownReference => {
                "is offset from something that is neither a milestone nor a deal date"
            }
            UnresolvedReason::OutOfRange => "falls outside the supported calendar range",
        }
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome for a single milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved {
        date: NaiveDate,
    },
    Unresolved {
        reason: UnresolvedReason,
        /// Label of the upstream milestone the failure is inherited from
        #[serde(default, skip_serializing_if = "Option::is_none")]
        via: Option<String>,
    },
}

impl Resolution {
    fn failed(reason: UnresolvedReason) -> Self {
        Resolution::Unresolved { reason, via: None }
    }

    /// Returns the resolved date, if any
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Resolution::Resolved { date } => Some(*date),
            Resolution::Unresolved { .. } => None,
        }
    }

    /// Returns the failure reason, if any
    pub fn reason(&self) -> Option<UnresolvedReason> {
        match self {
            Resolution::Resolved { .. } => None,
            Resolution::Unresolved { reason, .. } => Some(*reason),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

/// A milestone paired with its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMilestone {
    pub label: String,
    pub sort_order: i32,
    #[serde(flatten)]
    pub resolution: Resolution,
}

/// Outcomes for a whole batch, one entry per input milestone in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionReport {
    entries: Vec<ResolvedMilestone>,
}

impl ResolutionReport {
    /// Entries in input order
    pub fn entries(&self) -> &[ResolvedMilestone] {
        &self.entries
    }

    /// Looks up the first entry with a matching label
    pub fn get(&self, label: &str) -> Option<&Resolution> {
        let key = label_key(label);
        self.entries
            .iter()
            .find(|e| label_key(&e.label) == key)
            .map(|e| &e.resolution)
    }

    /// Resolved date for a label, if it resolved
    pub fn date(&self, label: &str) -> Option<NaiveDate> {
        self.get(label).and_then(Resolution::date)
    }

    /// Entries that resolved to a date
    pub fn resolved(&self) -> impl Iterator<Item = &ResolvedMilestone> {
        self.entries.iter().filter(|e| e.resolution.is_resolved())
    }

    /// Entries that failed to resolve
    pub fn unresolved(&self) -> impl Iterator<Item = &ResolvedMilestone> {
        self.entries.iter().filter(|e| !e.resolution.is_resolved())
    }

    /// Returns true if every milestone resolved
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.resolution.is_resolved())
    }

    /// Failure counts per reason
    pub fn reason_counts(&self) -> BTreeMap<UnresolvedReason, usize> {
        let mut counts = BTreeMap::new();
        for reason in self.entries.iter().filter_map(|e| e.resolution.reason()) {
            *counts.entry(reason).or_insert(0) += 1;
        }
        counts
    }

    /// Entries sorted for display by sort order, then label
    pub fn display_order(&self) -> Vec<&ResolvedMilestone> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| label_key(&a.label).cmp(&label_key(&b.label)))
                .then_with(|| a.label.cmp(&b.label))
        });
        sorted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a walk up the dependency chain ended on
enum Base {
    Date(NaiveDate),
    Failed {
        reason: UnresolvedReason,
        /// Milestone the failure belongs to; `None` when it starts at the
        /// first milestone of the unwound chain
        origin: Option<String>,
    },
}

impl Base {
    fn from_resolution(resolution: &Resolution, label: &str) -> Self {
        match resolution {
            Resolution::Resolved { date } => Base::Date(*date),
            Resolution::Unresolved { reason, via } => Base::Failed {
                reason: *reason,
                origin: Some(via.clone().unwrap_or_else(|| label.to_string())),
            },
        }
    }

    /// Outcome for the milestone at `position`, offset from this base
    fn step(&self, graph: &ResolutionGraph, position: usize) -> Resolution {
        let days = graph.dependency(position).map_or(0, |(_, d)| d);
        match self {
            Base::Date(date) => match shift(*date, days) {
                Some(date) => Resolution::Resolved { date },
                None => Resolution::failed(UnresolvedReason::OutOfRange),
            },
            Base::Failed { reason, origin } => Resolution::Unresolved {
                reason: *reason,
                via: origin.clone(),
            },
        }
    }
}

/// Resolves milestone batches against anchor dates
///
/// Immutable after construction; one resolver can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct MilestoneResolver {
    known: KnownAnchors,
}

impl MilestoneResolver {
    /// Creates a resolver recognizing the default anchor names
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver recognizing the given anchor names
    pub fn with_known_anchors(known: KnownAnchors) -> Self {
        Self { known }
    }

    /// Anchor names this resolver treats as expected deal dates
    pub fn known_anchors(&self) -> &KnownAnchors {
        &self.known
    }

    /// Resolves every milestone in the batch
    pub fn resolve(&self, milestones: &[Milestone], anchors: &AnchorSet) -> ResolutionReport {
        let graph = ResolutionGraph::build(milestones, anchors, &self.known);
        let mut memo: Vec<Option<Resolution>> = vec![None; milestones.len()];

        for (i, milestone) in milestones.iter().enumerate() {
            if graph.is_duplicate(i) || matches!(milestone.spec(), MilestoneSpec::Invalid(_)) {
                memo[i] = Some(Resolution::failed(UnresolvedReason::AmbiguousSpec));
            }
        }

        for i in graph.cyclic_milestones() {
            memo[i].get_or_insert(Resolution::failed(UnresolvedReason::CyclicReference));
        }

        let entries = milestones
            .iter()
            .enumerate()
            .map(|(i, m)| ResolvedMilestone {
                label: m.label.clone(),
                sort_order: m.sort_order,
                resolution: Self::resolve_chain(i, milestones, &graph, &mut memo),
            })
            .collect();

        ResolutionReport { entries }
    }

    /// Walks up from `start` to the first already-known date or failure,
    /// then unwinds the chain applying offsets. Returns the outcome for
    /// `start`; every milestone on the way is memoized.
    fn resolve_chain(
        start: usize,
        milestones: &[Milestone],
        graph: &ResolutionGraph,
        memo: &mut [Option<Resolution>],
    ) -> Resolution {
        let mut pending = Vec::new();
        let mut cursor = start;

        let mut base = loop {
            if let Some(done) = &memo[cursor] {
                if cursor == start {
                    return done.clone();
                }
                break Base::from_resolution(done, &milestones[cursor].label);
            }

            if let MilestoneSpec::Absolute(date) = milestones[cursor].spec() {
                let resolution = Resolution::Resolved { date };
                memo[cursor] = Some(resolution.clone());
                if cursor == start {
                    return resolution;
                }
                break Base::Date(date);
            }

            pending.push(cursor);
            match graph.dependency(cursor) {
                Some((Node::Milestone(next), _)) => cursor = *next,
                Some((Node::Anchor { date, .. }, _)) => break Base::Date(*date),
                Some((Node::MissingAnchor(_), _)) => {
                    break Base::Failed {
                        reason: UnresolvedReason::MissingAnchor,
                        origin: None,
                    }
                }
                Some((Node::DuplicateLabel(label), _)) => {
                    break Base::Failed {
                        reason: UnresolvedReason::AmbiguousSpec,
                        origin: Some(label.clone()),
                    }
                }
                Some((Node::Unknown(_), _)) | None => {
                    break Base::Failed {
                        reason: UnresolvedReason::UnknownReference,
                        origin: None,
                    }
                }
            }
        };

        // `start` sits at the bottom of `pending`; it is resolved last
        while let Some(position) = pending.pop().filter(|&p| p != start) {
            let resolution = base.step(graph, position);
            base = Base::from_resolution(&resolution, &milestones[position].label);
            memo[position] = Some(resolution);
        }

        let resolution = base.step(graph, start);
        memo[start] = Some(resolution.clone());
        resolution
    }
}

/// Calendar-day arithmetic, `None` outside chrono's date range
fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolve(milestones: &[Milestone], anchors: &AnchorSet) -> ResolutionReport {
        MilestoneResolver::new().resolve(milestones, anchors)
    }

    fn unresolved(reason: UnresolvedReason, via: Option<&str>) -> Resolution {
        Resolution::Unresolved {
            reason,
            via: via.map(str::to_string),
        }
    }

    #[test]
    fn empty_batch() {
        let report = resolve(&[], &AnchorSet::new());
        assert!(report.is_empty());
        assert!(report.is_complete());
    }

    #[test]
    fn transitive_offsets() {
        let milestones = [
            Milestone::relative("B", 30, "A"),
            Milestone::relative("A", 90, "escrow_open"),
        ];
        let anchors = AnchorSet::new().with("escrow_open", date(2026, 1, 1));

        let report = resolve(&milestones, &anchors);

        assert_eq!(report.date("A"), Some(date(2026, 4, 1)));
        assert_eq!(report.date("B"), Some(date(2026, 5, 1)));
        assert!(report.is_complete());
    }

    #[test]
    fn chain_members_resolved_by_an_earlier_walk_keep_their_outcomes() {
        let milestones = [
            Milestone::relative("C", 1, "B"),
            Milestone::relative("B", 1, "A"),
            Milestone::relative("A", 1, "escrow_open"),
            Milestone::relative("D", 1, "Nowhere"),
            Milestone::absolute("E", date(2026, 1, 1)),
        ];

        let report = resolve(&milestones, &AnchorSet::new());

        assert_eq!(report.get("A"), Some(&unresolved(UnresolvedReason::MissingAnchor, None)));
        assert_eq!(
            report.get("B"),
            Some(&unresolved(UnresolvedReason::MissingAnchor, Some("A")))
        );
        assert_eq!(
            report.get("C"),
            Some(&unresolved(UnresolvedReason::MissingAnchor, Some("A")))
        );
        assert_eq!(
            report.get("D"),
            Some(&unresolved(UnresolvedReason::UnknownReference, None))
        );
        assert_eq!(report.date("E"), Some(date(2026, 1, 1)));
        assert_eq!(report.len(), milestones.len());
    }

    #[test]
    fn negative_offset_crosses_month() {
        let milestones = [
            Milestone::absolute("Closing", date(2026, 3, 15)),
            Milestone::relative("Inside Close", -15, "Closing"),
        ];

        let report = resolve(&milestones, &AnchorSet::new());
        assert_eq!(report.date("Inside Close"), Some(date(2026, 2, 28)));
    }

    #[test]
    fn offsets_cross_year_and_leap_day() {
        let milestones = [
            Milestone::relative("Year End", 1, "effective_date"),
            Milestone::relative("Leap", 59, "Year End"),
        ];
        let anchors = AnchorSet::new().with("effective_date", date(2027, 12, 31));

        let report = resolve(&milestones, &anchors);
        assert_eq!(report.date("Year End"), Some(date(2028, 1, 1)));
        assert_eq!(report.date("Leap"), Some(date(2028, 2, 29)));
    }

    #[test]
    fn zero_offset_copies_reference() {
        let milestones = [Milestone::relative("Open", 0, "escrow_open")];
        let anchors = AnchorSet::new().with("escrow_open", date(2026, 7, 4));

        assert_eq!(resolve(&milestones, &anchors).date("Open"), Some(date(2026, 7, 4)));
    }

    #[test]
    fn cycle_reports_every_member() {
        let milestones = [
            Milestone::relative("A", 1, "B"),
            Milestone::relative("B", 1, "A"),
        ];

        let report = resolve(&milestones, &AnchorSet::new());

        assert_eq!(
            report.get("A"),
            Some(&unresolved(UnresolvedReason::CyclicReference, None))
        );
        assert_eq!(
            report.get("B"),
            Some(&unresolved(UnresolvedReason::CyclicReference, None))
        );
    }

    #[test]
    fn self_reference_is_cyclic() {
        let report = resolve(&[Milestone::relative("A", 3, "A")], &AnchorSet::new());
        assert_eq!(
            report.get("A").and_then(Resolution::reason),
            Some(UnresolvedReason::CyclicReference)
        );
    }

    #[test]
    fn dependents_of_cycle_inherit_failure() {
        let milestones = [
            Milestone::relative("A", 1, "B"),
            Milestone::relative("B", 1, "A"),
            Milestone::relative("C", 1, "A"),
            Milestone::relative("D", 1, "C"),
        ];

        let report = resolve(&milestones, &AnchorSet::new());

        assert_eq!(
            report.get("C"),
            Some(&unresolved(UnresolvedReason::CyclicReference, Some("A")))
        );
        assert_eq!(
            report.get("D"),
            Some(&unresolved(UnresolvedReason::CyclicReference, Some("A")))
        );
    }

    #[test]
    fn cycle_does_not_block_independent_milestones() {
        let milestones = [
            Milestone::relative("A", 1, "B"),
            Milestone::relative("B", 1, "A"),
            Milestone::absolute("Closing", date(2026, 6, 30)),
        ];

        let report = resolve(&milestones, &AnchorSet::new());

        assert_eq!(report.date("Closing"), Some(date(2026, 6, 30)));
        assert_eq!(report.resolved().count(), 1);
        assert_eq!(report.unresolved().count(), 2);
    }

    #[test]
    fn long_chain_resolves_without_recursion() {
        let mut milestones = vec![Milestone::absolute("m0", date(2026, 1, 1))];
        for i in 1..5_000 {
            milestones.push(Milestone::relative(format!("m{i}"), 1, format!("m{}", i - 1)));
        }
        milestones.reverse();

        let report = resolve(&milestones, &AnchorSet::new());

        assert!(report.is_complete());
        assert_eq!(report.date("m4999"), Some(date(2026, 1, 1) + Days::new(4_999)));
    }

    #[test]
    fn missing_anchor() {
        let milestones = [
            Milestone::relative("Feasibility Ends", 30, "escrow_open"),
            Milestone::relative("Deposit Due", 3, "Feasibility Ends"),
            Milestone::absolute("Closing", date(2026, 6, 1)),
        ];

        let report = resolve(&milestones, &AnchorSet::new());

        assert_eq!(
            report.get("Feasibility Ends"),
            Some(&unresolved(UnresolvedReason::MissingAnchor, None))
        );
        assert_eq!(
            report.get("Deposit Due"),
            Some(&unresolved(
                UnresolvedReason::MissingAnchor,
                Some("Feasibility Ends")
            ))
        );
        assert_eq!(report.date("Closing"), Some(date(2026, 6, 1)));
    }

    #[test]
    fn unknown_reference() {
        let milestones = [Milestone::relative("A", 5, "Board Vote")];

        let report = resolve(&milestones, &AnchorSet::new());
        assert_eq!(
            report.get("A"),
            Some(&unresolved(UnresolvedReason::UnknownReference, None))
        );
    }

    #[test]
    fn supplied_anchor_outside_catalog_resolves() {
        let milestones = [Milestone::relative("A", 5, "Board Vote")];
        let anchors = AnchorSet::new().with("board_vote", date(2026, 3, 1));

        assert_eq!(resolve(&milestones, &anchors).date("A"), Some(date(2026, 3, 6)));
    }

    #[test]
    fn custom_known_anchors() {
        let resolver = MilestoneResolver::with_known_anchors(KnownAnchors::new(["board_vote"]));
        let milestones = [
            Milestone::relative("A", 5, "Board Vote"),
            Milestone::relative("B", 5, "escrow_open"),
        ];

        let report = resolver.resolve(&milestones, &AnchorSet::new());

        assert_eq!(
            report.get("A").and_then(Resolution::reason),
            Some(UnresolvedReason::MissingAnchor)
        );
        assert_eq!(
            report.get("B").and_then(Resolution::reason),
            Some(UnresolvedReason::UnknownReference)
        );
    }

    #[test]
    fn both_modes_is_ambiguous() {
        let mut m = Milestone::absolute("A", date(2026, 1, 1));
        m.offset_days = Some(10);

        let report = resolve(&[m], &AnchorSet::new());
        assert_eq!(
            report.get("A"),
            Some(&unresolved(UnresolvedReason::AmbiguousSpec, None))
        );
    }

    #[test]
    fn neither_mode_is_ambiguous() {
        let m = Milestone {
            label: "A".to_string(),
            date: None,
            offset_days: None,
            offset_reference: None,
            sort_order: 0,
        };

        let report = resolve(&[m], &AnchorSet::new());
        assert_eq!(
            report.get("A").and_then(Resolution::reason),
            Some(UnresolvedReason::AmbiguousSpec)
        );
    }

    #[test]
    fn duplicate_labels_are_ambiguous() {
        let milestones = [
            Milestone::absolute("Closing", date(2026, 6, 1)),
            Milestone::absolute("closing", date(2026, 6, 2)),
            Milestone::relative("Inside Close", -5, "Closing"),
            Milestone::absolute("Inspection", date(2026, 2, 1)),
        ];

        let report = resolve(&milestones, &AnchorSet::new());

        assert_eq!(report.entries()[0].resolution.reason(), Some(UnresolvedReason::AmbiguousSpec));
        assert_eq!(report.entries()[1].resolution.reason(), Some(UnresolvedReason::AmbiguousSpec));
        assert_eq!(
            report.get("Inside Close"),
            Some(&unresolved(UnresolvedReason::AmbiguousSpec, Some("Closing")))
        );
        assert_eq!(report.date("Inspection"), Some(date(2026, 2, 1)));
    }

    #[test]
    fn labels_match_loosely() {
        let milestones = [
            Milestone::relative("Feasibility Ends", 30, "Escrow Open"),
            Milestone::relative("Deposit", 1, "feasibility-ends"),
        ];
        let anchors = AnchorSet::new().with("escrow_open", date(2026, 1, 1));

        let report = resolve(&milestones, &anchors);
        assert_eq!(report.date("Deposit"), Some(date(2026, 2, 1)));
    }

    #[test]
    fn out_of_range_offset() {
        let milestones = [
            Milestone::relative("Far", i64::MAX, "escrow_open"),
            Milestone::relative("Farther", 1, "Far"),
        ];
        let anchors = AnchorSet::new().with("escrow_open", date(2026, 1, 1));

        let report = resolve(&milestones, &anchors);
        assert_eq!(
            report.get("Far"),
            Some(&unresolved(UnresolvedReason::OutOfRange, None))
        );
        assert_eq!(
            report.get("Farther"),
            Some(&unresolved(UnresolvedReason::OutOfRange, Some("Far")))
        );
    }

    #[test]
    fn display_order_uses_sort_order() {
        let milestones = [
            Milestone::absolute("Closing", date(2026, 6, 1)).with_sort_order(3),
            Milestone::absolute("Inspection", date(2026, 2, 1)).with_sort_order(1),
            Milestone::absolute("Appraisal", date(2026, 3, 1)).with_sort_order(1),
        ];

        let report = resolve(&milestones, &AnchorSet::new());
        let labels: Vec<_> = report.display_order().iter().map(|e| e.label.as_str()).collect();

        assert_eq!(labels, vec!["Appraisal", "Inspection", "Closing"]);
        // Entries themselves stay in input order
        assert_eq!(report.entries()[0].label, "Closing");
    }

    #[test]
    fn reason_counts() {
        let milestones = [
            Milestone::relative("A", 1, "B"),
            Milestone::relative("B", 1, "A"),
            Milestone::relative("C", 1, "escrow_open"),
            Milestone::absolute("D", date(2026, 1, 1)),
        ];

        let counts = resolve(&milestones, &AnchorSet::new()).reason_counts();

        assert_eq!(counts.get(&UnresolvedReason::CyclicReference), Some(&2));
        assert_eq!(counts.get(&UnresolvedReason::MissingAnchor), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn reason_messages_are_distinct() {
        let reasons = [
            UnresolvedReason::MissingAnchor,
            UnresolvedReason::CyclicReference,
            UnresolvedReason::AmbiguousSpec,
            UnresolvedReason::UnknownReference,
            UnresolvedReason::OutOfRange,
        ];
        let messages: std::collections::HashSet<_> = reasons.iter().map(|r| r.message()).collect();
        assert_eq!(messages.len(), reasons.len());
        assert_eq!(UnresolvedReason::MissingAnchor.to_string(), "missing_anchor");
    }

    #[test]
    fn report_serializes_flat_entries() {
        let milestones = [
            Milestone::absolute("Closing", date(2026, 6, 1)).with_sort_order(2),
            Milestone::relative("Inside Close", -5, "escrow_open"),
        ];

        let json = serde_json::to_value(resolve(&milestones, &AnchorSet::new())).unwrap();

        assert_eq!(
            json,
            serde_json::json!([
                {"label": "Closing", "sort_order": 2, "status": "resolved", "date": "2026-06-01"},
                {"label": "Inside Close", "sort_order": 0, "status": "unresolved", "reason": "missing_anchor"},
            ])
        );
    }

    fn arb_milestone() -> impl Strategy<Value = Milestone> {
        let labels = prop::sample::select(vec!["A", "B", "C", "D", "E", "F"]);
        let references =
            prop::sample::select(vec!["A", "B", "C", "D", "E", "F", "escrow_open", "closing_date", "nowhere"]);
        (
            labels,
            prop::option::of(0i64..3_000),
            prop::option::of(-400i64..400),
            prop::option::of(references),
            -5i32..5,
        )
            .prop_map(|(label, day, offset, reference, sort_order)| Milestone {
                label: label.to_string(),
                date: day.map(|d| date(2025, 1, 1) + Days::new(d as u64)),
                offset_days: offset,
                offset_reference: reference.map(str::to_string),
                sort_order,
            })
    }

    proptest! {
        #[test]
        fn resolution_is_deterministic(milestones in prop::collection::vec(arb_milestone(), 0..12)) {
            let anchors = AnchorSet::new().with("escrow_open", date(2026, 1, 1));
            prop_assert_eq!(resolve(&milestones, &anchors), resolve(&milestones, &anchors));
        }

        #[test]
        fn resolution_is_order_independent(
            (milestones, shuffled) in prop::collection::vec(arb_milestone(), 0..12)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let anchors = AnchorSet::new().with("escrow_open", date(2026, 1, 1));

            let mut expected: Vec<_> = resolve(&milestones, &anchors).entries().to_vec();
            let mut actual: Vec<_> = resolve(&shuffled, &anchors).entries().to_vec();
            let by_content = |a: &ResolvedMilestone, b: &ResolvedMilestone| {
                format!("{a:?}").cmp(&format!("{b:?}"))
            };
            expected.sort_by(by_content);
            actual.sort_by(by_content);

            prop_assert_eq!(expected, actual);
        }

        #[test]
        fn relative_date_is_reference_plus_offset(
            base_days in 0u64..20_000,
            offset in -10_000i64..10_000,
        ) {
            let base = date(2000, 1, 1) + Days::new(base_days);
            let milestones = [
                Milestone::absolute("Base", base),
                Milestone::relative("Derived", offset, "Base"),
            ];

            let report = resolve(&milestones, &AnchorSet::new());
            let derived = report.date("Derived").unwrap();

            prop_assert_eq!((derived - base).num_days(), offset);
        }
    }
}
