//! Resolution graph for milestones
//!
//! Makes the implicit "offset from" references between milestones explicit.
//! Edges run from a dependency to its dependent and carry the day offset.
//! Uses petgraph for cycle detection and traversal.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use super::anchor::{AnchorSet, KnownAnchors};
use super::id::label_key;
use super::milestone::{Milestone, MilestoneSpec};

/// A node in the resolution graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A milestone, by its position in the input
    Milestone(usize),
    /// A supplied anchor
    Anchor { name: String, date: NaiveDate },
    /// A known anchor name with no supplied date
    MissingAnchor(String),
    /// A reference matching no milestone, anchor or known anchor name
    Unknown(String),
    /// A reference to a label carried by more than one milestone
    DuplicateLabel(String),
}

/// Dependency graph over one batch of milestones
///
/// Built fresh for every resolution; milestones are keyed by input position
/// so duplicate labels remain distinct nodes.
#[derive(Debug)]
pub struct ResolutionGraph {
    /// The underlying directed graph
    graph: DiGraph<Node, i64>,

    /// Node index of each milestone, by input position
    milestone_nodes: Vec<NodeIndex>,

    /// Input positions of the milestones carrying each label key
    by_label: HashMap<String, Vec<usize>>,

    /// Non-milestone reference targets (anchors, shared labels), by key
    reference_nodes: HashMap<String, NodeIndex>,

    /// Input positions whose label is shared with another milestone
    duplicates: BTreeSet<usize>,
}

impl ResolutionGraph {
    /// Builds the graph for a milestone batch
    pub fn build(milestones: &[Milestone], anchors: &AnchorSet, known: &KnownAnchors) -> Self {
        let mut graph = DiGraph::new();

        // First pass: one node per milestone, grouped by label key
        let mut by_label: HashMap<String, Vec<usize>> = HashMap::new();
        let milestone_nodes: Vec<_> = milestones
            .iter()
            .enumerate()
            .map(|(i, m)| {
                by_label.entry(m.key()).or_default().push(i);
                graph.add_node(Node::Milestone(i))
            })
            .collect();

        let duplicates: BTreeSet<usize> = by_label
            .values()
            .filter(|positions| positions.len() > 1)
            .flatten()
            .copied()
            .collect();

        // Second pass: one edge per relative milestone
        let mut external: HashMap<String, NodeIndex> = HashMap::new();
        for (i, milestone) in milestones.iter().enumerate() {
            let MilestoneSpec::Relative { days, reference } = milestone.spec() else {
                continue;
            };

            let key = label_key(reference);
            let source = match by_label.get(&key).map(Vec::as_slice) {
                Some([single]) => milestone_nodes[*single],
                Some(shared) => *external.entry(key).or_insert_with(|| {
                    // Smallest display label keeps the node independent of input order
                    let label = shared
                        .iter()
                        .map(|&p| milestones[p].label.as_str())
                        .min()
                        .unwrap_or_default()
                        .to_string();
                    graph.add_node(Node::DuplicateLabel(label))
                }),
                None => *external.entry(key.clone()).or_insert_with(|| {
                    let node = match anchors.get(&key) {
                        Some(date) => Node::Anchor { name: key, date },
                        None if known.contains(&key) => Node::MissingAnchor(key),
                        None => Node::Unknown(key),
                    };
                    graph.add_node(node)
                }),
            };

            graph.add_edge(source, milestone_nodes[i], days);
        }

        Self {
            graph,
            milestone_nodes,
            by_label,
            reference_nodes: external,
            duplicates,
        }
    }

    /// Returns the node a milestone is offset from, with the offset
    pub fn dependency(&self, position: usize) -> Option<(&Node, i64)> {
        let idx = *self.milestone_nodes.get(position)?;
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .next()
            .map(|edge| (&self.graph[edge.source()], *edge.weight()))
    }

    /// Returns every milestone transitively offset from `label`
    ///
    /// Covers each milestone carrying the label, references routed through
    /// a shared label, and references to an anchor of that name. The
    /// milestones carrying the label itself are excluded.
    pub fn downstream_of(&self, label: &str) -> Vec<usize> {
        let key = label_key(label);
        let own = self.by_label.get(&key).map(Vec::as_slice).unwrap_or_default();

        let mut starts: Vec<NodeIndex> = own.iter().map(|&p| self.milestone_nodes[p]).collect();
        starts.extend(self.reference_nodes.get(&key).copied());

        let Some((&first, rest)) = starts.split_first() else {
            return vec![];
        };

        let mut dfs = Dfs::new(&self.graph, first);
        dfs.stack.extend_from_slice(rest);

        let mut out = Vec::new();
        while let Some(n) = dfs.next(&self.graph) {
            if let Some(p) = self.milestone_position(n) {
                if !own.contains(&p) {
                    out.push(p);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Returns milestones that transitively depend on themselves
    pub fn cyclic_milestones(&self) -> BTreeSet<usize> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some()
            })
            .flatten()
            .filter_map(|n| self.milestone_position(n))
            .collect()
    }

    /// Returns true if the milestone's label is shared with another milestone
    pub fn is_duplicate(&self, position: usize) -> bool {
        self.duplicates.contains(&position)
    }

    /// Returns the number of milestones in the graph
    pub fn len(&self) -> usize {
        self.milestone_nodes.len()
    }

    /// Returns true if the graph has no milestones
    pub fn is_empty(&self) -> bool {
        self.milestone_nodes.is_empty()
    }

    fn milestone_position(&self, idx: NodeIndex) -> Option<usize> {
        match self.graph.node_weight(idx) {
            Some(Node::Milestone(p)) => Some(*p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn build(milestones: &[Milestone], anchors: &AnchorSet) -> ResolutionGraph {
        ResolutionGraph::build(milestones, anchors, &KnownAnchors::default())
    }

    #[test]
    fn empty_graph() {
        let graph = build(&[], &AnchorSet::new());
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.cyclic_milestones().is_empty());
    }

    #[test]
    fn absolute_has_no_dependency() {
        let graph = build(
            &[Milestone::absolute("Closing", date(2026, 6, 1))],
            &AnchorSet::new(),
        );
        assert_eq!(graph.dependency(0), None);
    }

    #[test]
    fn milestone_reference() {
        let milestones = [
            Milestone::absolute("Closing", date(2026, 6, 1)),
            Milestone::relative("Inside Close", -5, "closing"),
        ];
        let graph = build(&milestones, &AnchorSet::new());

        assert_eq!(graph.dependency(1), Some((&Node::Milestone(0), -5)));
        assert_eq!(graph.downstream_of("Closing"), vec![1]);
    }

    #[test]
    fn anchor_references() {
        let milestones = [
            Milestone::relative("A", 10, "escrow_open"),
            Milestone::relative("B", 10, "effective_date"),
            Milestone::relative("C", 10, "board_vote"),
        ];
        let anchors = AnchorSet::new().with("escrow_open", date(2026, 1, 1));
        let graph = build(&milestones, &anchors);

        assert_eq!(
            graph.dependency(0),
            Some((
                &Node::Anchor {
                    name: "escrow_open".to_string(),
                    date: date(2026, 1, 1)
                },
                10
            ))
        );
        assert_eq!(
            graph.dependency(1),
            Some((&Node::MissingAnchor("effective_date".to_string()), 10))
        );
        assert_eq!(
            graph.dependency(2),
            Some((&Node::Unknown("board_vote".to_string()), 10))
        );
    }

    #[test]
    fn milestone_label_shadows_anchor() {
        let milestones = [
            Milestone::absolute("Escrow Open", date(2026, 2, 1)),
            Milestone::relative("A", 1, "escrow_open"),
        ];
        let anchors = AnchorSet::new().with("escrow_open", date(2026, 1, 1));
        let graph = build(&milestones, &anchors);

        assert_eq!(graph.dependency(1), Some((&Node::Milestone(0), 1)));
    }

    #[test]
    fn duplicate_labels() {
        let milestones = [
            Milestone::absolute("closing", date(2026, 6, 1)),
            Milestone::absolute("Closing", date(2026, 6, 2)),
            Milestone::relative("Inside Close", -5, "Closing"),
        ];
        let graph = build(&milestones, &AnchorSet::new());

        assert!(graph.is_duplicate(0));
        assert!(graph.is_duplicate(1));
        assert!(!graph.is_duplicate(2));
        assert_eq!(
            graph.dependency(2),
            Some((&Node::DuplicateLabel("Closing".to_string()), -5))
        );
    }

    #[test]
    fn cycle_detection() {
        let milestones = [
            Milestone::relative("A", 1, "C"),
            Milestone::relative("B", 1, "A"),
            Milestone::relative("C", 1, "B"),
            Milestone::relative("D", 1, "C"),
        ];
        let graph = build(&milestones, &AnchorSet::new());

        assert_eq!(graph.cyclic_milestones(), BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn self_reference_is_cyclic() {
        let graph = build(&[Milestone::relative("A", 1, "a")], &AnchorSet::new());
        assert_eq!(graph.cyclic_milestones(), BTreeSet::from([0]));
    }

    #[test]
    fn downstream_follows_chains() {
        let milestones = [
            Milestone::absolute("A", date(2026, 1, 1)),
            Milestone::relative("B", 1, "A"),
            Milestone::relative("C", 1, "B"),
            Milestone::relative("D", 1, "A"),
            Milestone::absolute("E", date(2026, 1, 1)),
        ];
        let graph = build(&milestones, &AnchorSet::new());

        assert_eq!(graph.downstream_of("A"), vec![1, 2, 3]);
        assert_eq!(graph.downstream_of("b"), vec![2]);
        assert!(graph.downstream_of("E").is_empty());
        assert!(graph.downstream_of("Nowhere").is_empty());
    }

    #[test]
    fn downstream_through_shared_label() {
        let milestones = [
            Milestone::absolute("Closing", date(2026, 6, 1)),
            Milestone::absolute("closing", date(2026, 6, 2)),
            Milestone::relative("Inside Close", -5, "Closing"),
            Milestone::relative("Walkthrough", -1, "Inside Close"),
        ];
        let graph = build(&milestones, &AnchorSet::new());

        assert_eq!(graph.downstream_of("CLOSING"), vec![2, 3]);
    }

    #[test]
    fn downstream_of_anchor() {
        let milestones = [
            Milestone::relative("Deposit Due", 3, "escrow_open"),
            Milestone::relative("Inspection", 10, "Deposit Due"),
            Milestone::absolute("Closing", date(2026, 6, 1)),
        ];
        let anchors = AnchorSet::new().with("escrow_open", date(2026, 1, 1));
        let graph = build(&milestones, &anchors);

        assert_eq!(graph.downstream_of("Escrow Open"), vec![0, 1]);
    }

    #[test]
    fn invalid_milestones_add_no_edges() {
        let mut both = Milestone::absolute("A", date(2026, 1, 1));
        both.offset_days = Some(3);
        both.offset_reference = Some("B".to_string());
        let milestones = [both, Milestone::absolute("B", date(2026, 1, 1))];
        let graph = build(&milestones, &AnchorSet::new());

        assert_eq!(graph.dependency(0), None);
        assert!(graph.downstream_of("B").is_empty());
    }
}
