//! Fragment graph types.
//!
//! A [`FragmentGraph`] is derived data: it is rebuilt from the fragment list
//! on every change and never persisted. Nodes are identified by the
//! fragment's resolved identity; edges connect fragments that share at
//! least one tag.
//!
//! # Edge Strength
//!
//! | Shared tags | Strength | Stroke width |
//! |-------------|----------|--------------|
//! | 1 | `Weak` | 2 |
//! | 2 | `Moderate` | 4 |
//! | 3+ | `Strong` | 6 |

use super::{Fragment, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Widest stroke used to draw an edge.
const MAX_STROKE_WIDTH: usize = 6;

/// A node of the fragment graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Resolved identity of the fragment.
    pub id: String,
    /// The fragment this node displays.
    pub fragment: Fragment,
    /// Layout position (grid plus jitter, cosmetic only).
    pub position: Point,
    /// Whether the node is shown expanded.
    #[serde(default)]
    pub expanded: bool,
}

/// Visual strength bucket of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStrength {
    /// One shared tag.
    Weak,
    /// Two shared tags.
    Moderate,
    /// Three or more shared tags.
    Strong,
}

impl EdgeStrength {
    /// Buckets a shared-tag count.
    #[must_use]
    pub const fn from_weight(weight: usize) -> Self {
        match weight {
            0 | 1 => Self::Weak,
            2 => Self::Moderate,
            _ => Self::Strong,
        }
    }

    /// Returns the strength as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for EdgeStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An undirected edge between two fragments sharing tags.
///
/// `source` is always the lexicographically smaller identity, so an
/// unordered pair maps to exactly one edge id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// `"<source>-<target>"`.
    pub id: String,
    /// Smaller resolved identity.
    pub source: String,
    /// Larger resolved identity.
    pub target: String,
    /// Number of distinct shared tags (always at least one).
    pub weight: usize,
    /// Human-readable label.
    pub label: String,
    /// Strength bucket derived from `weight`.
    pub strength: EdgeStrength,
}

impl GraphEdge {
    /// Creates an edge between two identities, normalizing their order.
    #[must_use]
    pub fn between(a: &str, b: &str, weight: usize) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            id: pair_key(source, target),
            source: source.to_string(),
            target: target.to_string(),
            weight,
            label: edge_label(weight),
            strength: EdgeStrength::from_weight(weight),
        }
    }

    /// Stroke width for drawing, proportional to weight and capped.
    #[must_use]
    pub fn stroke_width(&self) -> usize {
        (self.weight * 2).min(MAX_STROKE_WIDTH)
    }

    /// Returns true if the edge touches `id`.
    #[must_use]
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// Builds the normalized key of an unordered identity pair.
#[must_use]
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}-{b}")
    } else {
        format!("{b}-{a}")
    }
}

fn edge_label(weight: usize) -> String {
    format!("{weight} shared tags")
}

/// Aggregate counts shown next to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    /// Number of fragments (one node each).
    pub fragment_count: usize,
    /// Number of edges.
    pub edge_count: usize,
    /// Size of the union of all fragments' tags.
    pub distinct_tag_count: usize,
}

impl GraphStats {
    /// Computes statistics from a fragment list and its edges.
    #[must_use]
    pub fn compute(fragments: &[Fragment], edges: &[GraphEdge]) -> Self {
        let tags: HashSet<&str> = fragments
            .iter()
            .flat_map(|f| f.tags.iter().map(String::as_str))
            .collect();
        Self {
            fragment_count: fragments.len(),
            edge_count: edges.len(),
            distinct_tag_count: tags.len(),
        }
    }
}

/// Nodes and edges produced by one graph build.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FragmentGraph {
    /// One node per input fragment, in input order.
    pub nodes: Vec<GraphNode>,
    /// One edge per unordered pair sharing at least one tag.
    pub edges: Vec<GraphEdge>,
}

impl FragmentGraph {
    /// Finds a node by resolved identity.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Finds the edge joining two identities, in either order.
    #[must_use]
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&GraphEdge> {
        let key = pair_key(a, b);
        self.edges.iter().find(|e| e.id == key)
    }

    /// Returns the identities directly connected to `id`.
    #[must_use]
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.touches(id))
            .map(|e| if e.source == id { e.target.as_str() } else { e.source.as_str() })
            .collect()
    }

    /// Computes statistics over the graph's own nodes and edges.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let tags: HashSet<&str> = self
            .nodes
            .iter()
            .flat_map(|n| n.fragment.tags.iter().map(String::as_str))
            .collect();
        GraphStats {
            fragment_count: self.nodes.len(),
            edge_count: self.edges.len(),
            distinct_tag_count: tags.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_between_normalizes_order() {
        let edge = GraphEdge::between("2", "10", 1);
        assert_eq!(edge.source, "10");
        assert_eq!(edge.target, "2");
        assert_eq!(edge.id, "10-2");
        assert_eq!(GraphEdge::between("10", "2", 1), edge);
    }

    #[test]
    fn test_edge_label_and_strength() {
        let edge = GraphEdge::between("a", "b", 1);
        assert_eq!(edge.label, "1 shared tags");
        assert_eq!(edge.strength, EdgeStrength::Weak);
        assert_eq!(edge.stroke_width(), 2);

        let edge = GraphEdge::between("a", "b", 2);
        assert_eq!(edge.label, "2 shared tags");
        assert_eq!(edge.strength, EdgeStrength::Moderate);

        let edge = GraphEdge::between("a", "b", 5);
        assert_eq!(edge.strength, EdgeStrength::Strong);
        assert_eq!(edge.stroke_width(), MAX_STROKE_WIDTH);
    }

    #[test]
    fn test_stats_counts_distinct_tags() {
        let fragments = vec![
            Fragment::new("a", "").with_tags(["x", "y"]),
            Fragment::new("b", "").with_tags(["y", "z", "z"]),
            Fragment::new("c", ""),
        ];
        let edges = vec![GraphEdge::between("0", "1", 1)];
        let stats = GraphStats::compute(&fragments, &edges);
        assert_eq!(stats.fragment_count, 3);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.distinct_tag_count, 3);
    }

    #[test]
    fn test_pair_key_is_symmetric() {
        assert_eq!(pair_key("b", "a"), pair_key("a", "b"));
        assert_eq!(pair_key("temp-3", "12"), "12-temp-3");
    }
}
