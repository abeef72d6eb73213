//! Graph builder: fragments in, nodes and tag-similarity edges out.
//!
//! # Algorithm
//!
//! 1. Resolve each fragment's identity and place it on a five-column grid
//!    with a small random jitter.
//! 2. Bucket fragments by tag (each fragment joins a bucket at most once).
//! 3. For every bucket with two or more members, enumerate its unordered
//!    pairs. A pair seen in an earlier bucket is skipped, so each pair
//!    yields one edge whose weight is the full shared-tag count.
//!
//! Topology depends only on the input list. The jitter only moves node
//! coordinates, and [`GraphBuilder::with_seed`] makes it reproducible.
//!
//! # Example
//!
//! ```rust
//! use fragmind::models::Fragment;
//! use fragmind::services::{GraphBuilder, LayoutConfig};
//!
//! let fragments = vec![
//!     Fragment::new("a", "").with_id(1).with_tags(["x", "y"]),
//!     Fragment::new("b", "").with_id(2).with_tags(["y", "x"]),
//! ];
//! let graph = GraphBuilder::new(LayoutConfig::without_jitter()).build(&fragments);
//! assert_eq!(graph.edges[0].weight, 2);
//! assert_eq!(graph.nodes[1].position.x, 300.0);
//! ```

use super::identity::resolve_identity;
use crate::config::GraphConfig;
use crate::models::{Fragment, FragmentGraph, GraphEdge, GraphNode, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// Grid layout parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Nodes per row.
    pub columns: usize,
    /// Horizontal distance between columns.
    pub column_pitch: f64,
    /// Vertical distance between rows.
    pub row_pitch: f64,
    /// Upper bound of the random offset added to each coordinate.
    pub jitter: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            columns: 5,
            column_pitch: 300.0,
            row_pitch: 200.0,
            jitter: 100.0,
        }
    }
}

impl LayoutConfig {
    /// Default grid with no jitter, giving exact grid coordinates.
    #[must_use]
    pub fn without_jitter() -> Self {
        Self {
            jitter: 0.0,
            ..Self::default()
        }
    }

    /// Builds a layout from the `[graph]` config section.
    #[must_use]
    pub fn from_config(config: &GraphConfig) -> Self {
        Self {
            columns: config.columns.max(1),
            column_pitch: config.column_pitch,
            row_pitch: config.row_pitch,
            jitter: config.jitter.max(0.0),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn grid_position(&self, index: usize) -> Point {
        let columns = self.columns.max(1);
        let column = index % columns;
        let row = index / columns;
        Point::new(
            column as f64 * self.column_pitch,
            row as f64 * self.row_pitch,
        )
    }
}

/// Builds a [`FragmentGraph`] from a fragment list.
///
/// The builder is stateless apart from its layout settings; every call is a
/// pure function of its input snapshot (plus jitter).
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    layout: LayoutConfig,
    seed: Option<u64>,
}

impl GraphBuilder {
    /// Creates a builder with the given layout.
    #[must_use]
    pub const fn new(layout: LayoutConfig) -> Self {
        Self { layout, seed: None }
    }

    /// Fixes the jitter seed so node positions are reproducible.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the layout settings.
    #[must_use]
    pub const fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Builds the graph with every node collapsed.
    #[must_use]
    pub fn build(&self, fragments: &[Fragment]) -> FragmentGraph {
        self.build_with_expanded(fragments, &HashSet::new())
    }

    /// Builds the graph, marking nodes whose identity is in `expanded`.
    #[must_use]
    #[instrument(skip(self, fragments, expanded), fields(operation = "graph.build", fragment_count = fragments.len()))]
    pub fn build_with_expanded(
        &self,
        fragments: &[Fragment],
        expanded: &HashSet<String>,
    ) -> FragmentGraph {
        let ids: Vec<String> = fragments
            .iter()
            .enumerate()
            .map(|(index, fragment)| resolve_identity(fragment, index))
            .collect();

        let nodes = self.layout_nodes(fragments, &ids, expanded);
        let edges = build_edges(fragments, &ids);

        metrics::counter!("fragmind_graph_builds_total").increment(1);
        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            "Built fragment graph"
        );

        FragmentGraph { nodes, edges }
    }

    fn layout_nodes(
        &self,
        fragments: &[Fragment],
        ids: &[String],
        expanded: &HashSet<String>,
    ) -> Vec<GraphNode> {
        let mut rng = self
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        fragments
            .iter()
            .zip(ids)
            .enumerate()
            .map(|(index, (fragment, id))| {
                let grid = self.layout.grid_position(index);
                let position = Point::new(
                    grid.x + jitter(&mut rng, self.layout.jitter),
                    grid.y + jitter(&mut rng, self.layout.jitter),
                );
                GraphNode {
                    id: id.clone(),
                    fragment: fragment.clone(),
                    position,
                    expanded: expanded.contains(id),
                }
            })
            .collect()
    }
}

fn jitter(rng: &mut StdRng, bound: f64) -> f64 {
    if bound > 0.0 {
        rng.r#gen::<f64>() * bound
    } else {
        0.0
    }
}

/// Computes one edge per unordered pair of fragments sharing a tag.
fn build_edges(fragments: &[Fragment], ids: &[String]) -> Vec<GraphEdge> {
    // Buckets keep first-seen tag order so edge order is stable.
    let mut bucket_index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    for (index, fragment) in fragments.iter().enumerate() {
        for tag in fragment.unique_tags() {
            let slot = *bucket_index.entry(tag).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[slot].push(index);
        }
    }

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut edges = Vec::new();
    for members in buckets.iter().filter(|members| members.len() >= 2) {
        for (offset, &a) in members.iter().enumerate() {
            for &b in &members[offset + 1..] {
                let (id_a, id_b) = (ids[a].as_str(), ids[b].as_str());
                if id_a == id_b {
                    continue;
                }
                let key = if id_a <= id_b {
                    (id_a, id_b)
                } else {
                    (id_b, id_a)
                };
                if !seen.insert(key) {
                    continue;
                }
                let weight = fragments[a].shared_tag_count(&fragments[b]);
                edges.push(GraphEdge::between(id_a, id_b, weight));
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(id: u64, tags: &[&str]) -> Fragment {
        Fragment::new(format!("f{id}"), "").with_id(id).with_tags(tags.iter().copied())
    }

    fn builder() -> GraphBuilder {
        GraphBuilder::new(LayoutConfig::without_jitter())
    }

    #[test]
    fn test_triangle_of_single_shared_tags() {
        let fragments = vec![
            fragment(1, &["a", "b"]),
            fragment(2, &["b", "c"]),
            fragment(3, &["c", "a"]),
        ];
        let graph = builder().build(&fragments);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 3);
        for (a, b) in [("1", "2"), ("2", "3"), ("1", "3")] {
            let edge = graph.edge_between(a, b).unwrap();
            assert_eq!(edge.weight, 1);
        }
        assert_eq!(graph.stats().distinct_tag_count, 3);
    }

    #[test]
    fn test_weight_counts_all_shared_tags_once() {
        let fragments = vec![
            fragment(1, &["x", "y"]),
            fragment(2, &["x", "y"]),
            fragment(3, &["x"]),
        ];
        let graph = builder().build(&fragments);
        assert_eq!(graph.edge_between("1", "2").unwrap().weight, 2);
        assert_eq!(graph.edge_between("1", "3").unwrap().weight, 1);
        assert_eq!(graph.edges.len(), 3);
    }

    #[test]
    fn test_disjoint_tags_produce_no_edge() {
        let fragments = vec![
            fragment(1, &["x", "y"]),
            fragment(2, &["x", "y"]),
            fragment(3, &["z"]),
        ];
        let graph = builder().build(&fragments);
        assert!(graph.edge_between("2", "3").is_none());
        assert!(graph.neighbors("3").is_empty());
        assert_eq!(graph.neighbors("2"), vec!["1"]);
    }

    #[test]
    fn test_duplicate_tags_do_not_create_self_edges() {
        let fragments = vec![fragment(1, &["x", "x"]), fragment(2, &["x"])];
        let graph = builder().build(&fragments);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].weight, 1);
    }

    #[test]
    fn test_untagged_fragment_yields_isolated_node() {
        let graph = builder().build(&[fragment(1, &[])]);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_unsaved_fragments_use_positional_ids() {
        let fragments = vec![
            Fragment::new("a", "").with_tags(["t"]),
            Fragment::new("b", "").with_tags(["t"]),
        ];
        let graph = builder().build(&fragments);
        assert_eq!(graph.nodes[0].id, "temp-0");
        assert_eq!(graph.nodes[1].id, "temp-1");
        assert_eq!(graph.edges[0].id, "temp-0-temp-1");
    }

    #[test]
    fn test_grid_positions_wrap_after_five_columns() {
        let fragments: Vec<Fragment> = (0..7).map(|i| fragment(i, &[])).collect();
        let graph = builder().build(&fragments);
        assert_eq!(graph.nodes[4].position, Point::new(1200.0, 0.0));
        assert_eq!(graph.nodes[5].position, Point::new(0.0, 200.0));
        assert_eq!(graph.nodes[6].position, Point::new(300.0, 200.0));
    }

    #[test]
    fn test_jitter_stays_within_bounds_and_seed_is_reproducible() {
        let fragments: Vec<Fragment> = (0..12).map(|i| fragment(i, &["t"])).collect();
        let a = GraphBuilder::default().with_seed(11).build(&fragments);
        let b = GraphBuilder::default().with_seed(11).build(&fragments);
        assert_eq!(a, b);

        let layout = LayoutConfig::default();
        for (index, node) in a.nodes.iter().enumerate() {
            let grid = layout.grid_position(index);
            assert!(node.position.x >= grid.x && node.position.x < grid.x + layout.jitter);
            assert!(node.position.y >= grid.y && node.position.y < grid.y + layout.jitter);
        }
    }

    #[test]
    fn test_expanded_flag() {
        let fragments = vec![fragment(1, &[]), fragment(2, &[])];
        let expanded: HashSet<String> = std::iter::once("2".to_string()).collect();
        let graph = builder().build_with_expanded(&fragments, &expanded);
        assert!(!graph.nodes[0].expanded);
        assert!(graph.nodes[1].expanded);
    }
}
