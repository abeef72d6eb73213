//! Graph and stats commands.

use crate::config::FragmindConfig;
use crate::models::{FragmentGraph, GraphStats};
use crate::services::{GraphBuilder, LayoutConfig};
use anyhow::Result;
use std::io::Write;
use std::str::FromStr;

/// Output format for the graph command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GraphOutputFormat {
    /// Human-readable node and edge listing (default).
    #[default]
    Summary,
    /// The full graph as JSON.
    Json,
}

impl FromStr for GraphOutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" | "text" => Ok(Self::Summary),
            "json" => Ok(Self::Json),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown graph format '{other}' (expected summary or json)"
            ))),
        }
    }
}

/// Builds a graph builder from configuration, with an optional seed override.
#[must_use]
pub fn graph_builder(config: &FragmindConfig, seed: Option<u64>) -> GraphBuilder {
    let builder = GraphBuilder::new(LayoutConfig::from_config(&config.graph));
    match seed.or(config.graph.seed) {
        Some(seed) => builder.with_seed(seed),
        None => builder,
    }
}

/// Writes a graph in the requested format.
///
/// # Errors
///
/// Returns an error if writing or JSON encoding fails.
pub fn write_graph<W: Write>(
    writer: &mut W,
    graph: &FragmentGraph,
    format: GraphOutputFormat,
) -> Result<()> {
    match format {
        GraphOutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, graph)?;
            writeln!(writer)?;
        },
        GraphOutputFormat::Summary => {
            writeln!(writer, "Nodes ({}):", graph.nodes.len())?;
            for node in &graph.nodes {
                writeln!(
                    writer,
                    "  {:<10} {:<30} ({:.0}, {:.0})  [{}]",
                    node.id,
                    node.fragment.title,
                    node.position.x,
                    node.position.y,
                    node.fragment.tags.join(", ")
                )?;
            }
            writeln!(writer, "Edges ({}):", graph.edges.len())?;
            for edge in &graph.edges {
                writeln!(
                    writer,
                    "  {} -- {}  {} ({})",
                    edge.source,
                    edge.target,
                    edge.label,
                    edge.strength.as_str()
                )?;
            }
        },
    }
    Ok(())
}

/// Writes graph statistics.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_stats<W: Write>(writer: &mut W, stats: &GraphStats) -> Result<()> {
    writeln!(writer, "Fragments: {}", stats.fragment_count)?;
    writeln!(writer, "Connections: {}", stats.edge_count)?;
    writeln!(writer, "Tags: {}", stats.distinct_tag_count)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Fragment;
    use test_case::test_case;

    #[test_case("json" => GraphOutputFormat::Json)]
    #[test_case("JSON" => GraphOutputFormat::Json)]
    #[test_case("summary" => GraphOutputFormat::Summary)]
    #[test_case("text" => GraphOutputFormat::Summary)]
    fn test_format_parse(s: &str) -> GraphOutputFormat {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_parse_rejects_unknown() {
        assert!("yaml".parse::<GraphOutputFormat>().is_err());
    }

    fn graph() -> FragmentGraph {
        let fragments = vec![
            Fragment::new("Ownership", "").with_id(1).with_tags(["rust"]),
            Fragment::new("Borrowing", "").with_id(2).with_tags(["rust"]),
        ];
        GraphBuilder::new(LayoutConfig::without_jitter()).build(&fragments)
    }

    #[test]
    fn test_summary_lists_nodes_and_edges() {
        let mut out = Vec::new();
        write_graph(&mut out, &graph(), GraphOutputFormat::Summary).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Nodes (2):"));
        assert!(text.contains("Ownership"));
        assert!(text.contains("1 -- 2  1 shared tags (weak)"));
    }

    #[test]
    fn test_json_output_parses_back() {
        let mut out = Vec::new();
        write_graph(&mut out, &graph(), GraphOutputFormat::Json).unwrap();
        let decoded: FragmentGraph = serde_json::from_slice(&out).unwrap();
        assert_eq!(decoded.edges.len(), 1);
    }

    #[test]
    fn test_stats_output() {
        let mut out = Vec::new();
        write_stats(&mut out, &graph().stats()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Fragments: 2\nConnections: 1\nTags: 1\n"
        );
    }

    #[test]
    fn test_seed_override_wins() {
        let mut config = FragmindConfig::default();
        config.graph.seed = Some(1);
        let fragments = vec![Fragment::new("a", "").with_id(1)];
        let a = graph_builder(&config, Some(9)).build(&fragments);
        let b = graph_builder(&config, Some(9)).build(&fragments);
        assert_eq!(a, b);
    }
}
