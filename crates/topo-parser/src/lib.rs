#![forbid(unsafe_code)]

pub mod dialect;
mod graph_builder;
mod loop_collapse;

use std::path::Path;

use serde::Serialize;
use serde_json::{Value, json};
use topo_core::{Graph, NodeWeights, TopoError};

use crate::graph_builder::GraphBuilder;

pub use loop_collapse::{
    CollapseResult, CollapseStats, collapse_internal_loops, collapse_internal_loops_with_stats,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub graph: Graph,
    pub weights: NodeWeights,
    pub warnings: Vec<String>,
}

/// Parses structure-graph text into a graph and its base-count table.
///
/// Every line is checked against both the edge rule and the labeled-node
/// rule. Lines matching neither are layout directives and are skipped
/// without a warning. Weights and edges are collected independently, so a
/// weighted node need not appear in the graph.
#[must_use]
pub fn parse(input: &str) -> ParseResult {
    let mut builder = GraphBuilder::new();

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;

        if let Some(edge) = dialect::match_edge_line(line) {
            builder.push_edge(edge.a, edge.b, line_number);
        }

        if let Some(node) = dialect::match_labeled_node_line(line) {
            builder.record_bases(node.node, node.digits, node.base_count(), line_number);
        }
    }

    builder.finish()
}

/// Reads and parses a graph file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ParseResult, TopoError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| TopoError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse(&source))
}

/// Counts, total bases and warnings of a parse, for `topo parse`.
#[must_use]
pub fn parse_summary_json(parsed: &ParseResult) -> Value {
    json!({
        "node_count": parsed.graph.node_count(),
        "edge_count": parsed.graph.edge_count(),
        "weighted_node_count": parsed.weights.len(),
        "total_bases": parsed.weights.iter().map(|(_, bases)| bases).fold(0_u64, u64::saturating_add),
        "warning_count": parsed.warnings.len(),
        "warnings": parsed.warnings.clone(),
    })
}
