#![forbid(unsafe_code)]

//! Core data model for RNA secondary-structure graphs.
//!
//! A [`Graph`] is undirected and simple. Nodes are addressed by a dense
//! [`NodeId`] assigned in first-seen order, which is the iteration order every
//! consumer relies on for reproducible results.

use std::collections::BTreeMap;
use std::io;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopoError {
    #[error("failed to read graph file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Undirected edge. Endpoints keep the orientation of the first insertion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
}

impl Edge {
    #[must_use]
    pub fn key(self) -> (NodeId, NodeId) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }
}

/// Outcome of [`Graph::add_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Added,
    Duplicate,
    SelfLoop,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GraphRecord", into = "GraphRecord")]
pub struct Graph {
    nodes: Vec<String>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<NodeId>>,
    index: FxHashMap<String, NodeId>,
    edge_keys: FxHashSet<(NodeId, NodeId)>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `name`, creating the node if it has not been seen.
    pub fn add_node(&mut self, name: &str) -> NodeId {
        if let Some(existing) = self.index.get(name).copied() {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(name.to_string());
        self.adjacency.push(Vec::new());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Adds the undirected edge `{a, b}`, creating either endpoint if needed.
    ///
    /// Self-loops register their node but never become edges, and a repeated
    /// pair in either orientation is ignored.
    pub fn add_edge(&mut self, a: &str, b: &str) -> EdgeInsert {
        let a = self.add_node(a);
        let b = self.add_node(b);
        if a == b {
            return EdgeInsert::SelfLoop;
        }
        let edge = Edge { a, b };
        if !self.edge_keys.insert(edge.key()) {
            return EdgeInsert::Duplicate;
        }
        self.edges.push(edge);
        self.adjacency[a.0].push(b);
        self.adjacency[b.0].push(a);
        EdgeInsert::Added
    }

    #[must_use]
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(String::as_str)
    }

    /// Neighbors of `node` in edge insertion order.
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(node.0).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        match (self.node_id(a), self.node_id(b)) {
            (Some(a), Some(b)) => self.edge_keys.contains(&Edge { a, b }.key()),
            _ => false,
        }
    }

    /// Nodes in first-seen order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = (NodeId, &str)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, name)| (NodeId(index), name.as_str()))
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolves a sequence of ids to node names.
    #[must_use]
    pub fn names_of(&self, path: &[NodeId]) -> Vec<String> {
        path.iter()
            .filter_map(|node| self.name(*node))
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphRecord {
    nodes: Vec<String>,
    edges: Vec<(String, String)>,
}

impl From<GraphRecord> for Graph {
    fn from(record: GraphRecord) -> Self {
        let mut graph = Self::new();
        for name in &record.nodes {
            graph.add_node(name);
        }
        for (a, b) in &record.edges {
            graph.add_edge(a, b);
        }
        graph
    }
}

impl From<Graph> for GraphRecord {
    fn from(graph: Graph) -> Self {
        let edges = graph
            .edges
            .iter()
            .map(|edge| (graph.nodes[edge.a.0].clone(), graph.nodes[edge.b.0].clone()))
            .collect();
        Self {
            nodes: graph.nodes,
            edges,
        }
    }
}

/// Base counts keyed by node id. Absent nodes weigh zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeWeights(BTreeMap<String, u64>);

impl NodeWeights {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a base count, replacing any earlier value for the same node.
    pub fn insert(&mut self, node: impl Into<String>, bases: u64) -> Option<u64> {
        self.0.insert(node.into(), bases)
    }

    #[must_use]
    pub fn get(&self, node: &str) -> Option<u64> {
        self.0.get(node).copied()
    }

    #[must_use]
    pub fn weight_of(&self, node: &str) -> u64 {
        self.get(node).unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.0.iter().map(|(node, bases)| (node.as_str(), *bases))
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for NodeWeights {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut weights = Self::new();
        for (node, bases) in iter {
            weights.insert(node, bases);
        }
        weights
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PathMetric {
    #[default]
    Edges,
    Bases,
}

impl PathMetric {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edges => "edges",
            Self::Bases => "bases",
        }
    }

    /// Caption used when reporting a path's metric value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Edges => "Total Node Count",
            Self::Bases => "Total Base Count",
        }
    }
}

/// Winner of a longest-path search. An empty `nodes` list means no pair of
/// nodes produced a path with a positive metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestPath {
    pub metric: PathMetric,
    pub nodes: Vec<String>,
    pub value: u64,
}

impl LongestPath {
    #[must_use]
    pub fn empty(metric: PathMetric) -> Self {
        Self {
            metric,
            nodes: Vec::new(),
            value: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        let first = self.nodes.first()?;
        let last = self.nodes.last()?;
        Some((first.as_str(), last.as_str()))
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}
