//! Internal-loop collapsing for structure-graph text.
//!
//! Internal-loop nodes are removed and each one's outer neighbors are joined
//! pairwise. A loop with `k` outer neighbors becomes a `k`-clique, which is an
//! approximation for loops with more than two neighbors.

use std::cmp::Ordering;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::dialect::{
    closes_graph_block, first_digit_run, format_edge_line, is_loop_declaration, is_loop_token,
    match_edge_line, opens_graph_block,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollapseStats {
    /// Internal-loop declaration lines dropped.
    pub removed_declarations: usize,
    /// Edges inside the graph block with no internal-loop endpoint.
    pub direct_edges: usize,
    /// Distinct internal-loop nodes that had edges.
    pub intermediates: usize,
    /// Neighbor pairs produced by clique expansion.
    pub generated_edges: usize,
    /// Edges dropped because the same pair was already present.
    pub duplicate_edges: usize,
    pub output_edges: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseResult {
    pub text: String,
    pub stats: CollapseStats,
}

#[must_use]
pub fn collapse_internal_loops(input: &str) -> String {
    collapse_internal_loops_with_stats(input).text
}

/// Rewrites `input` with internal loops replaced by direct neighbor edges.
///
/// Output is the surviving non-edge lines in their original order, followed by
/// the deduplicated edges sorted on the numbers embedded in their endpoint ids,
/// followed by the closing brace.
#[must_use]
pub fn collapse_internal_loops_with_stats(input: &str) -> CollapseResult {
    let mut stats = CollapseStats::default();
    let mut kept: Vec<&str> = Vec::new();
    let mut direct: Vec<(&str, &str)> = Vec::new();
    let mut loops = LoopNeighbors::default();
    let mut inside_graph = false;

    for line in input.lines() {
        if is_loop_declaration(line) {
            stats.removed_declarations += 1;
            continue;
        }

        if opens_graph_block(line) {
            inside_graph = true;
            kept.push(line);
            continue;
        }

        if !inside_graph {
            kept.push(line);
            continue;
        }

        if closes_graph_block(line) {
            inside_graph = false;
            continue;
        }

        let Some(edge) = match_edge_line(line) else {
            kept.push(line);
            continue;
        };

        if is_loop_token(edge.a) {
            loops.record(edge.a, edge.b);
        } else if is_loop_token(edge.b) {
            loops.record(edge.b, edge.a);
        } else {
            direct.push((edge.a, edge.b));
        }
    }

    stats.direct_edges = direct.len();
    stats.intermediates = loops.len();

    let generated = loops.clique_edges();
    stats.generated_edges = generated.len();

    let mut edges = dedup_undirected(direct.into_iter().chain(generated));
    stats.duplicate_edges = stats.direct_edges + stats.generated_edges - edges.len();
    stats.output_edges = edges.len();

    edges.sort_by(|left, right| edge_sort_key(*left).cmp(&edge_sort_key(*right)));

    let mut text = String::with_capacity(input.len());
    for line in kept {
        text.push_str(line);
        text.push('\n');
    }
    for (a, b) in edges {
        text.push_str(&format_edge_line(a, b));
        text.push('\n');
    }
    text.push_str("}\n");

    CollapseResult { text, stats }
}

/// Outer neighbors per internal-loop node, both in first-seen order.
#[derive(Default)]
struct LoopNeighbors<'a> {
    order: Vec<(&'a str, Vec<&'a str>)>,
    index: FxHashMap<&'a str, usize>,
}

impl<'a> LoopNeighbors<'a> {
    fn record(&mut self, intermediate: &'a str, neighbor: &'a str) {
        let slot = match self.index.get(intermediate) {
            Some(slot) => *slot,
            None => {
                self.order.push((intermediate, Vec::new()));
                self.index.insert(intermediate, self.order.len() - 1);
                self.order.len() - 1
            }
        };
        self.order[slot].1.push(neighbor);
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn clique_edges(&self) -> Vec<(&'a str, &'a str)> {
        let mut edges = Vec::new();
        for (_, neighbors) in &self.order {
            for (i, first) in neighbors.iter().enumerate() {
                for second in &neighbors[i + 1..] {
                    // a neighbor listed twice would pair with itself
                    if first != second {
                        edges.push((*first, *second));
                    }
                }
            }
        }
        edges
    }
}

fn dedup_undirected<'a>(
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Vec<(&'a str, &'a str)> {
    let mut seen: FxHashSet<(&str, &str)> = FxHashSet::default();
    let mut unique = Vec::new();
    for (a, b) in edges {
        let key = if a <= b { (a, b) } else { (b, a) };
        if seen.insert(key) {
            unique.push((a, b));
        }
    }
    unique
}

fn edge_sort_key<'a>((a, b): (&'a str, &'a str)) -> (DigitKey<'a>, DigitKey<'a>) {
    (DigitKey::of(a), DigitKey::of(b))
}

/// Numeric part of a node id. Ids without digits sort after every number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DigitKey<'a> {
    Number(DecimalRun<'a>),
    Missing,
}

impl<'a> DigitKey<'a> {
    fn of(token: &'a str) -> Self {
        first_digit_run(token).map_or(Self::Missing, |digits| {
            Self::Number(DecimalRun(digits.trim_start_matches('0')))
        })
    }
}

/// ASCII digit string without leading zeros, ordered by numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DecimalRun<'a>(&'a str);

impl Ord for DecimalRun<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(other.0))
    }
}

impl PartialOrd for DecimalRun<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
