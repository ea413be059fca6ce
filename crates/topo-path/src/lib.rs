#![forbid(unsafe_code)]

//! Longest-path search for RNA structure graphs.
//!
//! "Longest" here is the longest *shortest* path: every ordered pair of nodes
//! is joined by an unweighted shortest path and the pair whose path scores
//! highest wins. Pairs are visited in first-seen node order and only a
//! strictly better score replaces the current best, so the earliest pair
//! reaching the maximum is the one reported.
//!
//! Each pair runs its own bidirectional BFS. Which of several equally short
//! routes comes back depends on where the two searches meet, and the base
//! metric depends on the route, so the search is never shared across pairs.

use std::mem;

use rustc_hash::FxHashMap;
use topo_core::{Graph, LongestPath, NodeId, NodeWeights, PathMetric};
use tracing::{debug, trace};

#[must_use]
pub fn longest_by_edges(graph: &Graph) -> LongestPath {
    longest_path(graph, &NodeWeights::new(), PathMetric::Edges)
}

#[must_use]
pub fn longest_by_bases(graph: &Graph, weights: &NodeWeights) -> LongestPath {
    longest_path(graph, weights, PathMetric::Bases)
}

/// Searches all ordered pairs for the path with the highest `metric`.
///
/// Returns an empty path with value 0 when no pair scores above zero, which
/// covers graphs with fewer than two nodes, graphs without edges and, for
/// [`PathMetric::Bases`], graphs whose reachable nodes all weigh nothing.
#[must_use]
pub fn longest_path(graph: &Graph, weights: &NodeWeights, metric: PathMetric) -> LongestPath {
    let node_weights: Vec<u64> = graph
        .nodes()
        .map(|(_, name)| weights.weight_of(name))
        .collect();

    let mut best_value = 0_u64;
    let mut best_path: Vec<NodeId> = Vec::new();
    let mut connected_pairs = 0_usize;
    let mut disconnected_pairs = 0_usize;

    for (source, _) in graph.nodes() {
        for (target, _) in graph.nodes() {
            if target == source {
                continue;
            }
            let Some(path) = shortest_path(graph, source, target) else {
                disconnected_pairs += 1;
                continue;
            };
            connected_pairs += 1;

            let value = score(&path, metric, &node_weights);
            if value > best_value {
                trace!(
                    source = source.0,
                    target = target.0,
                    value,
                    "new longest path candidate"
                );
                best_value = value;
                best_path = path;
            }
        }
    }

    debug!(
        metric = metric.as_str(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        connected_pairs,
        disconnected_pairs,
        best_value,
        found = !best_path.is_empty(),
        "longest path search finished"
    );

    if best_path.is_empty() {
        return LongestPath::empty(metric);
    }

    LongestPath {
        metric,
        nodes: graph.names_of(&best_path),
        value: best_value,
    }
}

fn score(path: &[NodeId], metric: PathMetric, node_weights: &[u64]) -> u64 {
    match metric {
        PathMetric::Edges => path.len().saturating_sub(1) as u64,
        PathMetric::Bases => path
            .iter()
            .map(|node| node_weights[node.0])
            .fold(0, u64::saturating_add),
    }
}

/// Unweighted shortest path from `from` to `to`, inclusive of both ends.
///
/// Two BFS frontiers grow from `from` and `to`; each round expands whichever
/// frontier is smaller (the forward one on a tie), visiting neighbors in
/// insertion order, and the path runs through the first node both sides have
/// reached. `None` if `to` is unreachable.
#[must_use]
pub fn shortest_path(graph: &Graph, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
    let count = graph.node_count();
    if from.0 >= count || to.0 >= count {
        return None;
    }
    if from == to {
        return Some(vec![from]);
    }

    let mut forward = Frontier::new(from);
    let mut reverse = Frontier::new(to);

    while !forward.fringe.is_empty() && !reverse.fringe.is_empty() {
        let meeting = if forward.fringe.len() <= reverse.fringe.len() {
            forward.expand(graph, &reverse)
        } else {
            reverse.expand(graph, &forward)
        };
        if let Some(meeting) = meeting {
            let mut path = forward.walk_back(meeting);
            path.reverse();
            path.extend(reverse.walk_back(meeting).into_iter().skip(1));
            return Some(path);
        }
    }
    None
}

/// One side of a bidirectional search: the parent of every reached node and
/// the nodes reached in the last round.
struct Frontier {
    parent: FxHashMap<NodeId, Option<NodeId>>,
    fringe: Vec<NodeId>,
}

impl Frontier {
    fn new(root: NodeId) -> Self {
        let mut parent = FxHashMap::default();
        parent.insert(root, None);
        Self {
            parent,
            fringe: vec![root],
        }
    }

    /// Expands one BFS level and returns the first neighbor already reached
    /// by `other`.
    fn expand(&mut self, graph: &Graph, other: &Self) -> Option<NodeId> {
        for node in mem::take(&mut self.fringe) {
            for &next in graph.neighbors(node) {
                if !self.parent.contains_key(&next) {
                    self.parent.insert(next, Some(node));
                    self.fringe.push(next);
                }
                if other.parent.contains_key(&next) {
                    return Some(next);
                }
            }
        }
        None
    }

    /// Nodes from `node` back to this side's root.
    fn walk_back(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = vec![node];
        let mut cursor = node;
        while let Some(&Some(previous)) = self.parent.get(&cursor) {
            path.push(previous);
            cursor = previous;
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest::sample::Index;
    use topo_core::{Graph, NodeId, NodeWeights, PathMetric};

    use std::collections::VecDeque;

    use super::{longest_by_bases, longest_by_edges, longest_path, shortest_path};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("topo_path=trace")
            .with_test_writer()
            .try_init();
    }

    fn graph_from(edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for (a, b) in edges {
            graph.add_edge(a, b);
        }
        graph
    }

    fn names(path: &[String]) -> Vec<&str> {
        path.iter().map(String::as_str).collect()
    }

    #[test]
    fn path_graph_by_edges_and_bases() {
        init_tracing();
        let graph = graph_from(&[("n1", "n2"), ("n2", "n3")]);
        let weights: NodeWeights = [("n1", 3), ("n2", 5), ("n3", 2)].into_iter().collect();

        let by_edges = longest_by_edges(&graph);
        assert_eq!(names(&by_edges.nodes), ["n1", "n2", "n3"]);
        assert_eq!(by_edges.value, 2);
        assert_eq!(by_edges.metric, PathMetric::Edges);

        let by_bases = longest_by_bases(&graph, &weights);
        assert_eq!(names(&by_bases.nodes), ["n1", "n2", "n3"]);
        assert_eq!(by_bases.value, 10);
        assert_eq!(by_bases.metric, PathMetric::Bases);
    }

    #[test]
    fn disconnected_components_are_skipped() {
        init_tracing();
        let graph = graph_from(&[("n1", "n2"), ("n3", "n4"), ("n4", "n5")]);
        let result = longest_by_edges(&graph);
        assert_eq!(names(&result.nodes), ["n3", "n4", "n5"]);
        assert_eq!(result.value, 2);
    }

    #[test]
    fn earliest_pair_wins_ties() {
        let graph = graph_from(&[("c", "a"), ("c", "b"), ("c", "d")]);
        let result = longest_by_edges(&graph);
        assert_eq!(names(&result.nodes), ["a", "c", "b"]);
        assert_eq!(result.endpoints(), Some(("a", "b")));
    }

    #[test]
    fn heavier_short_path_beats_longer_light_path() {
        let graph = graph_from(&[("s1", "h1"), ("s1", "m1"), ("m1", "m2"), ("m2", "m3")]);
        let weights: NodeWeights = [("h1", 40), ("s1", 4), ("m3", 1)].into_iter().collect();
        let result = longest_by_bases(&graph, &weights);
        assert_eq!(names(&result.nodes), ["h1", "s1", "m1", "m2", "m3"]);
        assert_eq!(result.value, 45);

        let only_heavy: NodeWeights = [("h1", 40), ("s1", 4)].into_iter().collect();
        let result = longest_by_bases(&graph, &only_heavy);
        assert_eq!(names(&result.nodes), ["s1", "h1"]);
        assert_eq!(result.value, 44);
    }

    #[test]
    fn missing_weights_count_as_zero() {
        let graph = graph_from(&[("n1", "n2"), ("n2", "n3")]);
        let weights: NodeWeights = [("n3", 4), ("elsewhere", 100)].into_iter().collect();
        let result = longest_by_bases(&graph, &weights);
        assert_eq!(names(&result.nodes), ["n1", "n2", "n3"]);
        assert_eq!(result.value, 4);
    }

    #[test]
    fn weightless_graph_has_no_base_result() {
        let graph = graph_from(&[("n1", "n2")]);
        let result = longest_by_bases(&graph, &NodeWeights::new());
        assert!(result.is_empty());
        assert_eq!(result.value, 0);
    }

    #[test]
    fn tiny_graphs_yield_empty_result() {
        assert!(longest_by_edges(&Graph::new()).is_empty());

        let mut single = Graph::new();
        single.add_node("n1");
        let result = longest_by_edges(&single);
        assert!(result.is_empty());
        assert_eq!(result.endpoints(), None);

        let mut isolated = Graph::new();
        isolated.add_node("n1");
        isolated.add_node("n2");
        assert!(longest_path(&isolated, &NodeWeights::new(), PathMetric::Edges).is_empty());
    }

    #[test]
    fn cycle_uses_shortest_route_between_pair() {
        let graph = graph_from(&[("n1", "n2"), ("n2", "n3"), ("n3", "n4"), ("n4", "n1")]);
        let result = longest_by_edges(&graph);
        assert_eq!(result.value, 2);
        assert_eq!(names(&result.nodes), ["n1", "n2", "n3"]);
    }

    #[test]
    fn shortest_path_handles_edge_cases() {
        let mut graph = graph_from(&[("a", "b"), ("b", "c")]);
        graph.add_node("z");
        let a = graph.node_id("a").expect("a");
        let c = graph.node_id("c").expect("c");
        let z = graph.node_id("z").expect("z");

        assert_eq!(
            shortest_path(&graph, a, c).map(|path| graph.names_of(&path)),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(shortest_path(&graph, a, a), Some(vec![a]));
        assert_eq!(shortest_path(&graph, a, z), None);
        assert_eq!(shortest_path(&graph, a, NodeId(42)), None);
    }

    #[test]
    fn parsed_dialect_feeds_search() {
        let parsed = topo_parser::parse(
            "graph G {\n\t{node [label=\"s0\\n(4)\"] s0};\n\t{node [label=\"h1\\n(6)\"] h1};\n\tf1 -- s0;\n\ts0 -- h1;\n}\n",
        );
        let result = longest_by_bases(&parsed.graph, &parsed.weights);
        assert_eq!(names(&result.nodes), ["f1", "s0", "h1"]);
        assert_eq!(result.value, 10);
    }

    #[test]
    fn equal_routes_meet_from_the_target_side() {
        init_tracing();
        let graph = graph_from(&[("s1", "a2"), ("s1", "b3"), ("t4", "b3"), ("t4", "a2")]);
        let weights: NodeWeights = [("s1", 1), ("a2", 1), ("b3", 10), ("t4", 1)]
            .into_iter()
            .collect();

        let by_edges = longest_by_edges(&graph);
        assert_eq!(names(&by_edges.nodes), ["s1", "b3", "t4"]);
        assert_eq!(by_edges.endpoints(), Some(("s1", "t4")));
        assert_eq!(by_edges.value, 2);

        let by_bases = longest_by_bases(&graph, &weights);
        assert_eq!(names(&by_bases.nodes), ["s1", "b3", "t4"]);
        assert_eq!(by_bases.value, 12);
    }

    #[test]
    fn smaller_frontier_expands_first() {
        // n0 fans out to three nodes, so the reverse side takes the next two
        // rounds and the route runs through n9's first neighbor.
        let graph = graph_from(&[
            ("n0", "x1"),
            ("n0", "x2"),
            ("n0", "x3"),
            ("x1", "m1"),
            ("x2", "m2"),
            ("m2", "n9"),
            ("m1", "n9"),
        ]);
        let from = graph.node_id("n0").expect("n0");
        let to = graph.node_id("n9").expect("n9");
        let path = shortest_path(&graph, from, to).expect("connected");
        assert_eq!(graph.names_of(&path), ["n0", "x2", "m2", "n9"]);
    }

    fn tree_strategy() -> impl Strategy<Value = Vec<usize>> {
        (2_usize..32).prop_flat_map(|count| {
            proptest::collection::vec(any::<Index>(), count - 1).prop_map(|picks| {
                picks
                    .iter()
                    .enumerate()
                    .map(|(offset, pick)| pick.index(offset + 1))
                    .collect()
            })
        })
    }

    fn tree_graph(parents: &[usize]) -> Graph {
        let mut graph = Graph::new();
        graph.add_node("n0");
        for (offset, parent) in parents.iter().enumerate() {
            graph.add_edge(&format!("n{parent}"), &format!("n{}", offset + 1));
        }
        graph
    }

    fn bfs_distances(graph: &Graph, source: NodeId) -> Vec<Option<u64>> {
        let mut distance = vec![None; graph.node_count()];
        distance[source.0] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            let next_distance = distance[node.0].map(|d| d + 1);
            for &next in graph.neighbors(node) {
                if distance[next.0].is_none() {
                    distance[next.0] = next_distance;
                    queue.push_back(next);
                }
            }
        }
        distance
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_tree_result_is_diameter(parents in tree_strategy()) {
            let graph = tree_graph(&parents);
            let result = longest_by_edges(&graph);

            let diameter = graph
                .nodes()
                .flat_map(|(source, _)| bfs_distances(&graph, source))
                .flatten()
                .max()
                .unwrap_or(0);

            prop_assert_eq!(result.value, diameter);
            prop_assert_eq!(result.edge_count() as u64, diameter);

            let mut distinct = result.nodes.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(distinct.len(), result.nodes.len());

            for window in result.nodes.windows(2) {
                prop_assert!(graph.has_edge(&window[0], &window[1]));
            }
        }

        #[test]
        fn prop_shortest_paths_are_valid_and_minimal(parents in tree_strategy(), extra in any::<Index>()) {
            let mut graph = tree_graph(&parents);
            // one extra chord makes the graph cyclic
            let last = parents.len();
            graph.add_edge("n0", &format!("n{}", extra.index(last + 1)));

            for (source, _) in graph.nodes() {
                let distances = bfs_distances(&graph, source);
                for (target, _) in graph.nodes() {
                    let Some(path) = shortest_path(&graph, source, target) else {
                        prop_assert_eq!(distances[target.0], None);
                        continue;
                    };
                    prop_assert_eq!(path.first(), Some(&source));
                    prop_assert_eq!(path.last(), Some(&target));
                    prop_assert_eq!(Some(path.len() as u64 - 1), distances[target.0]);
                    let names = graph.names_of(&path);
                    for window in names.windows(2) {
                        prop_assert!(graph.has_edge(&window[0], &window[1]));
                    }
                }
            }
        }
    }
}
