#![no_main]

use libfuzzer_sys::fuzz_target;
use topo_core::PathMetric;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let parsed = topo_parser::parse(input);
    let _ = topo_parser::parse_summary_json(&parsed);

    let by_edges = topo_path::longest_path(&parsed.graph, &parsed.weights, PathMetric::Edges);
    if !by_edges.is_empty() {
        assert_eq!(by_edges.edge_count() as u64, by_edges.value);
    }
    let _ = topo_path::longest_path(&parsed.graph, &parsed.weights, PathMetric::Bases);
});
