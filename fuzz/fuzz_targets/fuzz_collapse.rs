#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let collapsed = topo_parser::collapse_internal_loops(input);
    assert!(collapsed.ends_with("}\n"));

    let reparsed = topo_parser::parse(&collapsed);
    assert!(reparsed.graph.edges().iter().all(|edge| edge.a != edge.b));
});
