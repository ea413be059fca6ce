use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use topo_core::{Graph, NodeWeights};
use topo_path::{longest_by_bases, longest_by_edges};

/// Stems joined by hairpins and internal loops, roughly the shape the
/// structure converter emits for long sequences.
fn structure_like_graph(stems: usize) -> (Graph, NodeWeights) {
    let mut graph = Graph::new();
    let mut weights = NodeWeights::new();
    for index in 0..stems {
        let stem = format!("s{index}");
        weights.insert(stem.clone(), 4 + (index as u64 % 5));
        if index > 0 {
            let joint = format!("i{index}");
            weights.insert(joint.clone(), 2);
            graph.add_edge(&format!("s{}", index - 1), &joint);
            graph.add_edge(&joint, &stem);
        }
        if index % 3 == 0 {
            let hairpin = format!("h{index}");
            weights.insert(hairpin.clone(), 7);
            graph.add_edge(&stem, &hairpin);
        }
    }
    (graph, weights)
}

fn bench_longest_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("longest_path");
    for stems in [16_usize, 64, 128] {
        let (graph, weights) = structure_like_graph(stems);
        group.bench_with_input(BenchmarkId::new("edges", stems), &graph, |b, graph| {
            b.iter(|| longest_by_edges(black_box(graph)));
        });
        group.bench_with_input(BenchmarkId::new("bases", stems), &graph, |b, graph| {
            b.iter(|| longest_by_bases(black_box(graph), black_box(&weights)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_longest_path);
criterion_main!(benches);
