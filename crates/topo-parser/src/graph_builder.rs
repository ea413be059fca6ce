use topo_core::{EdgeInsert, Graph, NodeWeights};

use crate::ParseResult;

pub(crate) struct GraphBuilder {
    graph: Graph,
    weights: NodeWeights,
    warnings: Vec<String>,
}

impl GraphBuilder {
    pub(crate) fn new() -> Self {
        Self {
            graph: Graph::new(),
            weights: NodeWeights::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub(crate) fn finish(self) -> ParseResult {
        ParseResult {
            graph: self.graph,
            weights: self.weights,
            warnings: self.warnings,
        }
    }

    pub(crate) fn push_edge(&mut self, a: &str, b: &str, line_number: usize) {
        let a = a.trim();
        let b = b.trim();
        if self.graph.add_edge(a, b) == EdgeInsert::SelfLoop {
            self.add_warning(format!(
                "Line {line_number}: self-loop on {a} ignored; node kept without edge"
            ));
        }
    }

    pub(crate) fn record_bases(
        &mut self,
        node: &str,
        digits: &str,
        bases: Option<u64>,
        line_number: usize,
    ) {
        let node = node.trim();
        match bases {
            Some(bases) => {
                self.weights.insert(node, bases);
            }
            None => self.add_warning(format!(
                "Line {line_number}: base count {digits} for {node} does not fit in 64 bits; skipped"
            )),
        }
    }
}
