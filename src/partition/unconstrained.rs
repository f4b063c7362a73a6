// SPDX-License-Identifier: Apache-2.0

use crate::crossbar::Crossbar;
use crate::literal::Literal;
use crate::partition::{BipartiteGraph, IncidenceArc, PartitioningStrategy};
use crate::topology::Topology;
use crate::xbar_error::XbarError;

/// Places the whole incidence graph on one selector crossbar: node vertices
/// are wordlines (rows), edge vertices are selectorlines (columns).
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconstrained;

impl PartitioningStrategy for Unconstrained {
    fn name(&self) -> &'static str {
        "unconstrained"
    }

    fn partition(&self, graph: &BipartiteGraph) -> Result<Topology, XbarError> {
        let mut crossbar =
            Crossbar::new_selector(graph.nodes.len(), graph.edges.len()).with_name(&graph.name);

        for (row, node) in graph.nodes.iter().enumerate() {
            if node.root {
                for output in &node.output_variables {
                    crossbar.set_output_rail(output, 0, row)?;
                }
            }
            if node.terminal {
                crossbar.set_input_rail(&node.variable, 0, row)?;
            }
        }
        for arc in &graph.arcs {
            let (row, column) = match *arc {
                IncidenceArc::NodeToEdge { node, edge }
                | IncidenceArc::EdgeToNode { edge, node } => (node, edge),
            };
            crossbar.set(row, column, Literal::on())?;
        }
        for (column, vertex) in graph.edges.iter().enumerate() {
            crossbar.set_selectorline(column, vertex.literal.clone())?;
        }
        log::debug!(
            "unconstrained partition '{}': |U| = {}, |V| = {}, |E| = {}",
            graph.name,
            graph.nodes.len(),
            graph.edges.len(),
            graph.arcs.len()
        );

        let mut topology = Topology::new(&graph.name);
        topology.add_crossbar(crossbar);
        Ok(topology)
    }
}
