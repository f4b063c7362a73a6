// SPDX-License-Identifier: Apache-2.0

//! Bipartite partitioning: diagram nodes on one side, diagram edges on the
//! other, turned into a topology of selector crossbars by a pluggable
//! strategy.

pub mod unconstrained;

use crate::diagram::{DecisionDiagram, DiagramNode};
use crate::literal::Literal;
use crate::topology::Topology;
use crate::xbar_error::XbarError;

/// A vertex on the edge side: one per diagram edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeVertex {
    pub literal: Literal,
}

/// A directed arc of the incidence graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidenceArc {
    /// Node `u` to the edge vertex of one of its in-edges.
    NodeToEdge { node: usize, edge: usize },
    /// Edge vertex to the parent node of that edge.
    EdgeToNode { edge: usize, node: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BipartiteGraph {
    pub name: String,
    /// Side U: diagram nodes, in node order.
    pub nodes: Vec<DiagramNode>,
    /// Side V: diagram edges, grouped by target node.
    pub edges: Vec<EdgeVertex>,
    pub arcs: Vec<IncidenceArc>,
}

impl BipartiteGraph {
    /// For every node `u` and every in-edge `(v, u)`, adds the arcs `u -> e`
    /// and `e -> v`. An empty diagram becomes a placeholder that never
    /// conducts: terminal "1", root "2" producing the diagram's name, and one
    /// "never conducting" edge vertex.
    pub fn from_diagram(diagram: &DecisionDiagram) -> Self {
        if diagram.is_empty() {
            let mut root = DiagramNode::root("2", &[]);
            root.output_variables.insert(diagram.name.clone());
            return Self {
                name: diagram.name.clone(),
                nodes: vec![DiagramNode::terminal("1"), root],
                edges: vec![EdgeVertex {
                    literal: Literal::off(),
                }],
                arcs: vec![
                    IncidenceArc::NodeToEdge { node: 0, edge: 0 },
                    IncidenceArc::EdgeToNode { edge: 0, node: 1 },
                ],
            };
        }

        let mut edges = Vec::with_capacity(diagram.edge_count());
        let mut arcs = Vec::with_capacity(2 * diagram.edge_count());
        for u in diagram.node_refs() {
            for in_edge in diagram.in_edges(u) {
                let e = edges.len();
                edges.push(EdgeVertex {
                    literal: in_edge.literal.clone(),
                });
                arcs.push(IncidenceArc::NodeToEdge { node: u.id, edge: e });
                arcs.push(IncidenceArc::EdgeToNode {
                    edge: e,
                    node: in_edge.source.id,
                });
            }
        }
        Self {
            name: diagram.name.clone(),
            nodes: diagram.nodes().to_vec(),
            edges,
            arcs,
        }
    }
}

pub trait PartitioningStrategy {
    fn name(&self) -> &'static str;

    fn partition(&self, graph: &BipartiteGraph) -> Result<Topology, XbarError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::bdd_and2;

    #[test]
    fn test_incidence_graph_shape() {
        let dd = bdd_and2("f", "a", "b");
        let graph = BipartiteGraph::from_diagram(&dd);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.arcs.len(), 4);
        // The first edge vertex is the in-edge of node 1 (root -> b).
        assert_eq!(graph.edges[0].literal, Literal::new("a", true));
        assert_eq!(graph.arcs[0], IncidenceArc::NodeToEdge { node: 1, edge: 0 });
        assert_eq!(graph.arcs[1], IncidenceArc::EdgeToNode { edge: 0, node: 0 });
    }

    #[test]
    fn test_empty_diagram_placeholder() {
        let dd = DecisionDiagram::new("g");
        let graph = BipartiteGraph::from_diagram(&dd);
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.nodes[0].terminal);
        assert!(graph.nodes[1].output_variables.contains("g"));
        assert_eq!(graph.edges[0].literal, Literal::off());
    }
}
