// SPDX-License-Identifier: Apache-2.0

//! Decision diagrams: an owned arena of nodes addressed by `NodeRef` handles
//! plus directed edges from parent (closer to the root) to child (closer to a
//! terminal), each carrying a literal.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::literal::Literal;
use crate::xbar_error::XbarError;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef {
    pub id: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub variable: String,
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub root: bool,
    /// Non-empty only on root nodes.
    #[serde(default)]
    pub output_variables: BTreeSet<String>,
}

impl DiagramNode {
    pub fn internal(variable: &str) -> Self {
        Self {
            variable: variable.to_string(),
            terminal: false,
            root: false,
            output_variables: BTreeSet::new(),
        }
    }

    pub fn terminal(variable: &str) -> Self {
        Self {
            terminal: true,
            ..Self::internal(variable)
        }
    }

    pub fn root(variable: &str, outputs: &[&str]) -> Self {
        Self {
            root: true,
            output_variables: outputs.iter().map(|s| s.to_string()).collect(),
            ..Self::internal(variable)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub source: NodeRef,
    pub target: NodeRef,
    pub literal: Literal,
}

/// Serialized shape of a diagram; converting it into a `DecisionDiagram`
/// re-runs the structural checks of `add_edge`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDiagram {
    pub name: String,
    pub nodes: Vec<DiagramNode>,
    #[serde(default)]
    pub edges: Vec<DiagramEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDiagram", into = "RawDiagram")]
pub struct DecisionDiagram {
    pub name: String,
    nodes: Vec<DiagramNode>,
    edges: Vec<DiagramEdge>,
    /// Indices into `edges`, per source node, in insertion order.
    out_edges: Vec<Vec<usize>>,
    /// Indices into `edges`, per target node, in insertion order.
    in_edges: Vec<Vec<usize>>,
}

impl TryFrom<RawDiagram> for DecisionDiagram {
    type Error = XbarError;

    fn try_from(raw: RawDiagram) -> Result<Self, Self::Error> {
        let mut diagram = DecisionDiagram::new(&raw.name);
        for node in raw.nodes {
            diagram.add_node(node);
        }
        for edge in raw.edges {
            diagram.add_edge(edge.source, edge.target, edge.literal)?;
        }
        Ok(diagram)
    }
}

impl From<DecisionDiagram> for RawDiagram {
    fn from(diagram: DecisionDiagram) -> Self {
        RawDiagram {
            name: diagram.name,
            nodes: diagram.nodes,
            edges: diagram.edges,
        }
    }
}

impl DecisionDiagram {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: DiagramNode) -> NodeRef {
        let node_ref = NodeRef {
            id: self.nodes.len(),
        };
        self.nodes.push(node);
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        node_ref
    }

    /// Adds the edge `source -> target`. A second edge between the same
    /// ordered pair is rejected.
    pub fn add_edge(
        &mut self,
        source: NodeRef,
        target: NodeRef,
        literal: Literal,
    ) -> Result<(), XbarError> {
        for node in [source, target] {
            if node.id >= self.nodes.len() {
                return Err(XbarError::IndexOutOfRange {
                    what: "diagram node",
                    index: node.id,
                    bound: self.nodes.len(),
                });
            }
        }
        if self.out_edges[source.id]
            .iter()
            .any(|&e| self.edges[e].target == target)
        {
            return Err(XbarError::ParallelEdge {
                source: source.id,
                target: target.id,
            });
        }
        let index = self.edges.len();
        self.edges.push(DiagramEdge {
            source,
            target,
            literal,
        });
        self.out_edges[source.id].push(index);
        self.in_edges[target.id].push(index);
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, node: NodeRef) -> &DiagramNode {
        &self.nodes[node.id]
    }

    pub fn nodes(&self) -> &[DiagramNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DiagramEdge] {
        &self.edges
    }

    pub fn node_refs(&self) -> impl Iterator<Item = NodeRef> + '_ {
        (0..self.nodes.len()).map(|id| NodeRef { id })
    }

    pub fn out_edges(&self, node: NodeRef) -> impl Iterator<Item = &DiagramEdge> + '_ {
        self.out_edges[node.id].iter().map(|&e| &self.edges[e])
    }

    pub fn in_edges(&self, node: NodeRef) -> impl Iterator<Item = &DiagramEdge> + '_ {
        self.in_edges[node.id].iter().map(|&e| &self.edges[e])
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.node_refs().filter(|r| self.nodes[r.id].root)
    }

    pub fn terminals(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.node_refs().filter(|r| self.nodes[r.id].terminal)
    }

    /// Atoms referenced by non-constant edge literals.
    pub fn input_variables(&self) -> BTreeSet<String> {
        self.edges
            .iter()
            .filter(|e| !e.literal.is_constant())
            .map(|e| e.literal.atom.clone())
            .collect()
    }

    pub fn output_variables(&self) -> BTreeSet<String> {
        self.nodes
            .iter()
            .filter(|n| n.root)
            .flat_map(|n| n.output_variables.iter().cloned())
            .collect()
    }

    /// Extracts the sub-diagram reachable from the root that produces
    /// `output`. Nodes keep their relative order; the cone's root is the only
    /// root and carries only `output`.
    pub fn cone(&self, output: &str) -> Result<DecisionDiagram, XbarError> {
        let root = self
            .roots()
            .find(|r| self.nodes[r.id].output_variables.contains(output))
            .ok_or_else(|| XbarError::UnknownRail(output.to_string()))?;

        let mut reachable = vec![false; self.nodes.len()];
        let mut worklist = vec![root];
        reachable[root.id] = true;
        while let Some(current) = worklist.pop() {
            for edge in self.out_edges(current) {
                if !reachable[edge.target.id] {
                    reachable[edge.target.id] = true;
                    worklist.push(edge.target);
                }
            }
        }

        let mut cone = DecisionDiagram::new(output);
        let mut remap: HashMap<NodeRef, NodeRef> = HashMap::new();
        for node_ref in self.node_refs().filter(|r| reachable[r.id]) {
            let original = &self.nodes[node_ref.id];
            let is_root = node_ref == root;
            let new_ref = cone.add_node(DiagramNode {
                variable: original.variable.clone(),
                terminal: original.terminal,
                root: is_root,
                output_variables: if is_root {
                    std::iter::once(output.to_string()).collect()
                } else {
                    BTreeSet::new()
                },
            });
            remap.insert(node_ref, new_ref);
        }
        for edge in &self.edges {
            if let (Some(&s), Some(&t)) = (remap.get(&edge.source), remap.get(&edge.target)) {
                cone.add_edge(s, t, edge.literal.clone())?;
            }
        }
        log::debug!(
            "cone for '{}': {} of {} nodes, {} edges",
            output,
            cone.node_count(),
            self.node_count(),
            cone.edge_count()
        );
        Ok(cone)
    }

    /// Splits a multi-output diagram into one cone per output name.
    pub fn split(&self) -> Result<BTreeMap<String, DecisionDiagram>, XbarError> {
        self.output_variables()
            .into_iter()
            .map(|output| {
                let cone = self.cone(&output)?;
                Ok((output, cone))
            })
            .collect()
    }

    /// Evaluates the diagram by path semantics: an output is true when a path
    /// of edges whose literals hold under `instance` leads from its root to a
    /// terminal whose variable is `input_function`.
    pub fn evaluate(
        &self,
        instance: &HashMap<String, bool>,
        input_function: &str,
    ) -> Result<BTreeMap<String, bool>, XbarError> {
        let mut conducting = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            if edge.literal.resolve(instance)? {
                conducting[edge.source.id].push(edge.target);
            }
        }

        let mut result = BTreeMap::new();
        for root in self.roots() {
            let mut seen = vec![false; self.nodes.len()];
            let mut queue = VecDeque::from([root]);
            seen[root.id] = true;
            let mut value = false;
            while let Some(current) = queue.pop_front() {
                let node = &self.nodes[current.id];
                if node.terminal && node.variable == input_function {
                    value = true;
                    break;
                }
                for &next in &conducting[current.id] {
                    if !seen[next.id] {
                        seen[next.id] = true;
                        queue.push_back(next);
                    }
                }
            }
            for output in &self.nodes[root.id].output_variables {
                result.insert(output.clone(), value);
            }
        }
        Ok(result)
    }
}

/// A multi-output design: the dependency graph over signal names (primary
/// inputs and output functions, edges `dependency -> dependent`) together with
/// the sub-diagram producing each output function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramTopology {
    pub diagrams: BTreeMap<String, DecisionDiagram>,
    /// `dependent -> dependencies`.
    #[serde(default)]
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl DiagramTopology {
    /// Builds the dependency graph from the input variables of each diagram:
    /// every atom a diagram reads becomes a dependency of its output.
    pub fn from_diagrams(diagrams: BTreeMap<String, DecisionDiagram>) -> Self {
        let mut dependencies = BTreeMap::new();
        for (output, diagram) in &diagrams {
            dependencies.insert(output.clone(), diagram.input_variables());
        }
        Self {
            diagrams,
            dependencies,
        }
    }

    pub fn add_dependency(&mut self, dependency: &str, dependent: &str) {
        self.dependencies
            .entry(dependent.to_string())
            .or_default()
            .insert(dependency.to_string());
    }

    /// Every signal mentioned by the dependency graph or owning a diagram.
    pub fn signals(&self) -> BTreeSet<String> {
        let mut signals: BTreeSet<String> = self.diagrams.keys().cloned().collect();
        for (dependent, deps) in &self.dependencies {
            signals.insert(dependent.clone());
            signals.extend(deps.iter().cloned());
        }
        signals
    }

    /// Topological generations of the reversed dependency graph: generation 0
    /// holds the signals nothing depends on, the last generation holds the
    /// primary inputs. Names within a generation are sorted.
    pub fn output_first_generations(&self) -> Result<Vec<Vec<String>>, XbarError> {
        let signals = self.signals();
        // In the reversed graph an edge runs dependent -> dependency, so a
        // signal's in-degree is its number of dependents.
        let mut dependents_remaining: BTreeMap<&str, usize> =
            signals.iter().map(|s| (s.as_str(), 0)).collect();
        for deps in self.dependencies.values() {
            for dep in deps {
                if let Some(count) = dependents_remaining.get_mut(dep.as_str()) {
                    *count += 1;
                }
            }
        }

        let mut generations = Vec::new();
        let mut current: Vec<&str> = dependents_remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut visited = 0;
        while !current.is_empty() {
            visited += current.len();
            let mut next = BTreeSet::new();
            for name in &current {
                if let Some(deps) = self.dependencies.get(*name) {
                    for dep in deps {
                        if let Some(count) = dependents_remaining.get_mut(dep.as_str()) {
                            *count -= 1;
                            if *count == 0 {
                                next.insert(dep.as_str());
                            }
                        }
                    }
                }
            }
            generations.push(current.iter().map(|s| s.to_string()).collect());
            current = next.into_iter().collect();
        }
        if visited != signals.len() {
            log::error!(
                "dependency graph has a cycle: visited {} of {} signals",
                visited,
                signals.len()
            );
            return Err(XbarError::StructuralCycle {
                visited,
                total: signals.len(),
            });
        }
        Ok(generations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{bdd_and2, bdd_single_var};
    use maplit::{btreemap, hashmap};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parallel_edge_is_rejected() {
        let mut dd = DecisionDiagram::new("f");
        let a = dd.add_node(DiagramNode::root("x", &["f"]));
        let b = dd.add_node(DiagramNode::terminal("1"));
        dd.add_edge(a, b, Literal::new("x", true)).unwrap();
        let err = dd.add_edge(a, b, Literal::new("x", false)).unwrap_err();
        assert_eq!(err, XbarError::ParallelEdge { source: 0, target: 1 });
    }

    #[test]
    fn test_edge_to_missing_node_is_out_of_range() {
        let mut dd = DecisionDiagram::new("f");
        let a = dd.add_node(DiagramNode::root("x", &["f"]));
        let err = dd
            .add_edge(a, NodeRef { id: 7 }, Literal::on())
            .unwrap_err();
        assert!(matches!(err, XbarError::IndexOutOfRange { index: 7, .. }));
    }

    #[test]
    fn test_evaluate_and2() {
        let dd = bdd_and2("f", "a", "b");
        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            let instance = hashmap! { "a".to_string() => a, "b".to_string() => b };
            let got = dd.evaluate(&instance, "1").unwrap();
            assert_eq!(got, btreemap! { "f".to_string() => a && b });
        }
    }

    #[test]
    fn test_evaluate_unbound_variable() {
        let dd = bdd_single_var("f", "x");
        let err = dd.evaluate(&HashMap::new(), "1").unwrap_err();
        assert_eq!(err, XbarError::UnboundVariable("x".to_string()));
    }

    #[test]
    fn test_json_round_trip_rechecks_edges() {
        let dd = bdd_and2("f", "a", "b");
        let json = serde_json::to_string(&dd).unwrap();
        let back: DecisionDiagram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dd);

        let bad = r#"{"name": "g", "nodes": [{"variable": "x", "root": true}], "edges": [{"source": 0, "target": 3, "literal": {"atom": "x", "positive": true}}]}"#;
        assert!(serde_json::from_str::<DecisionDiagram>(bad).is_err());
    }

    #[test]
    fn test_cone_keeps_only_reachable_nodes() {
        // Two roots sharing the terminal layer: f = a, g = a & b.
        let mut dd = DecisionDiagram::new("fg");
        let f = dd.add_node(DiagramNode::root("a", &["f"]));
        let g = dd.add_node(DiagramNode::root("a", &["g"]));
        let b = dd.add_node(DiagramNode::internal("b"));
        let one = dd.add_node(DiagramNode::terminal("1"));
        let zero = dd.add_node(DiagramNode::terminal("0"));
        dd.add_edge(f, one, Literal::new("a", true)).unwrap();
        dd.add_edge(f, zero, Literal::new("a", false)).unwrap();
        dd.add_edge(g, b, Literal::new("a", true)).unwrap();
        dd.add_edge(g, zero, Literal::new("a", false)).unwrap();
        dd.add_edge(b, one, Literal::new("b", true)).unwrap();
        dd.add_edge(b, zero, Literal::new("b", false)).unwrap();

        let cone = dd.cone("f").unwrap();
        assert_eq!(cone.node_count(), 3);
        assert_eq!(cone.edge_count(), 2);
        let expected: BTreeSet<String> = std::iter::once("f".to_string()).collect();
        assert_eq!(cone.output_variables(), expected);

        let cones = dd.split().unwrap();
        assert_eq!(cones["g"].node_count(), 4);
        assert!(matches!(dd.cone("h"), Err(XbarError::UnknownRail(_))));
    }

    #[test]
    fn test_output_first_generations() {
        let mut diagrams = BTreeMap::new();
        diagrams.insert("n1".to_string(), bdd_and2("n1", "a", "b"));
        diagrams.insert("n2".to_string(), bdd_and2("n2", "n1", "c"));
        let topology = DiagramTopology::from_diagrams(diagrams);
        let generations = topology.output_first_generations().unwrap();
        assert_eq!(
            generations,
            vec![
                vec!["n2".to_string()],
                vec!["c".to_string(), "n1".to_string()],
                vec!["a".to_string(), "b".to_string()],
            ]
        );
    }

    #[test]
    fn test_dependency_cycle_is_reported() {
        let mut topology = DiagramTopology::default();
        topology.add_dependency("x", "y");
        topology.add_dependency("y", "x");
        let err = topology.output_first_generations().unwrap_err();
        assert_eq!(err, XbarError::StructuralCycle { visited: 0, total: 2 });
    }
}
