// SPDX-License-Identifier: Apache-2.0

//! Bipartite-graph view of a crossbar and flow-based evaluation.
//!
//! Every nanowire becomes a graph node `L{layer}_{index}` and every memristor
//! an edge between the two nanowires it joins. A function evaluates to true
//! when current can flow from its output rail to the selected input rail
//! through cells that conduct under the instance.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::crossbar::{Crossbar, CrossbarKind, Memristor, Rail};
use crate::literal::Literal;
use crate::xbar_error::XbarError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub a: Rail,
    pub b: Rail,
    pub literal: Literal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RailAttributes {
    pub input_functions: BTreeSet<String>,
    pub output_functions: BTreeSet<String>,
}

/// Undirected multigraph over nanowires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossbarGraph {
    pub nodes: BTreeSet<Rail>,
    pub edges: Vec<GraphEdge>,
    pub attributes: BTreeMap<Rail, RailAttributes>,
}

impl CrossbarGraph {
    /// Drops every edge that is not "always conducting".
    pub fn retain_conducting(&mut self) {
        self.edges.retain(|e| e.literal.is_on());
    }

    pub fn node_names(&self) -> Vec<String> {
        self.nodes.iter().map(|r| r.to_string()).collect()
    }

    pub fn has_path(&self, from: Rail, to: Rail) -> bool {
        if from == to {
            return true;
        }
        let mut adjacency: HashMap<Rail, Vec<Rail>> = HashMap::new();
        for edge in &self.edges {
            adjacency.entry(edge.a).or_default().push(edge.b);
            adjacency.entry(edge.b).or_default().push(edge.a);
        }
        let mut seen = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            let Some(neighbors) = adjacency.get(&current) else {
                continue;
            };
            for &next in neighbors {
                if next == to {
                    return true;
                }
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

fn resolve_cell(cell: &mut Memristor, instance: &HashMap<String, bool>) -> Result<(), XbarError> {
    if cell.stuck_at_fault || cell.literal.is_constant() {
        return Ok(());
    }
    cell.literal = Literal::from_bool(cell.literal.resolve(instance)?);
    Ok(())
}

impl Crossbar {
    pub fn to_bipartite_graph(&self) -> CrossbarGraph {
        let mut nodes = BTreeSet::new();
        for layer in 0..self.nanowire_layers() {
            for index in 0..self.nanowire_count(layer) {
                nodes.insert(Rail::new(layer, index));
            }
        }
        let edges = self
            .cells()
            .map(|(layer, row, column, cell)| {
                let (a, b) = if layer % 2 == 0 {
                    (Rail::new(layer, row), Rail::new(layer + 1, column))
                } else {
                    (Rail::new(layer, column), Rail::new(layer + 1, row))
                };
                GraphEdge {
                    a,
                    b,
                    literal: cell.literal.clone(),
                }
            })
            .collect();
        let mut attributes: BTreeMap<Rail, RailAttributes> = BTreeMap::new();
        for (name, rail) in self.input_rails() {
            attributes
                .entry(*rail)
                .or_default()
                .input_functions
                .insert(name.clone());
        }
        for (name, rail) in self.output_rails() {
            attributes
                .entry(*rail)
                .or_default()
                .output_functions
                .insert(name.clone());
        }
        CrossbarGraph {
            nodes,
            edges,
            attributes,
        }
    }

    /// Resolves every non-constant, non-stuck cell to a connectivity constant.
    /// For selector crossbars, a column whose selectorline is false under the
    /// instance is forced "never conducting" as a whole.
    pub fn instantiate(&self, instance: &HashMap<String, bool>) -> Result<Crossbar, XbarError> {
        let mut result = self.clone();
        for layer in result.matrix.iter_mut() {
            for row in layer.iter_mut() {
                for cell in row.iter_mut() {
                    resolve_cell(cell, instance)?;
                }
            }
        }
        if let CrossbarKind::Selector { selectorlines } = &mut result.kind {
            for (column, selector) in selectorlines.iter_mut().enumerate() {
                let selected = selector.resolve(instance)?;
                *selector = Literal::from_bool(selected);
                if !selected {
                    for layer in result.matrix.iter_mut() {
                        for row in layer.iter_mut() {
                            row[column].literal = Literal::off();
                        }
                    }
                }
            }
        }
        Ok(result)
    }

    /// Disconnects every cell touching `rail`.
    fn isolate_rail(&mut self, rail: Rail) {
        // A rail on nanowire layer l touches memristor layers l-1 and l.
        let touching = [rail.layer.checked_sub(1), Some(rail.layer)];
        for layer in touching.into_iter().flatten() {
            if layer >= self.layers {
                continue;
            }
            if rail.is_row_wire() {
                for cell in self.matrix[layer][rail.index].iter_mut() {
                    cell.literal = Literal::off();
                }
            } else {
                for row in self.matrix[layer].iter_mut() {
                    row[rail.index].literal = Literal::off();
                }
            }
        }
    }

    /// Evaluates every output function with current injected on the input
    /// rail named `input_function`. Cells along every other input rail are
    /// disconnected first so no path can loop through them.
    pub fn evaluate(
        &self,
        instance: &HashMap<String, bool>,
        input_function: &str,
    ) -> Result<BTreeMap<String, bool>, XbarError> {
        let source = self
            .input_rail(input_function)
            .ok_or_else(|| XbarError::UnknownRail(input_function.to_string()))?;

        let mut isolated = self.clone();
        for (name, rail) in self.input_rails() {
            if name != input_function && *rail != source {
                isolated.isolate_rail(*rail);
            }
        }

        let mut graph = isolated.instantiate(instance)?.to_bipartite_graph();
        graph.retain_conducting();

        let evaluation: BTreeMap<String, bool> = self
            .output_rails()
            .iter()
            .map(|(name, rail)| (name.clone(), graph.has_path(*rail, source)))
            .collect();
        log::trace!(
            "crossbar '{}' evaluated from '{}': {:?}",
            self.name,
            input_function,
            evaluation
        );
        Ok(evaluation)
    }
}
