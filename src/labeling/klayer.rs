// SPDX-License-Identifier: Apache-2.0

//! K-layer labeling for crossbars with `K` memristor layers (`K + 1`
//! nanowire layers). Every node occupies a contiguous, non-empty range of
//! nanowire layers, and every diagram edge must be realizable on some
//! memristor layer: one endpoint on nanowire layer `m`, the other on `m + 1`.

use std::time::Instant;

use serde::Serialize;

use crate::config::SynthConfig;
use crate::diagram::DecisionDiagram;
use crate::ilp::{Comparison, IlpSolver, IntegerProgram, SolveStatus, VarId};
use crate::labeling::accept_solution;
use crate::xbar_error::XbarError;

/// Inclusive range of nanowire layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LayerRange {
    pub lowest: usize,
    pub highest: usize,
}

impl LayerRange {
    pub fn contains(&self, layer: usize) -> bool {
        self.lowest <= layer && layer <= self.highest
    }

    pub fn len(&self) -> usize {
        self.highest - self.lowest + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KLayerReport {
    pub labeling_method: &'static str,
    pub gamma: f64,
    pub layers: usize,
    pub status: SolveStatus,
    pub objective: f64,
    /// Node count per nanowire layer.
    pub layer_sizes: Vec<usize>,
    pub solve_time_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KLayerLabeling {
    /// Number of memristor layers.
    pub layers: usize,
    /// Indexed by `NodeRef::id`.
    pub ranges: Vec<LayerRange>,
    pub objective: f64,
    pub status: SolveStatus,
    pub report: KLayerReport,
}

pub fn label_klayer(
    diagram: &DecisionDiagram,
    config: &SynthConfig,
    solver: &dyn IlpSolver,
) -> Result<KLayerLabeling, XbarError> {
    let k = config.layers;
    if k == 0 {
        return Err(XbarError::Unsupported(
            "a crossbar needs at least one memristor layer".to_string(),
        ));
    }
    let start = Instant::now();
    let nanowire_layers = k + 1;
    let n = diagram.node_count() as i64;
    let mut program = IntegerProgram::new(&format!("klayer_labeling_{}", diagram.name));

    let x: Vec<Vec<VarId>> = diagram
        .node_refs()
        .map(|node| {
            (0..nanowire_layers)
                .map(|l| program.add_binary(&format!("x_{}_{}", node.id, l)))
                .collect()
        })
        .collect();
    // Per edge, per memristor layer: [source low / target high, target low /
    // source high].
    let s: Vec<Vec<[VarId; 2]>> = (0..diagram.edge_count())
        .map(|e| {
            (0..k)
                .map(|m| {
                    [
                        program.add_binary(&format!("s_{}_{}_up", e, m)),
                        program.add_binary(&format!("s_{}_{}_down", e, m)),
                    ]
                })
                .collect()
        })
        .collect();
    let total = program.add_var("S", 0, n * nanowire_layers as i64);
    let d = program.add_var("D", 0, n);

    program.set_objective(vec![(total, config.gamma), (d, 1.0 - config.gamma)]);

    let mut total_terms = vec![(total, 1.0)];
    for node_layers in &x {
        total_terms.extend(node_layers.iter().map(|&v| (v, -1.0)));
        program.add_constraint(
            node_layers.iter().map(|&v| (v, 1.0)).collect(),
            Comparison::Ge,
            1.0,
        );
        // Contiguity: never occupy a and c while skipping b in between.
        for a in 0..nanowire_layers {
            for b in a + 1..nanowire_layers {
                for c in b + 1..nanowire_layers {
                    program.add_constraint(
                        vec![(node_layers[a], 1.0), (node_layers[c], 1.0), (node_layers[b], -1.0)],
                        Comparison::Le,
                        1.0,
                    );
                }
            }
        }
    }
    program.add_constraint(total_terms, Comparison::Eq, 0.0);

    for l in 0..nanowire_layers {
        let mut terms: Vec<(VarId, f64)> = x.iter().map(|node_layers| (node_layers[l], -1.0)).collect();
        terms.push((d, 1.0));
        program.add_constraint(terms, Comparison::Ge, 0.0);
    }

    for (edge, choices) in diagram.edges().iter().zip(&s) {
        let (u, v) = (edge.source.id, edge.target.id);
        let mut any = Vec::new();
        for (m, &[up, down]) in choices.iter().enumerate() {
            any.push((up, 1.0));
            any.push((down, 1.0));
            program.add_constraint(vec![(up, 1.0), (x[u][m], -1.0)], Comparison::Le, 0.0);
            program.add_constraint(vec![(up, 1.0), (x[v][m + 1], -1.0)], Comparison::Le, 0.0);
            program.add_constraint(vec![(down, 1.0), (x[v][m], -1.0)], Comparison::Le, 0.0);
            program.add_constraint(vec![(down, 1.0), (x[u][m + 1], -1.0)], Comparison::Le, 0.0);
        }
        program.add_constraint(any, Comparison::Ge, 1.0);
    }

    if config.io_constraints {
        for node in diagram.node_refs() {
            let data = diagram.node(node);
            if data.root || data.terminal {
                program.add_constraint(vec![(x[node.id][0], 1.0)], Comparison::Eq, 1.0);
            }
        }
    }

    // Every node on every layer, every edge on memristor layer 0.
    let mut warm = vec![0i64; program.variables.len()];
    for node_layers in &x {
        for v in node_layers {
            warm[v.id] = 1;
        }
    }
    for choices in &s {
        if let Some([up, _]) = choices.first() {
            warm[up.id] = 1;
        }
    }
    warm[total.id] = n * nanowire_layers as i64;
    warm[d.id] = n;
    program.set_warm_start(warm);

    log::info!(
        "{}-layer labeling '{}': {} variables, {} constraints, solver {}",
        k,
        diagram.name,
        program.variables.len(),
        program.constraints.len(),
        solver.name()
    );
    let solution = solver.solve(&program, config.time_limit());
    let status = solution.status;
    let (values, objective) = accept_solution(solution, config.time_limit_secs, &program.name)?;

    let mut ranges = Vec::with_capacity(x.len());
    for (node, node_layers) in x.iter().enumerate() {
        let occupied: Vec<usize> = (0..nanowire_layers)
            .filter(|&l| values[node_layers[l].id] == 1)
            .collect();
        match (occupied.first(), occupied.last()) {
            (Some(&lowest), Some(&highest)) => ranges.push(LayerRange { lowest, highest }),
            _ => {
                return Err(XbarError::Unsupported(format!(
                    "solver left node {} without a layer",
                    node
                )));
            }
        }
    }
    let layer_sizes: Vec<usize> = (0..nanowire_layers)
        .map(|l| ranges.iter().filter(|r| r.contains(l)).count())
        .collect();
    log::info!(
        "{}-layer labeling '{}': objective {}, layer sizes {:?}",
        k,
        diagram.name,
        objective,
        layer_sizes
    );
    let report = KLayerReport {
        labeling_method: "KLabeling",
        gamma: config.gamma,
        layers: k,
        status,
        objective,
        layer_sizes,
        solve_time_secs: start.elapsed().as_secs_f64(),
    };
    Ok(KLayerLabeling {
        layers: k,
        ranges,
        objective,
        status,
        report,
    })
}
