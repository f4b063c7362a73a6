// SPDX-License-Identifier: Apache-2.0

//! VH labeling: assigns every diagram node to the vertical axis, the
//! horizontal axis or both, minimizing `gamma * S + (1 - gamma) * D` where `S`
//! is the semiperimeter and `D` the larger crossbar dimension.

use std::time::Instant;

use crate::config::SynthConfig;
use crate::diagram::DecisionDiagram;
use crate::ilp::{Comparison, IlpSolver, IntegerProgram, SolveStatus, VarId};
use crate::labeling::{Label, LabelingReport, accept_solution};
use crate::xbar_error::XbarError;

#[derive(Debug, Clone, PartialEq)]
pub struct VhLabeling {
    /// Indexed by `NodeRef::id`.
    pub labels: Vec<Label>,
    pub objective: f64,
    pub status: SolveStatus,
    pub report: LabelingReport,
}

struct VhProgram {
    program: IntegerProgram,
    /// `(inV, inH)` per node.
    node_vars: Vec<(VarId, VarId)>,
}

fn build_program(diagram: &DecisionDiagram, config: &SynthConfig) -> VhProgram {
    let n = diagram.node_count() as i64;
    let mut program = IntegerProgram::new(&format!("vh_labeling_{}", diagram.name));

    let node_vars: Vec<(VarId, VarId)> = diagram
        .node_refs()
        .map(|node| {
            (
                program.add_binary(&format!("x_{}_V", node.id)),
                program.add_binary(&format!("x_{}_H", node.id)),
            )
        })
        .collect();
    let edge_vars: Vec<VarId> = (0..diagram.edge_count())
        .map(|e| program.add_binary(&format!("s_{}", e)))
        .collect();
    let s = program.add_var("S", 0, 2 * n);
    let d = program.add_var("D", 0, n);
    let r = program.add_var("R", 0, n);
    let c = program.add_var("C", 0, n);

    let gamma = config.gamma;
    program.set_objective(vec![(s, gamma), (d, 1.0 - gamma)]);

    let mut s_terms = vec![(s, 1.0)];
    let mut r_terms = vec![(r, 1.0)];
    let mut c_terms = vec![(c, 1.0)];
    for &(v, h) in &node_vars {
        s_terms.push((v, -1.0));
        s_terms.push((h, -1.0));
        r_terms.push((v, -1.0));
        c_terms.push((h, -1.0));
        program.add_constraint(vec![(v, 1.0), (h, 1.0)], Comparison::Ge, 1.0);
    }
    program.add_constraint(s_terms, Comparison::Eq, 0.0);
    program.add_constraint(r_terms, Comparison::Eq, 0.0);
    program.add_constraint(c_terms, Comparison::Eq, 0.0);
    program.add_constraint(vec![(d, 1.0), (r, -1.0)], Comparison::Ge, 0.0);
    program.add_constraint(vec![(d, 1.0), (c, -1.0)], Comparison::Ge, 0.0);

    for (edge, &orientation) in diagram.edges().iter().zip(&edge_vars) {
        let (a_v, a_h) = node_vars[edge.source.id];
        let (b_v, b_h) = node_vars[edge.target.id];
        // orientation = 0: a vertical, b horizontal.
        program.add_constraint(
            vec![(a_v, 1.0), (b_h, 1.0), (orientation, 2.0)],
            Comparison::Ge,
            2.0,
        );
        // orientation = 1: a horizontal, b vertical.
        program.add_constraint(
            vec![(a_h, 1.0), (b_v, 1.0), (orientation, -2.0)],
            Comparison::Ge,
            0.0,
        );
    }

    if config.io_constraints {
        for node in diagram.node_refs() {
            let data = diagram.node(node);
            if data.root || data.terminal {
                let (_, h) = node_vars[node.id];
                program.add_constraint(vec![(h, 1.0)], Comparison::Eq, 1.0);
            }
        }
    }

    // Every node on both axes satisfies every constraint.
    let mut warm = Vec::with_capacity(program.variables.len());
    warm.extend(std::iter::repeat(1).take(2 * node_vars.len()));
    warm.extend(std::iter::repeat(0).take(edge_vars.len()));
    warm.extend([2 * n, n, n, n]);
    program.set_warm_start(warm);

    VhProgram { program, node_vars }
}

pub fn label_vh(
    diagram: &DecisionDiagram,
    config: &SynthConfig,
    solver: &dyn IlpSolver,
) -> Result<VhLabeling, XbarError> {
    let start = Instant::now();
    let VhProgram { program, node_vars } = build_program(diagram, config);
    log::info!(
        "VH labeling '{}': {} variables, {} constraints, solver {}",
        diagram.name,
        program.variables.len(),
        program.constraints.len(),
        solver.name()
    );
    let solution = solver.solve(&program, config.time_limit());
    let status = solution.status;
    let (values, objective) = accept_solution(solution, config.time_limit_secs, &program.name)?;

    let labels: Vec<Label> = node_vars
        .iter()
        .map(|&(v, h)| match (values[v.id] == 1, values[h.id] == 1) {
            (true, true) => Label::Both,
            (true, false) => Label::Vertical,
            (false, _) => Label::Horizontal,
        })
        .collect();
    let count = |label: Label| labels.iter().filter(|l| **l == label).count();
    let report = LabelingReport {
        labeling_method: "VHLabeling",
        gamma: config.gamma,
        status,
        objective,
        vertical: count(Label::Vertical),
        horizontal: count(Label::Horizontal),
        both: count(Label::Both),
        solve_time_secs: start.elapsed().as_secs_f64(),
    };
    log::info!(
        "VH labeling '{}': objective {} (V {}, H {}, VH {})",
        diagram.name,
        objective,
        report.vertical,
        report.horizontal,
        report.both
    );
    Ok(VhLabeling {
        labels,
        objective,
        status,
        report,
    })
}
