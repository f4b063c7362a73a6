// SPDX-License-Identifier: Apache-2.0

//! Depth-first branch and bound over integer bounds.
//!
//! Each search node is a box of per-variable bounds. Bounds are tightened by
//! constraint propagation until a fixed point, then the node is pruned if the
//! objective's lower bound over the box cannot beat the incumbent. Otherwise
//! the first unfixed variable is split into "fixed at its preferred value"
//! and "the rest of its domain".

use std::time::{Duration, Instant};

use crate::ilp::{Comparison, IlpSolution, IlpSolver, IntegerProgram, SolveStatus};

const EPS: f64 = 1e-9;

/// How many search nodes to expand between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 64;

/// A constraint in `sum(a_i * x_i) <= b` form.
struct Row {
    terms: Vec<(usize, f64)>,
    rhs: f64,
}

fn normalize(program: &IntegerProgram) -> Vec<Row> {
    let mut rows = Vec::new();
    for constraint in &program.constraints {
        let terms: Vec<(usize, f64)> = constraint.terms.iter().map(|(v, c)| (v.id, *c)).collect();
        let negated = || -> Row {
            Row {
                terms: terms.iter().map(|(v, c)| (*v, -c)).collect(),
                rhs: -constraint.rhs,
            }
        };
        match constraint.cmp {
            Comparison::Le => rows.push(Row {
                terms: terms.clone(),
                rhs: constraint.rhs,
            }),
            Comparison::Ge => rows.push(negated()),
            Comparison::Eq => {
                rows.push(Row {
                    terms: terms.clone(),
                    rhs: constraint.rhs,
                });
                rows.push(negated());
            }
        }
    }
    rows
}

#[derive(Debug, Clone)]
struct Bounds {
    lower: Vec<i64>,
    upper: Vec<i64>,
}

impl Bounds {
    fn is_fixed(&self, var: usize) -> bool {
        self.lower[var] == self.upper[var]
    }
}

/// Tightens `bounds` to a fixed point. Returns false when some constraint can
/// no longer be satisfied.
fn propagate(rows: &[Row], bounds: &mut Bounds) -> bool {
    loop {
        let mut changed = false;
        for row in rows {
            let min_activity: f64 = row
                .terms
                .iter()
                .map(|&(v, a)| {
                    if a > 0.0 {
                        a * bounds.lower[v] as f64
                    } else {
                        a * bounds.upper[v] as f64
                    }
                })
                .sum();
            if min_activity > row.rhs + EPS {
                return false;
            }
            for &(v, a) in &row.terms {
                if a.abs() < EPS {
                    continue;
                }
                let own = if a > 0.0 {
                    a * bounds.lower[v] as f64
                } else {
                    a * bounds.upper[v] as f64
                };
                let slack = row.rhs - (min_activity - own);
                if a > 0.0 {
                    let limit = (slack / a + EPS).floor() as i64;
                    if limit < bounds.upper[v] {
                        bounds.upper[v] = limit;
                        changed = true;
                    }
                } else {
                    let limit = (slack / a - EPS).ceil() as i64;
                    if limit > bounds.lower[v] {
                        bounds.lower[v] = limit;
                        changed = true;
                    }
                }
                if bounds.lower[v] > bounds.upper[v] {
                    return false;
                }
            }
        }
        if !changed {
            return true;
        }
    }
}

fn objective_lower_bound(objective: &[(usize, f64)], bounds: &Bounds) -> f64 {
    objective
        .iter()
        .map(|&(v, c)| {
            if c > 0.0 {
                c * bounds.lower[v] as f64
            } else {
                c * bounds.upper[v] as f64
            }
        })
        .sum()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BranchAndBound;

impl BranchAndBound {
    pub fn new() -> Self {
        Self
    }
}

impl IlpSolver for BranchAndBound {
    fn name(&self) -> &'static str {
        "branch-and-bound"
    }

    fn solve(&self, program: &IntegerProgram, time_limit: Option<Duration>) -> IlpSolution {
        let start = Instant::now();
        let deadline = time_limit.map(|limit| start + limit);
        let rows = normalize(program);
        let n = program.variables.len();

        let mut objective_coeffs = vec![0.0; n];
        for (v, c) in &program.objective {
            objective_coeffs[v.id] += c;
        }
        let objective: Vec<(usize, f64)> = objective_coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.abs() > EPS)
            .map(|(v, c)| (v, *c))
            .collect();

        let mut incumbent: Option<(Vec<i64>, f64)> = None;
        if let Some(warm) = &program.warm_start {
            if program.is_feasible(warm) {
                let value = program.objective_value(warm);
                log::debug!("{}: warm start accepted with objective {}", program.name, value);
                incumbent = Some((warm.clone(), value));
            } else {
                log::warn!("{}: warm start is infeasible; ignoring it", program.name);
            }
        }

        let root = Bounds {
            lower: program.variables.iter().map(|v| v.lower).collect(),
            upper: program.variables.iter().map(|v| v.upper).collect(),
        };
        let mut stack = vec![root];
        let mut expanded = 0usize;
        let mut timed_out = false;

        while let Some(mut bounds) = stack.pop() {
            expanded += 1;
            if expanded % DEADLINE_CHECK_INTERVAL == 0 {
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        timed_out = true;
                        break;
                    }
                }
            }
            if !propagate(&rows, &mut bounds) {
                continue;
            }
            let bound = objective_lower_bound(&objective, &bounds);
            if let Some((_, best)) = &incumbent {
                if bound >= best - EPS {
                    continue;
                }
            }
            let Some(var) = (0..n).find(|&v| !bounds.is_fixed(v)) else {
                // Every variable is fixed and propagation kept all rows
                // satisfied, so this is a strictly better solution.
                let values = bounds.lower.clone();
                let value = program.objective_value(&values);
                log::debug!(
                    "{}: new incumbent {} after {} nodes",
                    program.name,
                    value,
                    expanded
                );
                incumbent = Some((values, value));
                continue;
            };

            let (lo, hi) = (bounds.lower[var], bounds.upper[var]);
            let prefer_low = objective_coeffs[var] >= 0.0;
            let mut preferred = bounds.clone();
            let mut rest = bounds;
            if prefer_low {
                preferred.upper[var] = lo;
                rest.lower[var] = lo + 1;
            } else {
                preferred.lower[var] = hi;
                rest.upper[var] = hi - 1;
            }
            // Depth first: the preferred branch is popped next.
            stack.push(rest);
            stack.push(preferred);
        }

        let status = match (&incumbent, timed_out) {
            (_, true) => SolveStatus::TimeLimited,
            (Some(_), false) => SolveStatus::Optimal,
            (None, false) => SolveStatus::Infeasible,
        };
        log::info!(
            "{}: {:?} after {} nodes in {:.3}s",
            program.name,
            status,
            expanded,
            start.elapsed().as_secs_f64()
        );
        match incumbent {
            Some((values, objective)) => IlpSolution {
                status,
                values: Some(values),
                objective: Some(objective),
            },
            None => IlpSolution {
                status,
                values: None,
                objective: None,
            },
        }
    }
}
