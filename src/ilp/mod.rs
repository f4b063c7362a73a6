// SPDX-License-Identifier: Apache-2.0

//! Linear integer programs and the solver seam used by the labeling step.

pub mod branch_bound;

use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId {
    pub id: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub lower: i64,
    pub upper: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Le,
    Ge,
    Eq,
}

/// `sum(coefficient * variable) <cmp> rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub terms: Vec<(VarId, f64)>,
    pub cmp: Comparison,
    pub rhs: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegerProgram {
    pub name: String,
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    /// Minimized.
    pub objective: Vec<(VarId, f64)>,
    pub warm_start: Option<Vec<i64>>,
}

impl IntegerProgram {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Declares an integer variable with inclusive bounds. Bounds must be
    /// finite; the built-in solver reasons over them directly.
    pub fn add_var(&mut self, name: &str, lower: i64, upper: i64) -> VarId {
        debug_assert!(lower <= upper, "empty domain for {}", name);
        let id = VarId {
            id: self.variables.len(),
        };
        self.variables.push(Variable {
            name: name.to_string(),
            lower,
            upper,
        });
        id
    }

    pub fn add_binary(&mut self, name: &str) -> VarId {
        self.add_var(name, 0, 1)
    }

    pub fn add_constraint(&mut self, terms: Vec<(VarId, f64)>, cmp: Comparison, rhs: f64) {
        self.constraints.push(Constraint { terms, cmp, rhs });
    }

    pub fn set_objective(&mut self, terms: Vec<(VarId, f64)>) {
        self.objective = terms;
    }

    pub fn set_warm_start(&mut self, values: Vec<i64>) {
        self.warm_start = Some(values);
    }

    pub fn objective_value(&self, values: &[i64]) -> f64 {
        self.objective
            .iter()
            .map(|(v, c)| c * values[v.id] as f64)
            .sum()
    }

    /// Whether `values` respects every bound and constraint.
    pub fn is_feasible(&self, values: &[i64]) -> bool {
        const EPS: f64 = 1e-9;
        if values.len() != self.variables.len() {
            return false;
        }
        let in_bounds = self
            .variables
            .iter()
            .zip(values)
            .all(|(var, &x)| var.lower <= x && x <= var.upper);
        in_bounds
            && self.constraints.iter().all(|constraint| {
                let lhs: f64 = constraint
                    .terms
                    .iter()
                    .map(|(v, c)| c * values[v.id] as f64)
                    .sum();
                match constraint.cmp {
                    Comparison::Le => lhs <= constraint.rhs + EPS,
                    Comparison::Ge => lhs >= constraint.rhs - EPS,
                    Comparison::Eq => (lhs - constraint.rhs).abs() <= EPS,
                }
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    /// The time limit ran out; `values` holds the best incumbent, if any.
    TimeLimited,
    Infeasible,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IlpSolution {
    pub status: SolveStatus,
    pub values: Option<Vec<i64>>,
    pub objective: Option<f64>,
}

impl IlpSolution {
    pub fn value(&self, var: VarId) -> Option<i64> {
        self.values.as_ref().map(|values| values[var.id])
    }
}

pub trait IlpSolver {
    fn name(&self) -> &'static str;

    /// Minimizes the program's objective. A `None` time limit means the
    /// search runs to completion.
    fn solve(&self, program: &IntegerProgram, time_limit: Option<Duration>) -> IlpSolution;
}
