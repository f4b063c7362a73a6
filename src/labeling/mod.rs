// SPDX-License-Identifier: Apache-2.0

//! Node labelings: which physical axis (or, for layered crossbars, which
//! contiguous range of nanowire layers) each diagram node occupies.

pub mod klayer;
pub mod vh;

use serde::{Deserialize, Serialize};

use crate::ilp::{IlpSolution, SolveStatus};
use crate::xbar_error::XbarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Vertical,
    Horizontal,
    Both,
}

impl Label {
    pub fn is_vertical(self) -> bool {
        matches!(self, Label::Vertical | Label::Both)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Label::Horizontal | Label::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelingReport {
    pub labeling_method: &'static str,
    pub gamma: f64,
    pub status: SolveStatus,
    pub objective: f64,
    pub vertical: usize,
    pub horizontal: usize,
    pub both: usize,
    pub solve_time_secs: f64,
}

/// Maps solver outcomes onto errors. A time-limited incumbent is accepted with
/// a warning.
pub(crate) fn accept_solution(
    solution: IlpSolution,
    time_limit_secs: Option<f64>,
    what: &str,
) -> Result<(Vec<i64>, f64), XbarError> {
    match (solution.status, solution.values, solution.objective) {
        (SolveStatus::Infeasible, _, _) => Err(XbarError::SolverInfeasible),
        (SolveStatus::TimeLimited, Some(values), Some(objective)) => {
            log::warn!(
                "{}: time limit reached; using incumbent with objective {}",
                what,
                objective
            );
            Ok((values, objective))
        }
        (SolveStatus::Optimal, Some(values), Some(objective)) => Ok((values, objective)),
        _ => Err(XbarError::SolverNoIncumbent {
            time_limit_secs: time_limit_secs.unwrap_or(0.0),
        }),
    }
}
