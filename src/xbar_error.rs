// SPDX-License-Identifier: Apache-2.0

/// Errors surfaced by the synthesis core. None of these are retried
/// internally; callers decide whether to raise a budget, extend a time limit
/// or fix their input.
#[derive(Debug, Clone, PartialEq)]
pub enum XbarError {
    /// Parse-level failure: wrong token arity, unknown literal token, grid
    /// shape mismatch.
    MalformedRecord(String),
    /// Cell or rail access beyond the declared dimensions.
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        bound: usize,
    },
    /// An evaluation instance is missing an atom referenced by a literal.
    UnboundVariable(String),
    /// A rail name that the crossbar does not declare.
    UnknownRail(String),
    /// The labeling program has no feasible assignment.
    SolverInfeasible,
    /// The solver hit its time limit before finding any assignment.
    SolverNoIncumbent { time_limit_secs: f64 },
    /// The capacity budget cannot hold even the largest single pattern.
    CapacityInfeasible { budget: usize, minimum: usize },
    /// A topology interconnect graph is not a DAG.
    StructuralCycle { visited: usize, total: usize },
    /// A second edge between the same ordered pair of diagram nodes.
    ParallelEdge { source: usize, target: usize },
    /// An operation that is not defined for this crossbar shape.
    Unsupported(String),
}

impl std::fmt::Display for XbarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedRecord(msg) => write!(f, "malformed record: {}", msg),
            Self::IndexOutOfRange { what, index, bound } => {
                write!(f, "{} index {} out of range (bound {})", what, index, bound)
            }
            Self::UnboundVariable(atom) => {
                write!(f, "evaluation instance does not bind variable '{}'", atom)
            }
            Self::UnknownRail(name) => write!(f, "no rail named '{}'", name),
            Self::SolverInfeasible => write!(f, "labeling program is infeasible"),
            Self::SolverNoIncumbent { time_limit_secs } => write!(
                f,
                "solver found no assignment within the {}s time limit",
                time_limit_secs
            ),
            Self::CapacityInfeasible { budget, minimum } => write!(
                f,
                "capacity budget D={} is infeasible; at least D={} is required",
                budget, minimum
            ),
            Self::StructuralCycle { visited, total } => write!(
                f,
                "topology contains a cycle: topological sort visited {} of {} crossbars",
                visited, total
            ),
            Self::ParallelEdge { source, target } => write!(
                f,
                "diagram already has an edge from node {} to node {}",
                source, target
            ),
            Self::Unsupported(msg) => write!(f, "unsupported: {}", msg),
        }
    }
}

impl std::error::Error for XbarError {}
