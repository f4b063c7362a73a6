// SPDX-License-Identifier: Apache-2.0

//! Fitting pattern classes into a square hardware budget.
//!
//! A prefix of the sorted pattern list is "fixed" (permanently resident);
//! the remainder share one reconfigurable slot, so the budget must hold the
//! fixed prefix plus the largest remaining pattern in both dimensions.

use serde::Serialize;

use crate::xbar_error::XbarError;

/// One pattern class: `count` sub-diagrams sharing `hash`, each needing
/// `nodes` rows and `edges` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternSummary {
    pub hash: String,
    pub count: usize,
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityFit {
    pub budget: Option<usize>,
    /// Length of the fixed prefix.
    pub fixed: usize,
    pub max_rows: usize,
    pub max_columns: usize,
}

/// Stable descending sort by `(count, nodes, edges)`.
pub fn sort_patterns(patterns: &mut [PatternSummary]) {
    patterns.sort_by(|a, b| {
        (b.count, b.nodes, b.edges).cmp(&(a.count, a.nodes, a.edges))
    });
}

/// Worst-case `(rows, columns)` with the first `fixed` patterns resident and
/// the largest of the rest in the variable slot.
pub fn footprint(patterns: &[PatternSummary], fixed: usize) -> (usize, usize) {
    let (prefix, rest) = patterns.split_at(fixed.min(patterns.len()));
    let fixed_rows: usize = prefix.iter().map(|p| p.nodes).sum();
    let fixed_columns: usize = prefix.iter().map(|p| p.edges).sum();
    let variable_rows = rest.iter().map(|p| p.nodes).max().unwrap_or(0);
    let variable_columns = rest.iter().map(|p| p.edges).max().unwrap_or(0);
    (fixed_rows + variable_rows, fixed_columns + variable_columns)
}

pub fn is_feasible(patterns: &[PatternSummary], fixed: usize, budget: usize) -> bool {
    let (rows, columns) = footprint(patterns, fixed);
    rows <= budget && columns <= budget
}

/// Every pattern resident, no variable slot.
pub fn fit_all(patterns: &[PatternSummary]) -> CapacityFit {
    let (max_rows, max_columns) = footprint(patterns, patterns.len());
    CapacityFit {
        budget: None,
        fixed: patterns.len(),
        max_rows,
        max_columns,
    }
}

/// Binary search for the longest feasible fixed prefix of `patterns`, which
/// must already be sorted with [`sort_patterns`].
pub fn fit_capacity(patterns: &[PatternSummary], budget: usize) -> Result<CapacityFit, XbarError> {
    let mut low: isize = 0;
    let mut high: isize = patterns.len() as isize;
    while low <= high {
        let mid = (low + high) / 2;
        if is_feasible(patterns, mid as usize, budget) {
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }
    if high < 0 {
        let (rows, columns) = footprint(patterns, 0);
        log::error!(
            "budget {} cannot hold a {}x{} pattern",
            budget,
            rows,
            columns
        );
        return Err(XbarError::CapacityInfeasible {
            budget,
            minimum: rows.max(columns),
        });
    }
    let fixed = high as usize;
    let (max_rows, max_columns) = footprint(patterns, fixed);
    log::info!(
        "capacity fit: {} of {} patterns fixed, worst case {}x{} within {}",
        fixed,
        patterns.len(),
        max_rows,
        max_columns,
        budget
    );
    Ok(CapacityFit {
        budget: Some(budget),
        fixed,
        max_rows,
        max_columns,
    })
}
