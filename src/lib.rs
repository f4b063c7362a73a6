// SPDX-License-Identifier: Apache-2.0

//! Synthesis of decision diagrams onto flow-based memristor crossbars.

pub mod config;
pub mod crossbar;
pub mod diagram;
pub mod ilp;
pub mod iso;
pub mod labeling;
pub mod literal;
pub mod mapping;
pub mod partition;
pub mod synth;
pub mod topology;
pub mod xbar_error;

#[cfg(test)]
mod test_utils;

pub use config::SynthConfig;
pub use crossbar::{Crossbar, CrossbarKind, Rail};
pub use diagram::{DecisionDiagram, DiagramNode, DiagramTopology, NodeRef};
pub use ilp::IlpSolver;
pub use ilp::branch_bound::BranchAndBound;
pub use iso::{IsoReport, schedule_patterns};
pub use literal::Literal;
pub use synth::{Component, Synthesis, SynthesisMethod, SynthesisReport, synthesize};
pub use topology::Topology;
pub use xbar_error::XbarError;
