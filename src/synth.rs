// SPDX-License-Identifier: Apache-2.0

//! One entry point over the synthesis flows.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use serde::Serialize;

use crate::config::SynthConfig;
use crate::crossbar::{Crossbar, CrossbarStats};
use crate::diagram::DecisionDiagram;
use crate::ilp::IlpSolver;
use crate::labeling::LabelingReport;
use crate::labeling::klayer::{KLayerReport, label_klayer};
use crate::labeling::vh::label_vh;
use crate::mapping::compact2d::map_compact2d;
use crate::mapping::compact3d::map_compact3d;
use crate::mapping::direct::map_direct;
use crate::partition::unconstrained::Unconstrained;
use crate::partition::{BipartiteGraph, PartitioningStrategy};
use crate::topology::{Topology, TopologyStats};
use crate::xbar_error::XbarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMethod {
    /// ILP labeling followed by geometric placement; layered when
    /// `SynthConfig::layers > 1`.
    Compact,
    /// One row per node, one column per edge.
    Direct,
    /// Bipartite partitioning into selector crossbars.
    Path,
}

impl std::fmt::Display for SynthesisMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SynthesisMethod::Compact => "compact",
            SynthesisMethod::Direct => "direct",
            SynthesisMethod::Path => "path",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Crossbar(Crossbar),
    Topology(Topology),
}

impl Component {
    pub fn to_text(&self) -> String {
        match self {
            Component::Crossbar(crossbar) => crossbar.to_text(),
            Component::Topology(topology) => topology.to_text(),
        }
    }

    pub fn evaluate(
        &self,
        instance: &HashMap<String, bool>,
        input_function: &str,
    ) -> Result<BTreeMap<String, bool>, XbarError> {
        match self {
            Component::Crossbar(crossbar) => crossbar.evaluate(instance, input_function),
            Component::Topology(topology) => {
                let evaluations = topology.evaluate(instance, input_function)?;
                let outputs = topology.output_variables();
                Ok(evaluations
                    .into_iter()
                    .filter(|(name, _)| outputs.contains(name))
                    .collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LabelingSummary {
    Vh(LabelingReport),
    KLayer(KLayerReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisReport {
    pub name: String,
    pub method: SynthesisMethod,
    pub nodes: usize,
    pub edges: usize,
    pub labeling: Option<LabelingSummary>,
    pub crossbars: Vec<CrossbarStats>,
    pub topology: Option<TopologyStats>,
    pub synthesis_time_secs: f64,
}

#[derive(Debug, Clone)]
pub struct Synthesis {
    pub component: Component,
    pub report: SynthesisReport,
}

pub fn synthesize(
    diagram: &DecisionDiagram,
    method: SynthesisMethod,
    config: &SynthConfig,
    solver: &dyn IlpSolver,
) -> Result<Synthesis, XbarError> {
    config
        .validate()
        .map_err(|msg| XbarError::Unsupported(format!("invalid configuration: {}", msg)))?;
    let start = Instant::now();
    log::info!(
        "synthesizing '{}' ({} nodes, {} edges) with {}",
        diagram.name,
        diagram.node_count(),
        diagram.edge_count(),
        method
    );

    let (component, labeling) = match method {
        SynthesisMethod::Compact if config.layers == 1 => {
            let labeling = label_vh(diagram, config, solver)?;
            let crossbar = map_compact2d(diagram, &labeling.labels, config.io_constraints)?;
            (
                Component::Crossbar(crossbar),
                Some(LabelingSummary::Vh(labeling.report)),
            )
        }
        SynthesisMethod::Compact => {
            let labeling = label_klayer(diagram, config, solver)?;
            let crossbar = map_compact3d(diagram, &labeling)?;
            (
                Component::Crossbar(crossbar),
                Some(LabelingSummary::KLayer(labeling.report)),
            )
        }
        SynthesisMethod::Direct => (Component::Crossbar(map_direct(diagram)?), None),
        SynthesisMethod::Path => {
            let graph = BipartiteGraph::from_diagram(diagram);
            let strategy = Unconstrained;
            log::debug!("partitioning with {}", strategy.name());
            (Component::Topology(strategy.partition(&graph)?), None)
        }
    };

    let (crossbars, topology) = match &component {
        Component::Crossbar(crossbar) => (vec![crossbar.stats()], None),
        Component::Topology(topology) => (
            topology.crossbars().iter().map(|x| x.stats()).collect(),
            Some(topology.stats()?),
        ),
    };
    let report = SynthesisReport {
        name: diagram.name.clone(),
        method,
        nodes: diagram.node_count(),
        edges: diagram.edge_count(),
        labeling,
        crossbars,
        topology,
        synthesis_time_secs: start.elapsed().as_secs_f64(),
    };
    log::info!(
        "synthesized '{}' in {:.3}s",
        diagram.name,
        report.synthesis_time_secs
    );
    Ok(Synthesis { component, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ilp::branch_bound::BranchAndBound;
    use crate::test_utils::{all_instances, bdd_and2, bdd_parity};
    use test_case::test_case;

    #[test_case(SynthesisMethod::Compact, 1; "compact 2d")]
    #[test_case(SynthesisMethod::Compact, 2; "compact 3d")]
    #[test_case(SynthesisMethod::Direct, 1; "direct")]
    #[test_case(SynthesisMethod::Path, 1; "path")]
    fn test_component_matches_diagram(method: SynthesisMethod, layers: usize) {
        let dd = bdd_and2("f", "a", "b");
        let config = SynthConfig {
            layers,
            ..SynthConfig::default()
        };
        let synthesis = synthesize(&dd, method, &config, &BranchAndBound::new()).unwrap();
        for instance in all_instances(&["a", "b"]) {
            assert_eq!(
                synthesis.component.evaluate(&instance, "1").unwrap(),
                dd.evaluate(&instance, "1").unwrap(),
                "{} on {:?}",
                method,
                instance
            );
        }
        assert_eq!(synthesis.report.method, method);
        assert_eq!(
            synthesis.report.labeling.is_some(),
            method == SynthesisMethod::Compact
        );
    }

    #[test_case(SynthesisMethod::Compact, 1; "compact 2d")]
    #[test_case(SynthesisMethod::Compact, 2; "compact 3d")]
    #[test_case(SynthesisMethod::Direct, 1; "direct")]
    #[test_case(SynthesisMethod::Path, 1; "path")]
    fn test_parity_with_zero_terminal(method: SynthesisMethod, layers: usize) {
        let atoms = ["a", "b", "c"];
        let dd = bdd_parity("p", &atoms);
        let config = SynthConfig {
            layers,
            ..SynthConfig::default()
        };
        let synthesis = synthesize(&dd, method, &config, &BranchAndBound::new()).unwrap();
        let compressed = match &synthesis.component {
            Component::Crossbar(crossbar) if layers == 1 => Some(crossbar.compress().unwrap()),
            _ => None,
        };
        for instance in all_instances(&atoms) {
            let parity = atoms.iter().filter(|atom| instance[**atom]).count() % 2 == 1;
            let want = dd.evaluate(&instance, "1").unwrap();
            assert_eq!(want["p"], parity);
            assert_eq!(
                synthesis.component.evaluate(&instance, "1").unwrap(),
                want,
                "{} on {:?}",
                method,
                instance
            );
            if let Some(compressed) = &compressed {
                assert_eq!(compressed.evaluate(&instance, "1").unwrap(), want);
            }
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dd = bdd_and2("f", "a", "b");
        let config = SynthConfig {
            gamma: 2.0,
            ..SynthConfig::default()
        };
        let err = synthesize(&dd, SynthesisMethod::Direct, &config, &BranchAndBound::new())
            .unwrap_err();
        assert!(matches!(err, XbarError::Unsupported(_)));
    }

    #[test]
    fn test_report_serializes() {
        let dd = bdd_and2("f", "a", "b");
        let synthesis = synthesize(
            &dd,
            SynthesisMethod::Path,
            &SynthConfig::default(),
            &BranchAndBound::new(),
        )
        .unwrap();
        let json = serde_json::to_value(&synthesis.report).unwrap();
        assert_eq!(json["method"], "path");
        assert_eq!(json["topology"]["crossbars"], 1);
    }
}
