// SPDX-License-Identifier: Apache-2.0

//! Maps a K-layer labeling onto a layered crossbar. A node spanning several
//! nanowire layers owns one wire per layer, joined by "always conducting"
//! tie cells.

use crate::crossbar::Crossbar;
use crate::diagram::DecisionDiagram;
use crate::labeling::klayer::KLayerLabeling;
use crate::literal::Literal;
use crate::xbar_error::XbarError;

/// The cell of memristor layer `m` joining the wire `low` on nanowire layer
/// `m` with the wire `high` on nanowire layer `m + 1`, as `(row, column)`.
fn cell_between(m: usize, low: usize, high: usize) -> (usize, usize) {
    if m % 2 == 0 { (low, high) } else { (high, low) }
}

pub fn map_compact3d(
    diagram: &DecisionDiagram,
    labeling: &KLayerLabeling,
) -> Result<Crossbar, XbarError> {
    let k = labeling.layers;
    if labeling.ranges.len() != diagram.node_count() {
        return Err(XbarError::Unsupported(format!(
            "labeling covers {} nodes but diagram '{}' has {}",
            labeling.ranges.len(),
            diagram.name,
            diagram.node_count()
        )));
    }
    let nanowire_layers = k + 1;

    // wire[node][layer]: index of the node's wire on that nanowire layer.
    let mut wire: Vec<Vec<Option<usize>>> = vec![vec![None; nanowire_layers]; diagram.node_count()];
    let mut layer_sizes = vec![0usize; nanowire_layers];
    for (node, range) in labeling.ranges.iter().enumerate() {
        if range.highest >= nanowire_layers {
            return Err(XbarError::IndexOutOfRange {
                what: "nanowire layer",
                index: range.highest,
                bound: nanowire_layers,
            });
        }
        for l in range.lowest..=range.highest {
            wire[node][l] = Some(layer_sizes[l]);
            layer_sizes[l] += 1;
        }
    }
    let rows = layer_sizes.iter().step_by(2).copied().max().unwrap_or(0);
    let columns = layer_sizes.iter().skip(1).step_by(2).copied().max().unwrap_or(0);
    log::debug!(
        "compact3d '{}': {} rows, {} columns, {} layers, layer sizes {:?}",
        diagram.name,
        rows,
        columns,
        k,
        layer_sizes
    );
    let mut crossbar = Crossbar::new(rows, columns, k).with_name(&diagram.name);

    for node_wires in &wire {
        for m in 0..k {
            if let (Some(low), Some(high)) = (node_wires[m], node_wires[m + 1]) {
                let (r, c) = cell_between(m, low, high);
                crossbar.set_cell(m, r, c, Literal::on(), false)?;
            }
        }
    }

    for edge in diagram.edges() {
        let (a, b) = (edge.source.id, edge.target.id);
        let placed = (0..k).find_map(|m| {
            match (wire[a][m], wire[b][m + 1], wire[b][m], wire[a][m + 1]) {
                (Some(low), Some(high), _, _) | (_, _, Some(low), Some(high)) => Some((m, low, high)),
                _ => None,
            }
        });
        let Some((m, low, high)) = placed else {
            return Err(XbarError::Unsupported(format!(
                "no memristor layer joins nodes {} and {}",
                a, b
            )));
        };
        let (r, c) = cell_between(m, low, high);
        crossbar.set_cell(m, r, c, edge.literal.clone(), false)?;
    }

    for node in diagram.node_refs() {
        let data = diagram.node(node);
        let range = labeling.ranges[node.id];
        let Some(index) = wire[node.id][range.lowest] else {
            continue;
        };
        if data.terminal {
            crossbar.set_input_rail(&data.variable, range.lowest, index)?;
        }
        if data.root {
            for output in &data.output_variables {
                crossbar.set_output_rail(output, range.lowest, index)?;
            }
        }
    }

    Ok(crossbar.flip_vertical())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthConfig;
    use crate::ilp::SolveStatus;
    use crate::ilp::branch_bound::BranchAndBound;
    use crate::labeling::klayer::{KLayerReport, LayerRange, label_klayer};
    use crate::test_utils::{all_instances, bdd_and2, path_diagram};

    fn labeling(layers: usize, ranges: Vec<LayerRange>) -> KLayerLabeling {
        KLayerLabeling {
            layers,
            ranges,
            objective: 0.0,
            status: SolveStatus::Optimal,
            report: KLayerReport {
                labeling_method: "manual",
                gamma: 0.5,
                layers,
                status: SolveStatus::Optimal,
                objective: 0.0,
                layer_sizes: vec![],
                solve_time_secs: 0.0,
            },
        }
    }

    #[test]
    fn test_spanning_node_gets_tie_cell() {
        // Root and terminal on layer 0, b spanning layers 1 and 2.
        let dd = bdd_and2("f", "a", "b");
        let ranges = vec![
            LayerRange { lowest: 0, highest: 0 },
            LayerRange { lowest: 1, highest: 2 },
            LayerRange { lowest: 0, highest: 0 },
        ];
        let xbar = map_compact3d(&dd, &labeling(2, ranges)).unwrap();
        assert_eq!((xbar.rows(), xbar.columns(), xbar.memristor_layers()), (2, 1, 2));
        // Tie between b's column (layer 1) and b's row on layer 2.
        assert_eq!(xbar.get_cell(1, 0, 0).unwrap().literal, Literal::on());
        for instance in all_instances(&["a", "b"]) {
            assert_eq!(
                xbar.evaluate(&instance, "1").unwrap(),
                dd.evaluate(&instance, "1").unwrap()
            );
        }
    }

    #[test]
    fn test_labeled_two_layer_mapping_matches_diagram() {
        let dd = path_diagram(5);
        let config = SynthConfig {
            layers: 2,
            ..SynthConfig::default()
        };
        let labeling = label_klayer(&dd, &config, &BranchAndBound::new()).unwrap();
        let xbar = map_compact3d(&dd, &labeling).unwrap();
        let atoms: Vec<String> = dd.input_variables().into_iter().collect();
        let atoms: Vec<&str> = atoms.iter().map(|s| s.as_str()).collect();
        for instance in all_instances(&atoms) {
            assert_eq!(
                xbar.evaluate(&instance, "1").unwrap(),
                dd.evaluate(&instance, "1").unwrap()
            );
        }
    }
}
