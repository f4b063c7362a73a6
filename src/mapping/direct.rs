// SPDX-License-Identifier: Apache-2.0

//! Baseline mapping: one row per diagram node and one column per diagram
//! edge. Each column carries the parent's literal on the parent's row and an
//! "always conducting" cell on the child's row.

use crate::crossbar::Crossbar;
use crate::diagram::DecisionDiagram;
use crate::literal::Literal;
use crate::xbar_error::XbarError;

pub fn map_direct(diagram: &DecisionDiagram) -> Result<Crossbar, XbarError> {
    let rows = diagram.node_count();
    let columns = diagram.edge_count();
    let mut crossbar = Crossbar::new(rows, columns, 1).with_name(&diagram.name);

    // Rows follow node order, so a node's row is its handle id.
    let mut c = 0;
    for node in diagram.node_refs() {
        let variable = &diagram.node(node).variable;
        let positive = diagram.out_edges(node).filter(|e| e.literal.positive);
        let negative = diagram.out_edges(node).filter(|e| !e.literal.positive);
        for edge in positive.chain(negative) {
            crossbar.set(node.id, c, Literal::new(variable, edge.literal.positive))?;
            crossbar.set(edge.target.id, c, Literal::on())?;
            c += 1;
        }
    }

    for node in diagram.node_refs() {
        let data = diagram.node(node);
        if data.terminal {
            crossbar.set_input_rail(&data.variable, 0, node.id)?;
        }
        if data.root {
            for output in &data.output_variables {
                crossbar.set_output_rail(output, 0, node.id)?;
            }
        }
    }
    log::debug!("direct '{}': {} rows, {} columns", diagram.name, rows, columns);
    Ok(crossbar)
}
