// SPDX-License-Identifier: Apache-2.0

//! Maps a VH labeling onto a single-layer crossbar: horizontal nodes become
//! rows, vertical nodes become columns, and each diagram edge becomes the cell
//! joining its endpoints' wires.

use crate::crossbar::Crossbar;
use crate::diagram::{DecisionDiagram, NodeRef};
use crate::labeling::Label;
use crate::literal::Literal;
use crate::xbar_error::XbarError;

/// Row/column index of every node on each axis, in node order.
struct Placement {
    horizontal: Vec<Option<usize>>,
    vertical: Vec<Option<usize>>,
    rows: usize,
    columns: usize,
}

impl Placement {
    fn new(labels: &[Label]) -> Self {
        let mut horizontal = vec![None; labels.len()];
        let mut vertical = vec![None; labels.len()];
        let (mut rows, mut columns) = (0, 0);
        for (node, label) in labels.iter().enumerate() {
            if label.is_horizontal() {
                horizontal[node] = Some(rows);
                rows += 1;
            }
            if label.is_vertical() {
                vertical[node] = Some(columns);
                columns += 1;
            }
        }
        Self {
            horizontal,
            vertical,
            rows,
            columns,
        }
    }

    fn is_both(&self, node: NodeRef) -> bool {
        self.horizontal[node.id].is_some() && self.vertical[node.id].is_some()
    }

    /// The cell joining `row_node`'s row and `column_node`'s column.
    fn cell(&self, row_node: NodeRef, column_node: NodeRef) -> Result<(usize, usize), XbarError> {
        match (self.horizontal[row_node.id], self.vertical[column_node.id]) {
            (Some(r), Some(c)) => Ok((r, c)),
            _ => Err(XbarError::Unsupported(format!(
                "labeling places nodes {} and {} on the same axis",
                row_node.id, column_node.id
            ))),
        }
    }
}

pub fn map_compact2d(
    diagram: &DecisionDiagram,
    labels: &[Label],
    io_constraints: bool,
) -> Result<Crossbar, XbarError> {
    if labels.len() != diagram.node_count() {
        return Err(XbarError::Unsupported(format!(
            "labeling covers {} nodes but diagram '{}' has {}",
            labels.len(),
            diagram.name,
            diagram.node_count()
        )));
    }
    let placement = Placement::new(labels);
    log::debug!(
        "compact2d '{}': {} rows, {} columns",
        diagram.name,
        placement.rows,
        placement.columns
    );
    let mut crossbar = Crossbar::new(placement.rows, placement.columns, 1).with_name(&diagram.name);

    for edge in diagram.edges() {
        let (a, b) = (edge.source, edge.target);
        let (r, c) = if placement.is_both(a) {
            let (ar, ac) = placement.cell(a, a)?;
            crossbar.set(ar, ac, Literal::on())?;
            if placement.horizontal[b.id].is_some() {
                placement.cell(b, a)?
            } else {
                placement.cell(a, b)?
            }
        } else if placement.is_both(b) {
            let (br, bc) = placement.cell(b, b)?;
            crossbar.set(br, bc, Literal::on())?;
            if placement.horizontal[a.id].is_some() {
                placement.cell(a, b)?
            } else {
                placement.cell(b, a)?
            }
        } else if placement.horizontal[a.id].is_some() {
            placement.cell(a, b)?
        } else {
            placement.cell(b, a)?
        };
        crossbar.set(r, c, edge.literal.clone())?;
    }

    for node in diagram.node_refs() {
        let data = diagram.node(node);
        if !data.root && !data.terminal {
            continue;
        }
        // With io constraints every root and terminal owns a row. Otherwise
        // prefer its row and fall back to its column on nanowire layer 1.
        if io_constraints && placement.horizontal[node.id].is_none() {
            log::warn!(
                "compact2d '{}': io-constrained node {} has no row; using its column",
                diagram.name,
                node.id
            );
        }
        let rail = match (placement.horizontal[node.id], placement.vertical[node.id]) {
            (Some(r), _) => (0, r),
            (None, Some(c)) => (1, c),
            (None, None) => continue,
        };
        if data.terminal {
            crossbar.set_input_rail(&data.variable, rail.0, rail.1)?;
        }
        if data.root {
            for output in &data.output_variables {
                crossbar.set_output_rail(output, rail.0, rail.1)?;
            }
        }
    }

    Ok(crossbar.flip_vertical())
}
