// SPDX-License-Identifier: Apache-2.0

//! Compression of single-layer memristor crossbars.
//!
//! Nanowires joined by "always conducting" cells carry the same potential
//! under every instance, so they can share one wire. Wires that carry an
//! input rail are never merged and their cells never join two wires:
//! evaluation disconnects them whenever another input is selected.

use std::collections::{BTreeMap, BTreeSet};

use crate::crossbar::{Crossbar, CrossbarKind, Memristor, Rail};
use crate::literal::{FALSE_ATOM, TRUE_ATOM};
use crate::xbar_error::XbarError;

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

/// The single cell equivalent to `cells` placed in parallel between the same
/// two wires, or `None` when that would need two different literals.
fn merge_cells<'a>(cells: impl Iterator<Item = &'a Memristor> + Clone) -> Option<Memristor> {
    if let Some(on) = cells.clone().find(|cell| cell.literal.atom == TRUE_ATOM) {
        return Some(on.clone());
    }
    let mut distinct = cells.filter(|cell| cell.literal.atom != FALSE_ATOM);
    let Some(first) = distinct.next() else {
        return Some(Memristor::default());
    };
    if distinct.all(|cell| cell == first) {
        Some(first.clone())
    } else {
        None
    }
}

impl Crossbar {
    fn check_compressible(&self) -> Result<(), XbarError> {
        if self.layers != 1 || matches!(self.kind, CrossbarKind::Selector { .. }) {
            return Err(XbarError::Unsupported(format!(
                "compression needs a single-layer memristor crossbar; '{}' is not one",
                self.name
            )));
        }
        Ok(())
    }

    /// Groups of nanowires connected through "always conducting" cells, each
    /// listed rows first (nanowire layer 0) then columns (layer 1). Groups are
    /// ordered by their first wire.
    pub fn equivalent_components(&self) -> Result<Vec<Vec<Rail>>, XbarError> {
        self.check_compressible()?;
        let rows = self.rows;
        let pinned: BTreeSet<Rail> = self.input_rails.values().copied().collect();
        let mut parent: Vec<usize> = (0..rows + self.columns).collect();
        for (_, r, c, cell) in self.cells() {
            if cell.literal.atom != TRUE_ATOM
                || pinned.contains(&Rail::new(0, r))
                || pinned.contains(&Rail::new(1, c))
            {
                continue;
            }
            let (a, b) = (find(&mut parent, r), find(&mut parent, rows + c));
            if a != b {
                parent[a.max(b)] = a.min(b);
            }
        }

        let mut components: BTreeMap<usize, Vec<Rail>> = BTreeMap::new();
        for wire in 0..parent.len() {
            let root = find(&mut parent, wire);
            let rail = if wire < rows {
                Rail::new(0, wire)
            } else {
                Rail::new(1, wire - rows)
            };
            components.entry(root).or_default().push(rail);
        }
        Ok(components.into_values().collect())
    }

    pub fn equivalent_rows(&self) -> Result<Vec<Vec<usize>>, XbarError> {
        self.equivalent_wires(0)
    }

    pub fn equivalent_columns(&self) -> Result<Vec<Vec<usize>>, XbarError> {
        self.equivalent_wires(1)
    }

    fn equivalent_wires(&self, layer: usize) -> Result<Vec<Vec<usize>>, XbarError> {
        Ok(self
            .equivalent_components()?
            .into_iter()
            .map(|component| {
                component
                    .into_iter()
                    .filter(|rail| rail.layer == layer)
                    .map(|rail| rail.index)
                    .collect::<Vec<usize>>()
            })
            .filter(|wires| !wires.is_empty())
            .collect())
    }

    fn rows_mergeable(&self, bin: &[usize], row: usize) -> bool {
        (0..self.columns).all(|c| {
            let cells = bin.iter().chain(std::iter::once(&row)).map(|&r| &self.matrix[0][r][c]);
            merge_cells(cells).is_some()
        })
    }

    /// Merges equivalent rows. A row joins the first earlier row of its group
    /// it shares no conflicting literal with.
    fn merge_equivalent_rows(&self) -> Result<Crossbar, XbarError> {
        let mut bins: Vec<Vec<usize>> = Vec::new();
        for group in self.equivalent_rows()? {
            let mut group_bins: Vec<Vec<usize>> = Vec::new();
            for row in group {
                match group_bins
                    .iter()
                    .position(|bin| self.rows_mergeable(bin, row))
                {
                    Some(i) => group_bins[i].push(row),
                    None => group_bins.push(vec![row]),
                }
            }
            bins.extend(group_bins);
        }
        bins.sort_by_key(|bin| bin[0]);

        let mut new_index = vec![0; self.rows];
        let mut merged = Crossbar::new(bins.len(), self.columns, 1).with_name(&self.name);
        for (i, bin) in bins.iter().enumerate() {
            for &row in bin {
                new_index[row] = i;
            }
            for c in 0..self.columns {
                if let Some(cell) = merge_cells(bin.iter().map(|&r| &self.matrix[0][r][c])) {
                    merged.matrix[0][i][c] = cell;
                }
            }
        }
        merged.input_rails = self.input_rails.clone();
        merged.output_rails = self.output_rails.clone();
        merged.remap_rails(|rail| {
            if rail.is_row_wire() {
                Rail::new(rail.layer, new_index[rail.index])
            } else {
                rail
            }
        });
        Ok(merged)
    }

    /// Merges equivalent rows, then equivalent columns of the result. The
    /// compressed crossbar evaluates exactly like the original for every
    /// instance and input rail.
    pub fn compress(&self) -> Result<Crossbar, XbarError> {
        self.check_compressible()?;
        let compressed = self
            .merge_equivalent_rows()?
            .transpose()?
            .merge_equivalent_rows()?
            .transpose()?;
        log::debug!(
            "compressed '{}' from {}x{} to {}x{}",
            self.name,
            self.rows,
            self.columns,
            compressed.rows,
            compressed.columns
        );
        Ok(compressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::test_utils::all_instances;
    use pretty_assertions::assert_eq;

    fn assert_same_function(a: &Crossbar, b: &Crossbar, atoms: &[&str]) {
        for input in a.input_rails().keys() {
            for instance in all_instances(atoms) {
                assert_eq!(
                    a.evaluate(&instance, input).unwrap(),
                    b.evaluate(&instance, input).unwrap(),
                    "input {} on {:?}",
                    input,
                    instance
                );
            }
        }
    }

    /// f = a & b with rows 1 and 2 tied together through columns 0 and 1:
    ///   row 0 (f) --a-- col 0 ==1== row 1 ==1== col 1 ==1== row 2 --b-- col 2 ==1== row 3 (input)
    fn tied() -> Crossbar {
        let mut xbar = Crossbar::new(4, 3, 1).with_name("tied");
        xbar.set(0, 0, Literal::new("a", true)).unwrap();
        xbar.set(1, 0, Literal::on()).unwrap();
        xbar.set(1, 1, Literal::on()).unwrap();
        xbar.set(2, 1, Literal::on()).unwrap();
        xbar.set(2, 2, Literal::new("b", true)).unwrap();
        xbar.set(3, 2, Literal::on()).unwrap();
        xbar.set_output_rail("f", 0, 0).unwrap();
        xbar.set_input_rail("1", 0, 3).unwrap();
        xbar
    }

    #[test]
    fn test_equivalent_rows_and_columns() {
        let xbar = tied();
        assert_eq!(xbar.equivalent_rows().unwrap(), vec![vec![0], vec![1, 2], vec![3]]);
        assert_eq!(xbar.equivalent_columns().unwrap(), vec![vec![0, 1], vec![2]]);
        assert_eq!(
            xbar.equivalent_components().unwrap()[1],
            vec![Rail::new(0, 1), Rail::new(0, 2), Rail::new(1, 0), Rail::new(1, 1)]
        );
    }

    #[test]
    fn test_compress_merges_tied_wires() {
        let xbar = tied();
        let compressed = xbar.compress().unwrap();
        assert_eq!((compressed.rows(), compressed.columns()), (3, 2));
        assert_eq!(compressed.get(0, 0).unwrap(), &Literal::new("a", true));
        assert_eq!(compressed.get(1, 0).unwrap(), &Literal::on());
        assert_eq!(compressed.get(1, 1).unwrap(), &Literal::new("b", true));
        assert_eq!(compressed.get(2, 1).unwrap(), &Literal::on());
        assert_eq!(compressed.input_rail("1"), Some(Rail::new(0, 2)));
        assert_same_function(&xbar, &compressed, &["a", "b"]);
        assert_eq!(compressed.compress().unwrap(), compressed);
    }

    #[test]
    fn test_conflicting_literals_stay_on_separate_wires() {
        // f = a | b: rows 0 and 1 are tied through column 0 but read
        // different literals on column 1.
        let mut xbar = Crossbar::new(3, 2, 1);
        xbar.set(0, 0, Literal::on()).unwrap();
        xbar.set(1, 0, Literal::on()).unwrap();
        xbar.set(0, 1, Literal::new("a", true)).unwrap();
        xbar.set(1, 1, Literal::new("b", true)).unwrap();
        xbar.set(2, 1, Literal::on()).unwrap();
        xbar.set_output_rail("f", 0, 0).unwrap();
        xbar.set_input_rail("1", 0, 2).unwrap();
        let compressed = xbar.compress().unwrap();
        assert_eq!(compressed, xbar);
        assert_same_function(&xbar, &compressed, &["a", "b"]);
    }

    #[test]
    fn test_input_rail_wires_are_never_merged() {
        // Rows 0 and 1 hold the "1" and "0" inputs and are tied through
        // column 0; evaluating one input disconnects the other's row.
        let mut xbar = Crossbar::new(3, 1, 1);
        xbar.set(0, 0, Literal::on()).unwrap();
        xbar.set(1, 0, Literal::on()).unwrap();
        xbar.set(2, 0, Literal::new("a", true)).unwrap();
        xbar.set_input_rail("1", 0, 0).unwrap();
        xbar.set_input_rail("0", 0, 1).unwrap();
        xbar.set_output_rail("f", 0, 2).unwrap();
        let compressed = xbar.compress().unwrap();
        assert_eq!(compressed.rows(), 3);
        assert_same_function(&xbar, &compressed, &["a"]);
    }

    #[test]
    fn test_layered_and_selector_crossbars_are_unsupported() {
        assert!(matches!(
            Crossbar::new(2, 2, 2).compress(),
            Err(XbarError::Unsupported(_))
        ));
        assert!(matches!(
            Crossbar::new_selector(2, 2).equivalent_rows(),
            Err(XbarError::Unsupported(_))
        ));
    }
}
