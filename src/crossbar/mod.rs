// SPDX-License-Identifier: Apache-2.0

//! Crossbar model: a grid of memristor cells (optionally stacked into several
//! memristor layers) with named input and output rails.
//!
//! Nanowire layer `l` carries row wires when `l` is even and column wires when
//! `l` is odd. Memristor layer `m` sits between nanowire layers `m` and `m+1`.

pub mod compress;
pub mod eval;
pub mod text;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::literal::{Literal, is_token_atom};
use crate::xbar_error::XbarError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Memristor {
    pub literal: Literal,
    /// A stuck cell keeps its programmed literal through instantiation.
    pub stuck_at_fault: bool,
}

impl Default for Memristor {
    fn default() -> Self {
        Self {
            literal: Literal::off(),
            stuck_at_fault: false,
        }
    }
}

/// A nanowire: `(nanowire layer, index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Rail {
    pub layer: usize,
    pub index: usize,
}

impl Rail {
    pub fn new(layer: usize, index: usize) -> Self {
        Self { layer, index }
    }

    pub fn is_row_wire(&self) -> bool {
        self.layer % 2 == 0
    }
}

impl std::fmt::Display for Rail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}_{}", self.layer, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossbarKind {
    Memristor,
    /// One selector literal per column; a column whose selector is false under
    /// an instance does not conduct at all.
    Selector { selectorlines: Vec<Literal> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossbar {
    pub name: String,
    rows: usize,
    columns: usize,
    layers: usize,
    /// Indexed `[layer][row][column]`.
    matrix: Vec<Vec<Vec<Memristor>>>,
    input_rails: BTreeMap<String, Rail>,
    output_rails: BTreeMap<String, Rail>,
    kind: CrossbarKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossbarStats {
    pub kind: &'static str,
    pub rows: usize,
    pub columns: usize,
    pub layers: usize,
    pub semiperimeter: usize,
    pub area: usize,
    pub volume: usize,
    pub input_rails: usize,
    pub output_rails: usize,
    pub literals: usize,
    pub on: usize,
    pub off: usize,
}

impl Crossbar {
    /// Creates a memristor crossbar with every cell "never conducting".
    pub fn new(rows: usize, columns: usize, layers: usize) -> Self {
        Self {
            name: "xbar".to_string(),
            rows,
            columns,
            layers,
            matrix: vec![vec![vec![Memristor::default(); columns]; rows]; layers],
            input_rails: BTreeMap::new(),
            output_rails: BTreeMap::new(),
            kind: CrossbarKind::Memristor,
        }
    }

    /// Creates a single-layer selector crossbar; every selectorline starts
    /// "always conducting".
    pub fn new_selector(rows: usize, columns: usize) -> Self {
        Self {
            kind: CrossbarKind::Selector {
                selectorlines: vec![Literal::on(); columns],
            },
            ..Self::new(rows, columns, 1)
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn memristor_layers(&self) -> usize {
        self.layers
    }

    pub fn nanowire_layers(&self) -> usize {
        self.layers + 1
    }

    pub fn kind(&self) -> &CrossbarKind {
        &self.kind
    }

    pub fn is_selector(&self) -> bool {
        matches!(self.kind, CrossbarKind::Selector { .. })
    }

    pub fn selectorlines(&self) -> Option<&[Literal]> {
        match &self.kind {
            CrossbarKind::Memristor => None,
            CrossbarKind::Selector { selectorlines } => Some(selectorlines),
        }
    }

    pub fn semiperimeter(&self) -> usize {
        self.rows + self.columns
    }

    pub fn area(&self) -> usize {
        self.rows * self.columns
    }

    pub fn volume(&self) -> usize {
        self.area() * self.layers
    }

    /// Number of parallel wires on nanowire layer `layer`.
    pub fn nanowire_count(&self, layer: usize) -> usize {
        if layer % 2 == 0 {
            self.rows
        } else {
            self.columns
        }
    }

    fn check_cell(&self, layer: usize, row: usize, column: usize) -> Result<(), XbarError> {
        let checks = [
            ("memristor layer", layer, self.layers),
            ("row", row, self.rows),
            ("column", column, self.columns),
        ];
        for (what, index, bound) in checks {
            if index >= bound {
                return Err(XbarError::IndexOutOfRange { what, index, bound });
            }
        }
        Ok(())
    }

    fn check_rail(&self, rail: Rail) -> Result<(), XbarError> {
        if rail.layer >= self.nanowire_layers() {
            return Err(XbarError::IndexOutOfRange {
                what: "nanowire layer",
                index: rail.layer,
                bound: self.nanowire_layers(),
            });
        }
        let bound = self.nanowire_count(rail.layer);
        if rail.index >= bound {
            return Err(XbarError::IndexOutOfRange {
                what: "nanowire",
                index: rail.index,
                bound,
            });
        }
        Ok(())
    }

    /// Cell and selector literals must be writable in the text format.
    fn check_literal(literal: &Literal) -> Result<(), XbarError> {
        if literal.is_constant() || is_token_atom(&literal.atom) {
            Ok(())
        } else {
            Err(XbarError::MalformedRecord(format!(
                "atom '{}' cannot be written as a crossbar token",
                literal.atom
            )))
        }
    }

    /// Programs the cell at `(row, column)` of memristor layer 0.
    pub fn set(&mut self, row: usize, column: usize, literal: Literal) -> Result<(), XbarError> {
        self.set_cell(0, row, column, literal, false)
    }

    pub fn set_cell(
        &mut self,
        layer: usize,
        row: usize,
        column: usize,
        literal: Literal,
        stuck_at_fault: bool,
    ) -> Result<(), XbarError> {
        self.check_cell(layer, row, column)?;
        Self::check_literal(&literal)?;
        self.matrix[layer][row][column] = Memristor {
            literal,
            stuck_at_fault,
        };
        Ok(())
    }

    pub fn get(&self, row: usize, column: usize) -> Result<&Literal, XbarError> {
        Ok(&self.get_cell(0, row, column)?.literal)
    }

    pub fn get_cell(&self, layer: usize, row: usize, column: usize) -> Result<&Memristor, XbarError> {
        self.check_cell(layer, row, column)?;
        Ok(&self.matrix[layer][row][column])
    }

    pub fn set_selectorline(&mut self, column: usize, literal: Literal) -> Result<(), XbarError> {
        let columns = self.columns;
        match &mut self.kind {
            CrossbarKind::Memristor => Err(XbarError::Unsupported(
                "memristor crossbars have no selectorlines".to_string(),
            )),
            CrossbarKind::Selector { selectorlines } => {
                if column >= columns {
                    return Err(XbarError::IndexOutOfRange {
                        what: "selectorline",
                        index: column,
                        bound: columns,
                    });
                }
                Self::check_literal(&literal)?;
                selectorlines[column] = literal;
                Ok(())
            }
        }
    }

    pub fn set_input_rail(&mut self, name: &str, layer: usize, index: usize) -> Result<(), XbarError> {
        let rail = Rail::new(layer, index);
        self.check_rail(rail)?;
        self.input_rails.insert(name.to_string(), rail);
        Ok(())
    }

    pub fn set_output_rail(&mut self, name: &str, layer: usize, index: usize) -> Result<(), XbarError> {
        let rail = Rail::new(layer, index);
        self.check_rail(rail)?;
        self.output_rails.insert(name.to_string(), rail);
        Ok(())
    }

    pub fn input_rail(&self, name: &str) -> Option<Rail> {
        self.input_rails.get(name).copied()
    }

    pub fn output_rail(&self, name: &str) -> Option<Rail> {
        self.output_rails.get(name).copied()
    }

    pub fn input_rails(&self) -> &BTreeMap<String, Rail> {
        &self.input_rails
    }

    pub fn output_rails(&self) -> &BTreeMap<String, Rail> {
        &self.output_rails
    }

    /// Iterates `(layer, row, column, cell)` in layer-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, usize, &Memristor)> + '_ {
        self.matrix.iter().enumerate().flat_map(|(l, layer)| {
            layer.iter().enumerate().flat_map(move |(r, row)| {
                row.iter().enumerate().map(move |(c, cell)| (l, r, c, cell))
            })
        })
    }

    /// All `(layer, row, column)` positions holding `literal`.
    pub fn find(&self, literal: &Literal) -> BTreeSet<(usize, usize, usize)> {
        self.cells()
            .filter(|(_, _, _, cell)| cell.literal == *literal)
            .map(|(l, r, c, _)| (l, r, c))
            .collect()
    }

    /// Atoms this crossbar reads: non-constant cell literals plus, for selector
    /// crossbars, non-constant selectorlines.
    pub fn input_variables(&self) -> BTreeSet<String> {
        let mut variables: BTreeSet<String> = self
            .cells()
            .filter(|(_, _, _, cell)| !cell.literal.is_constant())
            .map(|(_, _, _, cell)| cell.literal.atom.clone())
            .collect();
        if let Some(selectorlines) = self.selectorlines() {
            variables.extend(
                selectorlines
                    .iter()
                    .filter(|lit| !lit.is_constant())
                    .map(|lit| lit.atom.clone()),
            );
        }
        variables
    }

    pub fn output_variables(&self) -> BTreeSet<String> {
        self.output_rails.keys().cloned().collect()
    }

    pub fn stats(&self) -> CrossbarStats {
        let mut literals = 0;
        let mut on = 0;
        let mut off = 0;
        for (_, _, _, cell) in self.cells() {
            if cell.literal.is_on() {
                on += 1;
            } else if cell.literal.is_off() {
                off += 1;
            } else if !cell.literal.is_constant() {
                literals += 1;
            }
        }
        CrossbarStats {
            kind: if self.is_selector() { "selector" } else { "memristor" },
            rows: self.rows,
            columns: self.columns,
            layers: self.layers,
            semiperimeter: self.semiperimeter(),
            area: self.area(),
            volume: self.volume(),
            input_rails: self.input_rails.len(),
            output_rails: self.output_rails.len(),
            literals,
            on,
            off,
        }
    }

    fn remap_rails(&mut self, f: impl Fn(Rail) -> Rail) {
        for rail in self.input_rails.values_mut() {
            *rail = f(*rail);
        }
        for rail in self.output_rails.values_mut() {
            *rail = f(*rail);
        }
    }

    /// Reverses the row order in every memristor layer and mirrors rails on
    /// row wires.
    #[must_use]
    pub fn flip_horizontal(&self) -> Crossbar {
        let mut flipped = self.clone();
        for layer in flipped.matrix.iter_mut() {
            layer.reverse();
        }
        let rows = self.rows;
        flipped.remap_rails(|rail| {
            if rail.is_row_wire() {
                Rail::new(rail.layer, rows - 1 - rail.index)
            } else {
                rail
            }
        });
        flipped
    }

    /// Reverses the column order in every memristor layer and mirrors rails on
    /// column wires.
    #[must_use]
    pub fn flip_vertical(&self) -> Crossbar {
        let mut flipped = self.clone();
        for layer in flipped.matrix.iter_mut() {
            for row in layer.iter_mut() {
                row.reverse();
            }
        }
        if let CrossbarKind::Selector { selectorlines } = &mut flipped.kind {
            selectorlines.reverse();
        }
        let columns = self.columns;
        flipped.remap_rails(|rail| {
            if rail.is_row_wire() {
                rail
            } else {
                Rail::new(rail.layer, columns - 1 - rail.index)
            }
        });
        flipped
    }

    /// Partial assignment of `atom`: every non-stuck cell and every
    /// selectorline over `atom` becomes a constant.
    #[must_use]
    pub fn fix(&self, atom: &str, value: bool) -> Crossbar {
        let mut fixed = self.clone();
        for layer in fixed.matrix.iter_mut() {
            for row in layer.iter_mut() {
                for cell in row.iter_mut().filter(|cell| !cell.stuck_at_fault) {
                    cell.literal = cell.literal.fix(atom, value);
                }
            }
        }
        if let CrossbarKind::Selector { selectorlines } = &mut fixed.kind {
            for selector in selectorlines.iter_mut() {
                *selector = selector.fix(atom, value);
            }
        }
        fixed
    }

    /// Swaps rows and columns. Rails on nanowire layer 0 move to layer 1 and
    /// vice versa.
    pub fn transpose(&self) -> Result<Crossbar, XbarError> {
        if self.layers != 1 {
            return Err(XbarError::Unsupported(format!(
                "transpose needs a single memristor layer; crossbar '{}' has {}",
                self.name, self.layers
            )));
        }
        if self.is_selector() {
            return Err(XbarError::Unsupported(
                "transpose of a selector crossbar".to_string(),
            ));
        }
        let mut transposed = Crossbar::new(self.columns, self.rows, 1).with_name(&self.name);
        for (_, r, c, cell) in self.cells() {
            transposed.matrix[0][c][r] = cell.clone();
        }
        transposed.input_rails = self.input_rails.clone();
        transposed.output_rails = self.output_rails.clone();
        transposed.remap_rails(|rail| Rail::new(1 - rail.layer, rail.index));
        Ok(transposed)
    }
}
