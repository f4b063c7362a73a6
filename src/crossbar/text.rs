// SPDX-License-Identifier: Apache-2.0

//! Line-oriented text format for crossbars:
//!
//! ```text
//! .model NAME
//! .type memristor|selector
//! .inputs a b
//! .outputs f
//! .rows 2
//! .columns 1
//! .layers 2            (only when there is more than one memristor layer)
//! .i NAME [LAYER] INDEX
//! .o NAME [LAYER] INDEX
//! .s INDEX LITERAL     (selector crossbars only)
//! .xbar
//! <rows lines of tab-separated tokens per memristor layer>
//! .end
//! ```
//!
//! Grid tokens are `0`, `1`, `atom` or `~atom`; a leading `!` marks a
//! stuck-at-fault cell. The reserved atoms are written as `0`/`1`, so they
//! read back with their canonical polarity.

use crate::crossbar::{Crossbar, CrossbarKind};
use crate::literal::Literal;
use crate::xbar_error::XbarError;

fn rail_line(directive: &str, name: &str, layer: usize, index: usize) -> String {
    if layer == 0 {
        format!("{} {} {}\n", directive, name, index)
    } else {
        format!("{} {} {} {}\n", directive, name, layer, index)
    }
}

fn parse_usize(token: &str, line: &str) -> Result<usize, XbarError> {
    token.parse::<usize>().map_err(|_| {
        XbarError::MalformedRecord(format!("expected a number, got '{}' in '{}'", token, line))
    })
}

/// Parses `.i`/`.o` operands: `NAME INDEX` or `NAME LAYER INDEX`.
fn parse_rail(tokens: &[&str], line: &str) -> Result<(String, usize, usize), XbarError> {
    match tokens {
        [_, name, index] => Ok((name.to_string(), 0, parse_usize(index, line)?)),
        [_, name, layer, index] => Ok((
            name.to_string(),
            parse_usize(layer, line)?,
            parse_usize(index, line)?,
        )),
        _ => Err(XbarError::MalformedRecord(format!(
            "rail record needs 2 or 3 operands: '{}'",
            line
        ))),
    }
}

impl Crossbar {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(".model {}\n", self.name));
        let kind = match self.kind() {
            CrossbarKind::Memristor => "memristor",
            CrossbarKind::Selector { .. } => "selector",
        };
        out.push_str(&format!(".type {}\n", kind));
        out.push_str(".inputs");
        for variable in self.input_variables() {
            out.push(' ');
            out.push_str(&variable);
        }
        out.push('\n');
        out.push_str(".outputs");
        for variable in self.output_variables() {
            out.push(' ');
            out.push_str(&variable);
        }
        out.push('\n');
        out.push_str(&format!(".rows {}\n", self.rows()));
        out.push_str(&format!(".columns {}\n", self.columns()));
        if self.memristor_layers() > 1 {
            out.push_str(&format!(".layers {}\n", self.memristor_layers()));
        }
        for (name, rail) in self.input_rails() {
            out.push_str(&rail_line(".i", name, rail.layer, rail.index));
        }
        for (name, rail) in self.output_rails() {
            out.push_str(&rail_line(".o", name, rail.layer, rail.index));
        }
        if let Some(selectorlines) = self.selectorlines() {
            for (index, literal) in selectorlines.iter().enumerate() {
                out.push_str(&format!(".s {} {}\n", index, literal.to_token()));
            }
        }
        out.push_str(".xbar\n");
        for layer in &self.matrix {
            for row in layer {
                let tokens: Vec<String> = row
                    .iter()
                    .map(|cell| {
                        if cell.stuck_at_fault {
                            format!("!{}", cell.literal.to_token())
                        } else {
                            cell.literal.to_token()
                        }
                    })
                    .collect();
                if !tokens.is_empty() {
                    out.push_str(&tokens.join("\t"));
                    out.push('\n');
                }
            }
        }
        out.push_str(".end\n");
        out
    }

    /// Parses a single crossbar block. Trailing content after `.end` is
    /// rejected.
    pub fn from_text(text: &str) -> Result<Crossbar, XbarError> {
        let lines: Vec<&str> = text.lines().collect();
        let (crossbar, consumed) = parse_crossbar_block(&lines)?;
        if let Some(extra) = lines[consumed..].iter().find(|l| !l.trim().is_empty()) {
            return Err(XbarError::MalformedRecord(format!(
                "unexpected content after .end: '{}'",
                extra
            )));
        }
        Ok(crossbar)
    }
}

/// Parses one `.model ... .end` block from the front of `lines`. Returns the
/// crossbar and the number of lines consumed.
pub(crate) fn parse_crossbar_block(lines: &[&str]) -> Result<(Crossbar, usize), XbarError> {
    let mut name = "xbar".to_string();
    let mut selector = false;
    let mut rows: Option<usize> = None;
    let mut columns: Option<usize> = None;
    let mut layers = 1;
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut selectorlines = Vec::new();
    let mut grid: Vec<Vec<(Literal, bool)>> = Vec::new();
    let mut in_grid = false;
    let mut end = None;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line == ".end" {
            end = Some(i + 1);
            break;
        }
        if in_grid {
            let row = line
                .split_whitespace()
                .map(|token| match token.strip_prefix('!') {
                    Some(rest) => Ok((Literal::from_token(rest)?, true)),
                    None => Ok((Literal::from_token(token)?, false)),
                })
                .collect::<Result<Vec<_>, XbarError>>()?;
            grid.push(row);
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens[0] {
            ".model" => match tokens.as_slice() {
                [_, n] => name = n.to_string(),
                _ => {
                    return Err(XbarError::MalformedRecord(format!(
                        "model record needs one name: '{}'",
                        line
                    )));
                }
            },
            ".type" => match tokens.as_slice() {
                [_, "memristor"] => selector = false,
                [_, "selector"] => selector = true,
                _ => {
                    return Err(XbarError::MalformedRecord(format!(
                        "unknown crossbar type: '{}'",
                        line
                    )));
                }
            },
            // Informational; derived from the grid and rails on output.
            ".inputs" | ".outputs" => {}
            ".rows" | ".columns" | ".layers" => {
                let [_, value] = tokens.as_slice() else {
                    return Err(XbarError::MalformedRecord(format!(
                        "dimension record needs one value: '{}'",
                        line
                    )));
                };
                let value = parse_usize(value, line)?;
                match tokens[0] {
                    ".rows" => rows = Some(value),
                    ".columns" => columns = Some(value),
                    _ => layers = value,
                }
            }
            ".i" => inputs.push(parse_rail(&tokens, line)?),
            ".o" => outputs.push(parse_rail(&tokens, line)?),
            ".s" => {
                let [_, index, literal] = tokens.as_slice() else {
                    return Err(XbarError::MalformedRecord(format!(
                        "selectorline record needs an index and a literal: '{}'",
                        line
                    )));
                };
                selectorlines.push((parse_usize(index, line)?, Literal::from_token(literal)?));
            }
            ".xbar" => in_grid = true,
            other => {
                return Err(XbarError::MalformedRecord(format!(
                    "unknown directive '{}'",
                    other
                )));
            }
        }
    }

    let Some(consumed) = end else {
        return Err(XbarError::MalformedRecord("missing .end".to_string()));
    };
    let (Some(rows), Some(columns)) = (rows, columns) else {
        return Err(XbarError::MalformedRecord(
            "crossbar needs .rows and .columns".to_string(),
        ));
    };
    if layers == 0 || (selector && layers != 1) {
        return Err(XbarError::MalformedRecord(format!(
            "invalid layer count {}",
            layers
        )));
    }

    let expected_lines = if columns == 0 { 0 } else { rows * layers };
    if grid.len() != expected_lines || grid.iter().any(|row| row.len() != columns) {
        return Err(XbarError::MalformedRecord(format!(
            "grid shape does not match {} rows x {} columns x {} layers",
            rows, columns, layers
        )));
    }

    let mut crossbar = if selector {
        Crossbar::new_selector(rows, columns)
    } else {
        Crossbar::new(rows, columns, layers)
    }
    .with_name(&name);
    for (i, row) in grid.into_iter().enumerate() {
        let (layer, r) = (i / rows, i % rows);
        for (c, (literal, stuck_at_fault)) in row.into_iter().enumerate() {
            crossbar.set_cell(layer, r, c, literal, stuck_at_fault)?;
        }
    }
    for (name, layer, index) in inputs {
        crossbar.set_input_rail(&name, layer, index)?;
    }
    for (name, layer, index) in outputs {
        crossbar.set_output_rail(&name, layer, index)?;
    }
    if !selectorlines.is_empty() && !selector {
        return Err(XbarError::MalformedRecord(
            "selectorline records on a memristor crossbar".to_string(),
        ));
    }
    for (index, literal) in selectorlines {
        crossbar.set_selectorline(index, literal)?;
    }
    Ok((crossbar, consumed))
}
