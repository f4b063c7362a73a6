// SPDX-License-Identifier: Apache-2.0

//! Topologies: several crossbars wired together rail to rail.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::Serialize;

use crate::crossbar::text::parse_crossbar_block;
use crate::crossbar::{Crossbar, Rail};
use crate::xbar_error::XbarError;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct XbarRef {
    pub id: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interconnect {
    pub source: XbarRef,
    pub source_rail: Rail,
    pub target: XbarRef,
    pub target_rail: Rail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyStats {
    pub crossbars: usize,
    pub interconnects: usize,
    pub critical_path_length: usize,
    pub semiperimeter: usize,
    pub area: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub name: String,
    crossbars: Vec<Crossbar>,
    interconnects: Vec<Interconnect>,
}

impl Topology {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            crossbars: Vec::new(),
            interconnects: Vec::new(),
        }
    }

    pub fn add_crossbar(&mut self, crossbar: Crossbar) -> XbarRef {
        self.crossbars.push(crossbar);
        XbarRef {
            id: self.crossbars.len() - 1,
        }
    }

    pub fn add_interconnect(
        &mut self,
        source: XbarRef,
        source_rail: Rail,
        target: XbarRef,
        target_rail: Rail,
    ) -> Result<(), XbarError> {
        for (xbar, rail) in [(source, source_rail), (target, target_rail)] {
            let Some(crossbar) = self.crossbars.get(xbar.id) else {
                return Err(XbarError::IndexOutOfRange {
                    what: "crossbar",
                    index: xbar.id,
                    bound: self.crossbars.len(),
                });
            };
            if rail.layer >= crossbar.nanowire_layers() {
                return Err(XbarError::IndexOutOfRange {
                    what: "nanowire layer",
                    index: rail.layer,
                    bound: crossbar.nanowire_layers(),
                });
            }
            if rail.index >= crossbar.nanowire_count(rail.layer) {
                return Err(XbarError::IndexOutOfRange {
                    what: "nanowire",
                    index: rail.index,
                    bound: crossbar.nanowire_count(rail.layer),
                });
            }
        }
        self.interconnects.push(Interconnect {
            source,
            source_rail,
            target,
            target_rail,
        });
        Ok(())
    }

    pub fn crossbars(&self) -> &[Crossbar] {
        &self.crossbars
    }

    pub fn interconnects(&self) -> &[Interconnect] {
        &self.interconnects
    }

    pub fn input_variables(&self) -> BTreeSet<String> {
        self.crossbars
            .iter()
            .flat_map(|x| x.input_variables())
            .collect()
    }

    pub fn output_variables(&self) -> BTreeSet<String> {
        self.crossbars
            .iter()
            .flat_map(|x| x.output_variables())
            .collect()
    }

    /// Kahn's algorithm over the interconnect multigraph; ties resolved by
    /// crossbar order.
    pub fn topological_order(&self) -> Result<Vec<XbarRef>, XbarError> {
        let n = self.crossbars.len();
        let mut in_degree = vec![0usize; n];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for ic in &self.interconnects {
            in_degree[ic.target.id] += 1;
            successors[ic.source.id].push(ic.target.id);
        }
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(current) = queue.pop_front() {
            order.push(XbarRef { id: current });
            for &next in &successors[current] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }
        if order.len() != n {
            log::error!(
                "topology '{}' has a cycle: visited {} of {} crossbars",
                self.name,
                order.len(),
                n
            );
            return Err(XbarError::StructuralCycle {
                visited: order.len(),
                total: n,
            });
        }
        Ok(order)
    }

    /// Number of crossbars on the longest interconnect path.
    pub fn critical_path_length(&self) -> Result<usize, XbarError> {
        let order = self.topological_order()?;
        let mut longest = vec![1usize; self.crossbars.len()];
        for xbar in &order {
            for ic in self.interconnects.iter().filter(|ic| ic.source == *xbar) {
                longest[ic.target.id] = longest[ic.target.id].max(longest[xbar.id] + 1);
            }
        }
        Ok(longest.into_iter().max().unwrap_or(0))
    }

    pub fn stats(&self) -> Result<TopologyStats, XbarError> {
        Ok(TopologyStats {
            crossbars: self.crossbars.len(),
            interconnects: self.interconnects.len(),
            critical_path_length: self.critical_path_length()?,
            semiperimeter: self.crossbars.iter().map(|x| x.semiperimeter()).sum(),
            area: self.crossbars.iter().map(|x| x.area()).sum(),
        })
    }

    /// Evaluates crossbars in topological order. Each crossbar is evaluated
    /// once per input rail whose function is currently true, and results are
    /// merged so that a true value is never overwritten by false. Returns the
    /// instance extended with every computed function.
    pub fn evaluate(
        &self,
        instance: &HashMap<String, bool>,
        primary_input_function: &str,
    ) -> Result<BTreeMap<String, bool>, XbarError> {
        let mut evaluations: HashMap<String, bool> = instance.clone();
        evaluations.insert(primary_input_function.to_string(), true);

        for xbar in self.topological_order()? {
            let crossbar = &self.crossbars[xbar.id];
            for input_function in crossbar.input_rails().keys() {
                if evaluations.get(input_function) != Some(&true) {
                    continue;
                }
                let evaluation = crossbar.evaluate(&evaluations, input_function)?;
                for (name, value) in evaluation {
                    let merged = evaluations.entry(name).or_insert(false);
                    *merged = *merged || value;
                }
            }
        }
        Ok(evaluations.into_iter().collect())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(".model {}\n", self.name));
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
        out.push_str(".topo\n");
        for crossbar in &self.crossbars {
            out.push_str(&crossbar.to_text());
        }
        for ic in &self.interconnects {
            out.push_str(&format!(
                ".c {} {} {} {} {} {}\n",
                ic.source.id,
                ic.source_rail.layer,
                ic.source_rail.index,
                ic.target.id,
                ic.target_rail.layer,
                ic.target_rail.index
            ));
        }
        out.push_str(".end\n");
        out
    }

    pub fn from_text(text: &str) -> Result<Topology, XbarError> {
        let lines: Vec<&str> = text.lines().collect();
        let mut topology = Topology::new("topology");
        let mut in_body = false;
        let mut i = 0;
        let mut finished = false;
        while i < lines.len() {
            let line = lines[i].trim();
            if line.is_empty() {
                i += 1;
                continue;
            }
            if finished {
                return Err(XbarError::MalformedRecord(format!(
                    "unexpected content after .end: '{}'",
                    line
                )));
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match (in_body, tokens[0]) {
                (false, ".model") => {
                    let [_, name] = tokens.as_slice() else {
                        return Err(XbarError::MalformedRecord(format!(
                            "model record needs one name: '{}'",
                            line
                        )));
                    };
                    topology.name = name.to_string();
                }
                (false, ".inputs" | ".outputs") => {}
                (false, ".topo") => in_body = true,
                (true, ".model") => {
                    let (crossbar, consumed) = parse_crossbar_block(&lines[i..])?;
                    topology.add_crossbar(crossbar);
                    i += consumed;
                    continue;
                }
                (true, ".c") => {
                    let fields = tokens[1..]
                        .iter()
                        .map(|t| {
                            t.parse::<usize>().map_err(|_| {
                                XbarError::MalformedRecord(format!(
                                    "expected a number, got '{}' in '{}'",
                                    t, line
                                ))
                            })
                        })
                        .collect::<Result<Vec<usize>, _>>()?;
                    let [sx, sl, si, tx, tl, ti] = fields.as_slice() else {
                        return Err(XbarError::MalformedRecord(format!(
                            "interconnect record needs 6 fields: '{}'",
                            line
                        )));
                    };
                    topology.add_interconnect(
                        XbarRef { id: *sx },
                        Rail::new(*sl, *si),
                        XbarRef { id: *tx },
                        Rail::new(*tl, *ti),
                    )?;
                }
                (true, ".end") => finished = true,
                _ => {
                    return Err(XbarError::MalformedRecord(format!(
                        "unexpected record '{}'",
                        line
                    )));
                }
            }
            i += 1;
        }
        if !finished {
            return Err(XbarError::MalformedRecord(
                "topology is missing .topo or .end".to_string(),
            ));
        }
        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use maplit::hashmap;
    use pretty_assertions::assert_eq;

    /// g = a & b computed in two stages: the first crossbar produces t = a,
    /// the second reads t as a literal and produces g = t & b.
    fn two_stage() -> Topology {
        let mut first = Crossbar::new(2, 1, 1).with_name("first");
        first.set(0, 0, Literal::new("a", true)).unwrap();
        first.set(1, 0, Literal::on()).unwrap();
        first.set_output_rail("t", 0, 0).unwrap();
        first.set_input_rail("1", 0, 1).unwrap();

        let mut second = Crossbar::new(2, 1, 1).with_name("second");
        second.set(0, 0, Literal::new("t", true)).unwrap();
        second.set(1, 0, Literal::new("b", true)).unwrap();
        second.set_output_rail("g", 0, 0).unwrap();
        second.set_input_rail("1", 0, 1).unwrap();

        let mut topology = Topology::new("top");
        let x0 = topology.add_crossbar(first);
        let x1 = topology.add_crossbar(second);
        topology
            .add_interconnect(x0, Rail::new(0, 0), x1, Rail::new(1, 0))
            .unwrap();
        topology
    }

    #[test]
    fn test_evaluate_in_order() {
        let topology = two_stage();
        for (a, b) in [(false, false), (true, false), (false, true), (true, true)] {
            let instance = hashmap! { "a".to_string() => a, "b".to_string() => b };
            let got = topology.evaluate(&instance, "1").unwrap();
            assert_eq!(got["t"], a);
            assert_eq!(got["g"], a && b);
            assert_eq!(got["1"], true);
        }
    }

    #[test]
    fn test_true_wins_when_merging() {
        // Two crossbars both drive "f"; one conducts, the other does not.
        let mut on = Crossbar::new(1, 1, 1).with_name("on");
        on.set(0, 0, Literal::on()).unwrap();
        on.set_output_rail("f", 0, 0).unwrap();
        on.set_input_rail("1", 1, 0).unwrap();
        let mut off = on.clone().with_name("off");
        off.set(0, 0, Literal::off()).unwrap();

        let mut topology = Topology::new("merge");
        topology.add_crossbar(on);
        topology.add_crossbar(off);
        let got = topology.evaluate(&HashMap::new(), "1").unwrap();
        assert_eq!(got["f"], true);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut topology = two_stage();
        topology
            .add_interconnect(XbarRef { id: 1 }, Rail::new(0, 0), XbarRef { id: 0 }, Rail::new(0, 1))
            .unwrap();
        assert_eq!(
            topology.evaluate(&HashMap::new(), "1").unwrap_err(),
            XbarError::StructuralCycle { visited: 0, total: 2 }
        );
    }

    #[test]
    fn test_critical_path_and_stats() {
        let topology = two_stage();
        let stats = topology.stats().unwrap();
        assert_eq!(stats.critical_path_length, 2);
        assert_eq!(stats.crossbars, 2);
        assert_eq!(stats.interconnects, 1);
        assert_eq!(Topology::new("empty").critical_path_length().unwrap(), 0);
    }

    #[test]
    fn test_text_round_trip() {
        let topology = two_stage();
        let text = topology.to_text();
        assert!(text.contains(".c 0 0 0 1 1 0\n"));
        assert_eq!(Topology::from_text(&text).unwrap(), topology);
    }

    #[test]
    fn test_bad_interconnect() {
        let mut topology = two_stage();
        let err = topology
            .add_interconnect(XbarRef { id: 0 }, Rail::new(0, 0), XbarRef { id: 5 }, Rail::new(0, 0))
            .unwrap_err();
        assert!(matches!(err, XbarError::IndexOutOfRange { what: "crossbar", .. }));
        assert!(Topology::from_text(".model t\n.topo\n.c 0 0\n.end\n").is_err());
    }
}
