// SPDX-License-Identifier: Apache-2.0

//! Pattern sharing across a multi-output design.
//!
//! Sub-diagrams with the same structural hash are implemented once. The
//! scheduler levels the dependency graph so that no generation evaluates the
//! same pattern twice, fits the pattern classes into a hardware budget and
//! emits a load/evaluate schedule.

pub mod capacity;
pub mod schedule;
pub mod wl_hash;

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::Serialize;

use crate::diagram::{DecisionDiagram, DiagramTopology};
use crate::iso::capacity::{CapacityFit, PatternSummary, fit_all, fit_capacity, sort_patterns};
use crate::iso::schedule::{Schedule, emit_schedule};
use crate::iso::wl_hash::hash_all;
use crate::xbar_error::XbarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Idle,
    Discovering,
    Leveling,
    Fitting,
    Emitting,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IsoCost {
    pub rows: usize,
    pub cols: usize,
    pub semi: usize,
    pub area: usize,
    pub cycles: usize,
}

impl IsoCost {
    /// Cost of the given `(count, rows, cols)` classes with each class paid
    /// for `count` times when `shared` is false and once when it is true.
    fn of(patterns: &[PatternSummary], shared: bool, cycles: usize) -> Self {
        let mut cost = IsoCost {
            cycles,
            ..IsoCost::default()
        };
        for p in patterns {
            let copies = if shared { 1 } else { p.count };
            cost.rows += p.nodes * copies;
            cost.cols += p.edges * copies;
            cost.semi += (p.nodes + p.edges) * copies;
        }
        cost.area = cost.rows * cost.cols;
        cost
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsoReport {
    pub name: String,
    /// Pattern classes in fitting order.
    pub patterns: Vec<PatternSummary>,
    pub before: IsoCost,
    pub after: IsoCost,
    pub fit: CapacityFit,
    pub schedule: Schedule,
}

/// Number of generations that hold at least one name.
fn occupied(generations: &[Vec<String>]) -> usize {
    generations.iter().filter(|g| !g.is_empty()).count()
}

/// Drives the phases in order; each step refuses to run out of turn.
pub struct IsoScheduler<'a> {
    name: String,
    topology: &'a DiagramTopology,
    budget: Option<usize>,
    phase: Phase,
    hash_of: BTreeMap<String, String>,
    patterns: Vec<PatternSummary>,
    raw_generations: Vec<Vec<String>>,
    generations: Vec<Vec<String>>,
    fit: Option<CapacityFit>,
    schedule: Option<Schedule>,
}

impl<'a> IsoScheduler<'a> {
    pub fn new(name: &str, topology: &'a DiagramTopology, budget: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            topology,
            budget,
            phase: Phase::Idle,
            hash_of: BTreeMap::new(),
            patterns: Vec::new(),
            raw_generations: Vec::new(),
            generations: Vec::new(),
            fit: None,
            schedule: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Structural hash of every pattern-producing signal.
    pub fn hashes(&self) -> &BTreeMap<String, String> {
        &self.hash_of
    }

    /// Leveled generations, output first.
    pub fn generations(&self) -> &[Vec<String>] {
        &self.generations
    }

    fn enter(&mut self, from: Phase, to: Phase) -> Result<(), XbarError> {
        if self.phase != from {
            return Err(XbarError::Unsupported(format!(
                "cannot enter {:?} from {:?}",
                to, self.phase
            )));
        }
        log::debug!("iso '{}': {:?} -> {:?}", self.name, from, to);
        self.phase = to;
        Ok(())
    }

    pub fn discover(&mut self) -> Result<(), XbarError> {
        self.enter(Phase::Idle, Phase::Discovering)?;
        let topology = self.topology;
        let names: Vec<&String> = topology.diagrams.keys().collect();
        let diagrams: Vec<&DecisionDiagram> = topology.diagrams.values().collect();
        let hashes = hash_all(&diagrams);

        let mut class_index: HashMap<&str, usize> = HashMap::new();
        for ((name, diagram), hash) in names.iter().zip(&diagrams).zip(&hashes) {
            self.hash_of.insert((*name).clone(), hash.clone());
            match class_index.get(hash.as_str()) {
                Some(&i) => self.patterns[i].count += 1,
                None => {
                    class_index.insert(hash, self.patterns.len());
                    self.patterns.push(PatternSummary {
                        hash: hash.clone(),
                        count: 1,
                        nodes: diagram.node_count(),
                        edges: diagram.edge_count(),
                    });
                }
            }
        }
        log::info!(
            "iso '{}': {} sub-diagrams in {} pattern classes",
            self.name,
            names.len(),
            self.patterns.len()
        );
        Ok(())
    }

    /// Splits every generation so that each pattern appears at most once in
    /// it. Duplicates move into a new generation placed just before the one
    /// being scanned, which is then scanned in turn.
    pub fn level(&mut self) -> Result<(), XbarError> {
        self.enter(Phase::Discovering, Phase::Leveling)?;
        self.raw_generations = self
            .topology
            .output_first_generations()?
            .into_iter()
            .map(|generation| {
                generation
                    .into_iter()
                    .filter(|name| self.hash_of.contains_key(name))
                    .collect()
            })
            .collect();

        let mut worklist: VecDeque<Vec<String>> = self.raw_generations.iter().cloned().collect();
        while let Some(generation) = worklist.pop_front() {
            let mut by_hash: Vec<(&str, Vec<String>)> = Vec::new();
            for name in generation {
                let Some(hash) = self.hash_of.get(&name) else {
                    continue;
                };
                match by_hash.iter_mut().find(|(h, _)| *h == hash.as_str()) {
                    Some((_, names)) => names.push(name),
                    None => by_hash.push((hash.as_str(), vec![name])),
                }
            }
            let mut kept = Vec::with_capacity(by_hash.len());
            let mut pushed_down = Vec::new();
            for (_, names) in by_hash {
                let mut names = names.into_iter();
                kept.extend(names.next());
                pushed_down.extend(names);
            }
            self.generations.push(kept);
            if !pushed_down.is_empty() {
                worklist.push_front(pushed_down);
            }
        }
        log::info!(
            "iso '{}': {} generations leveled into {}",
            self.name,
            occupied(&self.raw_generations),
            occupied(&self.generations)
        );
        Ok(())
    }

    pub fn fit(&mut self) -> Result<(), XbarError> {
        self.enter(Phase::Leveling, Phase::Fitting)?;
        sort_patterns(&mut self.patterns);
        let fit = match self.budget {
            Some(budget) => fit_capacity(&self.patterns, budget)?,
            None => fit_all(&self.patterns),
        };
        self.fit = Some(fit);
        Ok(())
    }

    pub fn emit(&mut self) -> Result<(), XbarError> {
        self.enter(Phase::Fitting, Phase::Emitting)?;
        let fixed_count = self.fit.as_ref().map_or(0, |f| f.fixed);
        let fixed: Vec<String> = self.patterns[..fixed_count]
            .iter()
            .map(|p| p.hash.clone())
            .collect();
        let schedule = emit_schedule(&self.generations, &self.hash_of, &fixed);
        log::info!(
            "iso '{}': {} fixed patterns, {} cycles",
            self.name,
            fixed.len(),
            schedule.cycle_count()
        );
        self.schedule = Some(schedule);
        self.phase = Phase::Done;
        Ok(())
    }

    pub fn report(&self) -> Result<IsoReport, XbarError> {
        let (Phase::Done, Some(fit), Some(schedule)) = (self.phase, &self.fit, &self.schedule)
        else {
            return Err(XbarError::Unsupported(format!(
                "no report before Done (currently {:?})",
                self.phase
            )));
        };
        Ok(IsoReport {
            name: self.name.clone(),
            patterns: self.patterns.clone(),
            before: IsoCost::of(&self.patterns, false, occupied(&self.raw_generations)),
            after: IsoCost::of(&self.patterns, true, occupied(&self.generations)),
            fit: fit.clone(),
            schedule: schedule.clone(),
        })
    }

    pub fn run(mut self) -> Result<IsoReport, XbarError> {
        self.discover()?;
        self.level()?;
        self.fit()?;
        self.emit()?;
        self.report()
    }
}

/// Runs every phase of the scheduler on `topology`.
pub fn schedule_patterns(
    name: &str,
    topology: &DiagramTopology,
    budget: Option<usize>,
) -> Result<IsoReport, XbarError> {
    IsoScheduler::new(name, topology, budget).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iso::schedule::Instruction;
    use crate::test_utils::{bdd_and2, bdd_single_var};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    /// f = a & b, g = c & d, h = f: f and g share a pattern.
    fn shared_design() -> DiagramTopology {
        let mut diagrams = BTreeMap::new();
        diagrams.insert("f".to_string(), bdd_and2("f", "a", "b"));
        diagrams.insert("g".to_string(), bdd_and2("g", "c", "d"));
        diagrams.insert("h".to_string(), bdd_single_var("h", "f"));
        DiagramTopology::from_diagrams(diagrams)
    }

    #[test]
    fn test_identical_sub_diagrams_halve_the_cost() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut diagrams = BTreeMap::new();
        diagrams.insert("f".to_string(), bdd_and2("f", "a", "b"));
        diagrams.insert("g".to_string(), bdd_and2("g", "c", "d"));
        let topology = DiagramTopology::from_diagrams(diagrams);
        let report = schedule_patterns("pair", &topology, None).unwrap();
        assert_eq!(report.patterns.len(), 1);
        assert_eq!(report.patterns[0].count, 2);
        assert_eq!(report.after.rows * 2, report.before.rows);
        assert_eq!(report.after.cols * 2, report.before.cols);
        assert_eq!(report.after.semi * 2, report.before.semi);
        // f and g collide in one generation, so leveling adds one.
        assert_eq!((report.before.cycles, report.after.cycles), (1, 2));
    }

    #[test]
    fn test_leveling_separates_equal_hashes() {
        let topology = shared_design();
        let mut scheduler = IsoScheduler::new("shared", &topology, None);
        scheduler.discover().unwrap();
        scheduler.level().unwrap();
        for generation in scheduler.generations() {
            let hashes: BTreeSet<&String> =
                generation.iter().map(|n| &scheduler.hashes()[n]).collect();
            assert_eq!(hashes.len(), generation.len());
        }
        assert_eq!(
            scheduler.generations(),
            &[
                vec!["g".to_string(), "h".to_string()],
                vec!["f".to_string()],
                vec![],
            ]
        );
    }

    #[test]
    fn test_phases_are_sequential() {
        let topology = shared_design();
        let mut scheduler = IsoScheduler::new("shared", &topology, None);
        assert_eq!(scheduler.phase(), Phase::Idle);
        assert!(scheduler.level().is_err());
        assert!(scheduler.report().is_err());
        scheduler.discover().unwrap();
        assert_eq!(scheduler.phase(), Phase::Discovering);
        assert!(scheduler.discover().is_err());
        scheduler.level().unwrap();
        scheduler.fit().unwrap();
        assert_eq!(scheduler.phase(), Phase::Fitting);
        scheduler.emit().unwrap();
        assert_eq!(scheduler.phase(), Phase::Done);
        scheduler.report().unwrap();
    }

    #[test]
    fn test_tighter_budget_never_shortens_the_schedule() {
        let topology = shared_design();
        let mut previous = 0;
        for budget in (3..=8).rev() {
            let report = schedule_patterns("shared", &topology, Some(budget)).unwrap();
            report.schedule.validate().unwrap();
            assert!(report.schedule.cycle_count() >= previous);
            previous = report.schedule.cycle_count();
        }
        assert_eq!(previous, 5);
    }

    #[test]
    fn test_budget_below_largest_pattern() {
        let topology = shared_design();
        assert_eq!(
            schedule_patterns("shared", &topology, Some(2)).unwrap_err(),
            XbarError::CapacityInfeasible {
                budget: 2,
                minimum: 3
            }
        );
    }

    #[test]
    fn test_full_budget_fixes_everything() {
        let topology = shared_design();
        let report = schedule_patterns("shared", &topology, Some(5)).unwrap();
        assert_eq!(report.fit.fixed, 2);
        let a = report.patterns[0].hash.clone();
        assert_eq!(report.schedule.cycles.len(), 3);
        assert_eq!(
            report.schedule.cycles[1],
            vec![Instruction::Evaluate { hash: a }]
        );
    }
}
