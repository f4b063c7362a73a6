// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Instruction {
    #[serde(rename = "LOAD")]
    Load { hash: String },
    #[serde(rename = "EVAL")]
    Evaluate { hash: String },
}

impl Instruction {
    pub fn hash(&self) -> &str {
        match self {
            Instruction::Load { hash } | Instruction::Evaluate { hash } => hash,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Load { hash } => write!(f, "LOAD {}", hash),
            Instruction::Evaluate { hash } => write!(f, "EVAL {}", hash),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Patterns loaded once in the first cycle and never evicted.
    pub fixed: Vec<String>,
    pub cycles: Vec<Vec<Instruction>>,
}

impl Schedule {
    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }

    /// Checks that every evaluation targets a resident pattern: either a
    /// fixed one loaded in the first cycle, or the variable pattern most
    /// recently loaded.
    pub fn validate(&self) -> Result<(), String> {
        let fixed: BTreeSet<&str> = self.fixed.iter().map(|h| h.as_str()).collect();
        let mut loaded_fixed = BTreeSet::new();
        let mut resident: Option<&str> = None;
        for (i, cycle) in self.cycles.iter().enumerate() {
            for instruction in cycle {
                match instruction {
                    Instruction::Load { hash } if fixed.contains(hash.as_str()) => {
                        if i != 0 {
                            return Err(format!(
                                "fixed pattern {} loaded in cycle {}",
                                hash, i
                            ));
                        }
                        loaded_fixed.insert(hash.as_str());
                    }
                    Instruction::Load { hash } => resident = Some(hash.as_str()),
                    Instruction::Evaluate { hash } => {
                        let available = loaded_fixed.contains(hash.as_str())
                            || resident == Some(hash.as_str());
                        if !available {
                            return Err(format!(
                                "pattern {} evaluated in cycle {} without being resident",
                                hash, i
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Emits the load/evaluate schedule. `generations` are ordered output first
/// and hold pattern-producing names; they are walked input first. A
/// generation whose patterns are all resident costs one cycle; each pattern
/// that is not costs a load cycle and an evaluate cycle, and takes over the
/// variable slot.
pub fn emit_schedule(
    generations: &[Vec<String>],
    hash_of: &BTreeMap<String, String>,
    fixed: &[String],
) -> Schedule {
    let fixed_set: BTreeSet<&str> = fixed.iter().map(|h| h.as_str()).collect();
    let mut cycles = Vec::new();
    if !fixed.is_empty() {
        cycles.push(
            fixed
                .iter()
                .map(|hash| Instruction::Load { hash: hash.clone() })
                .collect(),
        );
    }

    let mut resident: Option<String> = None;
    for generation in generations.iter().rev() {
        let mut present: Vec<&str> = Vec::new();
        for name in generation {
            if let Some(hash) = hash_of.get(name) {
                if !present.contains(&hash.as_str()) {
                    present.push(hash);
                }
            }
        }
        if present.is_empty() {
            continue;
        }

        let (available, missed): (Vec<&str>, Vec<&str>) = present
            .into_iter()
            .partition(|h| fixed_set.contains(h) || resident.as_deref() == Some(*h));
        if !available.is_empty() {
            cycles.push(
                available
                    .iter()
                    .map(|hash| Instruction::Evaluate {
                        hash: hash.to_string(),
                    })
                    .collect(),
            );
        }
        for hash in missed {
            log::trace!("loading variable pattern {}", hash);
            resident = Some(hash.to_string());
            cycles.push(vec![Instruction::Load {
                hash: hash.to_string(),
            }]);
            cycles.push(vec![Instruction::Evaluate {
                hash: hash.to_string(),
            }]);
        }
    }

    Schedule {
        fixed: fixed.to_vec(),
        cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    fn load(h: &str) -> Instruction {
        Instruction::Load {
            hash: h.to_string(),
        }
    }

    fn eval(h: &str) -> Instruction {
        Instruction::Evaluate {
            hash: h.to_string(),
        }
    }

    fn generations() -> (Vec<Vec<String>>, BTreeMap<String, String>) {
        let generations = vec![
            vec!["g".to_string(), "h".to_string()],
            vec!["f".to_string()],
            vec![],
        ];
        let hash_of = btreemap! {
            "f".to_string() => "A".to_string(),
            "g".to_string() => "A".to_string(),
            "h".to_string() => "B".to_string(),
        };
        (generations, hash_of)
    }

    #[test]
    fn test_all_fixed() {
        let (generations, hash_of) = generations();
        let fixed = vec!["A".to_string(), "B".to_string()];
        let schedule = emit_schedule(&generations, &hash_of, &fixed);
        assert_eq!(
            schedule.cycles,
            vec![
                vec![load("A"), load("B")],
                vec![eval("A")],
                vec![eval("A"), eval("B")],
            ]
        );
        schedule.validate().unwrap();
    }

    #[test]
    fn test_variable_slot_reloads() {
        let (generations, hash_of) = generations();
        let schedule = emit_schedule(&generations, &hash_of, &[]);
        assert_eq!(
            schedule.cycles,
            vec![
                vec![load("A")],
                vec![eval("A")],
                vec![eval("A")],
                vec![load("B")],
                vec![eval("B")],
            ]
        );
        schedule.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_evaluate_before_load() {
        let schedule = Schedule {
            fixed: vec![],
            cycles: vec![vec![eval("A")], vec![load("A")]],
        };
        assert!(schedule.validate().is_err());

        let evicted = Schedule {
            fixed: vec![],
            cycles: vec![vec![load("A")], vec![load("B")], vec![eval("A")]],
        };
        assert!(evicted.validate().is_err());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&vec![load("ab"), eval("cd")]).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"LOAD","hash":"ab"},{"type":"EVAL","hash":"cd"}]"#
        );
        assert_eq!(eval("cd").to_string(), "EVAL cd");
    }
}
