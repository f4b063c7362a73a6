// SPDX-License-Identifier: Apache-2.0

//! Generators shared by integration tests and benchmarks.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use rand::seq::SliceRandom;
use xbarsynth::{DecisionDiagram, DiagramNode, DiagramTopology, Literal, NodeRef};

/// Every assignment of the given atoms, in binary counting order.
pub fn all_instances(atoms: &[&str]) -> Vec<HashMap<String, bool>> {
    (0..1usize << atoms.len())
        .map(|bits| {
            atoms
                .iter()
                .enumerate()
                .map(|(i, atom)| (atom.to_string(), bits & (1 << i) != 0))
                .collect()
        })
        .collect()
}

/// Builds a random reduced diagram over `x0..x{num_vars-1}` with at most
/// `width` nodes per variable level. The root (node 0) produces output
/// `name`; nodes not reachable from it are dropped. With `zero_terminal`,
/// edges into the 0-terminal are kept and lead to a "0" terminal node;
/// otherwise they are left out.
pub fn random_bdd<R: Rng>(
    rng: &mut R,
    name: &str,
    num_vars: usize,
    width: usize,
    zero_terminal: bool,
) -> DecisionDiagram {
    assert!(num_vars > 0 && width > 0);
    // Child encoding per level: None is the 0-terminal, Some(ONE) the
    // 1-terminal, Some(i) node i of the next level.
    const ONE: usize = usize::MAX;
    let sizes: Vec<usize> = (0..num_vars)
        .map(|level| if level == 0 { 1 } else { rng.gen_range(1..=width) })
        .collect();
    let mut levels: Vec<Vec<(Option<usize>, Option<usize>)>> = Vec::with_capacity(num_vars);
    for level in 0..num_vars {
        let next_size = sizes.get(level + 1).copied();
        let pick = |rng: &mut R| -> Option<usize> {
            match (rng.gen_range(0..4), next_size) {
                (0, _) => None,
                (1, _) | (_, None) => Some(ONE),
                (_, Some(n)) => Some(rng.gen_range(0..n)),
            }
        };
        let mut level_nodes = Vec::with_capacity(sizes[level]);
        while level_nodes.len() < sizes[level] {
            let high = pick(rng);
            let low = pick(rng);
            if high != low {
                level_nodes.push((high, low));
            }
        }
        levels.push(level_nodes);
    }

    // Keep only nodes reachable from the root, numbering them in level order.
    let mut reachable: Vec<Vec<bool>> = levels.iter().map(|l| vec![false; l.len()]).collect();
    reachable[0][0] = true;
    for level in 0..num_vars {
        for i in 0..levels[level].len() {
            if !reachable[level][i] {
                continue;
            }
            let (high, low) = levels[level][i];
            for child in [high, low].into_iter().flatten() {
                if child != ONE {
                    reachable[level + 1][child] = true;
                }
            }
        }
    }

    let mut dd = DecisionDiagram::new(name);
    let mut handle: Vec<Vec<Option<NodeRef>>> = levels.iter().map(|l| vec![None; l.len()]).collect();
    for level in 0..num_vars {
        for i in 0..levels[level].len() {
            if reachable[level][i] {
                let variable = format!("x{}", level);
                let node = if level == 0 {
                    DiagramNode::root(&variable, &[name])
                } else {
                    DiagramNode::internal(&variable)
                };
                handle[level][i] = Some(dd.add_node(node));
            }
        }
    }
    let one = dd.add_node(DiagramNode::terminal("1"));
    let reaches_zero = (0..num_vars).any(|level| {
        levels[level]
            .iter()
            .zip(&reachable[level])
            .any(|((high, low), reached)| *reached && (high.is_none() || low.is_none()))
    });
    let zero = (zero_terminal && reaches_zero).then(|| dd.add_node(DiagramNode::terminal("0")));

    for level in 0..num_vars {
        for i in 0..levels[level].len() {
            let Some(source) = handle[level][i] else {
                continue;
            };
            let (high, low) = levels[level][i];
            let variable = format!("x{}", level);
            for (child, positive) in [(high, true), (low, false)] {
                let target = match child {
                    None => zero,
                    Some(ONE) => Some(one),
                    Some(child) => handle[level + 1][child],
                };
                if let Some(target) = target {
                    dd.add_edge(source, target, Literal::new(&variable, positive))
                        .expect("generated edges are distinct");
                }
            }
        }
    }
    dd
}

/// A multi-output design where output `o{i}` reads primary inputs and,
/// sometimes, earlier outputs. Sub-diagram shapes are drawn from a small pool
/// so that pattern classes repeat.
pub fn random_design<R: Rng>(rng: &mut R, outputs: usize, shapes: usize) -> DiagramTopology {
    let pool: Vec<DecisionDiagram> = (0..shapes.max(1))
        .map(|i| random_bdd(rng, &format!("s{}", i), 3, 2, false))
        .collect();
    let mut diagrams = BTreeMap::new();
    let mut signals: Vec<String> = (0..4).map(|i| format!("pi{}", i)).collect();
    for i in 0..outputs {
        let name = format!("o{}", i);
        let Some(shape) = pool.choose(rng) else {
            continue;
        };
        // Rename x0..x2 onto randomly chosen earlier signals.
        let atoms: Vec<String> = (0..3)
            .map(|_| signals.choose(rng).cloned().unwrap_or_else(|| "pi0".to_string()))
            .collect();
        diagrams.insert(name.clone(), rename(shape, &name, &atoms));
        signals.push(name);
    }
    log::debug!("random design with {} outputs", diagrams.len());
    DiagramTopology::from_diagrams(diagrams)
}

fn rename(shape: &DecisionDiagram, name: &str, atoms: &[String]) -> DecisionDiagram {
    let atom_for = |variable: &str| -> String {
        variable
            .strip_prefix('x')
            .and_then(|i| i.parse::<usize>().ok())
            .and_then(|i| atoms.get(i).cloned())
            .unwrap_or_else(|| variable.to_string())
    };
    let mut dd = DecisionDiagram::new(name);
    for node in shape.nodes() {
        let mut node = node.clone();
        if !node.terminal {
            node.variable = atom_for(&node.variable);
        }
        if node.root {
            node.output_variables = std::iter::once(name.to_string()).collect();
        }
        dd.add_node(node);
    }
    for edge in shape.edges() {
        let literal = Literal::new(&atom_for(&edge.literal.atom), edge.literal.positive);
        dd.add_edge(edge.source, edge.target, literal)
            .expect("renaming keeps edges distinct");
    }
    dd
}

/// Compare arbitrary text against a golden file on disk, with an opt-in
/// update mechanism controlled by the XBARSYNTH_UPDATE_GOLDEN environment
/// variable.
pub fn compare_golden_text(got: &str, relpath: &str) {
    let golden_path = std::path::Path::new(relpath);
    if std::env::var("XBARSYNTH_UPDATE_GOLDEN").is_ok() || !golden_path.exists() {
        log::info!("writing golden file to {}", golden_path.display());
        std::fs::write(golden_path, got).expect("write golden");
    } else {
        let want = std::fs::read_to_string(golden_path).expect("read golden");
        assert_eq!(
            got, want,
            "Golden mismatch; run with XBARSYNTH_UPDATE_GOLDEN=1 to update."
        );
    }
}
