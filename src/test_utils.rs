// SPDX-License-Identifier: Apache-2.0

//! Small decision diagrams shared by unit tests.

use std::collections::HashMap;

use crate::diagram::{DecisionDiagram, DiagramNode, NodeRef};
use crate::literal::Literal;

/// `name = x`: root testing `x`, one positive edge to the "1" terminal.
pub fn bdd_single_var(name: &str, x: &str) -> DecisionDiagram {
    let mut dd = DecisionDiagram::new(name);
    let root = dd.add_node(DiagramNode::root(x, &[name]));
    let one = dd.add_node(DiagramNode::terminal("1"));
    dd.add_edge(root, one, Literal::new(x, true)).unwrap();
    dd
}

/// `name = a & b` as a reduced diagram without the 0-terminal:
/// node 0 tests `a`, node 1 tests `b`, node 2 is the "1" terminal.
pub fn bdd_and2(name: &str, a: &str, b: &str) -> DecisionDiagram {
    let mut dd = DecisionDiagram::new(name);
    let root = dd.add_node(DiagramNode::root(a, &[name]));
    let mid = dd.add_node(DiagramNode::internal(b));
    let one = dd.add_node(DiagramNode::terminal("1"));
    dd.add_edge(root, mid, Literal::new(a, true)).unwrap();
    dd.add_edge(mid, one, Literal::new(b, true)).unwrap();
    dd
}

/// `name = atoms[0] ^ atoms[1] ^ ...` with both terminals kept. Level `i`
/// holds one node per parity of the atoms read so far (index 0 is even).
pub fn bdd_parity(name: &str, atoms: &[&str]) -> DecisionDiagram {
    assert!(!atoms.is_empty());
    let mut dd = DecisionDiagram::new(name);
    let mut level = vec![dd.add_node(DiagramNode::root(atoms[0], &[name]))];
    for (i, atom) in atoms.iter().enumerate() {
        let next: Vec<NodeRef> = match atoms.get(i + 1) {
            Some(next_atom) => (0..2)
                .map(|_| dd.add_node(DiagramNode::internal(next_atom)))
                .collect(),
            None => vec![
                dd.add_node(DiagramNode::terminal("0")),
                dd.add_node(DiagramNode::terminal("1")),
            ],
        };
        for (parity, &node) in level.iter().enumerate() {
            dd.add_edge(node, next[parity ^ 1], Literal::new(atom, true)).unwrap();
            dd.add_edge(node, next[parity], Literal::new(atom, false)).unwrap();
        }
        level = next;
    }
    dd
}

/// A chain of `n` nodes from root "f" to the "1" terminal; edge `i` carries
/// the positive literal `x{i}`.
pub fn path_diagram(n: usize) -> DecisionDiagram {
    assert!(n >= 2, "a path needs a root and a terminal");
    let mut dd = DecisionDiagram::new("path");
    let mut previous = dd.add_node(DiagramNode::root("x0", &["f"]));
    for i in 1..n {
        let node = if i + 1 == n {
            DiagramNode::terminal("1")
        } else {
            DiagramNode::internal(&format!("x{}", i))
        };
        let current = dd.add_node(node);
        dd.add_edge(previous, current, Literal::new(&format!("x{}", i - 1), true))
            .unwrap();
        previous = current;
    }
    dd
}

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
