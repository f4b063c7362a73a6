// SPDX-License-Identifier: Apache-2.0

//! Weisfeiler-Lehman structural hashing of decision diagrams.
//!
//! Labels start as each node's total degree and are refined by aggregating
//! the sorted labels of the node's successors. Edge literals and node
//! variables do not participate: two diagrams hash equal when their shapes
//! agree, whatever atoms they test.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;

use crate::diagram::DecisionDiagram;

pub const WL_ITERATIONS: usize = 3;

/// Digests are truncated to this many bytes before hex encoding.
const DIGEST_BYTES: usize = 16;

static WORKERS: Lazy<usize> = Lazy::new(num_cpus::get);

fn digest(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hash.as_bytes()[..DIGEST_BYTES]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

pub fn wl_hash(diagram: &DecisionDiagram) -> String {
    let n = diagram.node_count();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut degree = vec![0usize; n];
    for edge in diagram.edges() {
        successors[edge.source.id].push(edge.target.id);
        degree[edge.source.id] += 1;
        degree[edge.target.id] += 1;
    }

    let mut labels: Vec<String> = degree.iter().map(|d| d.to_string()).collect();
    let mut signature = String::new();
    for _ in 0..WL_ITERATIONS {
        let next: Vec<String> = (0..n)
            .map(|v| {
                let mut neighborhood: Vec<&str> =
                    successors[v].iter().map(|&s| labels[s].as_str()).collect();
                neighborhood.sort_unstable();
                digest(format!("{}|{}", labels[v], neighborhood.join(",")).as_bytes())
            })
            .collect();
        {
            let mut histogram: BTreeMap<&str, usize> = BTreeMap::new();
            for label in &next {
                *histogram.entry(label.as_str()).or_default() += 1;
            }
            for (label, count) in histogram {
                signature.push_str(&format!("{}:{};", label, count));
            }
        }
        labels = next;
    }
    digest(signature.as_bytes())
}

/// Hashes every diagram on a pool of scoped worker threads. The result is
/// in input order regardless of which worker handled which diagram.
pub fn hash_all(diagrams: &[&DecisionDiagram]) -> Vec<String> {
    let job_count = diagrams.len();
    if job_count == 0 {
        return Vec::new();
    }
    let worker_count = std::cmp::max(1, std::cmp::min(*WORKERS, job_count));
    let next_job = AtomicUsize::new(0);
    let results: Mutex<Vec<Option<String>>> = Mutex::new(vec![None; job_count]);

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| {
                loop {
                    let idx = next_job.fetch_add(1, Ordering::SeqCst);
                    if idx >= job_count {
                        break;
                    }
                    let hash = wl_hash(diagrams[idx]);
                    let mut guard = results.lock().unwrap_or_else(|e| e.into_inner());
                    guard[idx] = Some(hash);
                }
            });
        }
    });
    log::debug!(
        "hashed {} diagrams on {} workers",
        job_count,
        worker_count
    );

    results
        .into_inner()
        .unwrap_or_else(|e| e.into_inner())
        .into_iter()
        .zip(diagrams)
        .map(|(hash, diagram)| hash.unwrap_or_else(|| wl_hash(diagram)))
        .collect()
}
