//! Centrality and dispersion over a graph store.
//!
//! Definitions follow the usual directed-graph conventions so that numbers
//! line up with what analysis notebooks compute on the same data:
//!
//! | Metric | Formula |
//! |--------|---------|
//! | degree | `(in(v) + out(v)) / (n - 1)`; `1.0` for every node when `n <= 1` |
//! | closeness | `(r - 1) / Σ d(u, v)` over the `r` nodes that reach `v`, scaled by `(r - 1) / (n - 1)` |
//! | dispersion | for each edge `u → v`: pairs of common successors that are not linked through `u`'s other successors, divided by the number of common successors |

use std::collections::{HashMap, HashSet};

use crate::model::Node;
use super::{GraphStore, Topology};

/// Degree centrality of every node.
#[allow(clippy::cast_precision_loss)]
pub fn degree_centrality<S: GraphStore>(store: &S) -> HashMap<Node, f64> {
    let topo = Topology::from_store(store);
    let n = topo.len();
    if n <= 1 {
        return topo.nodes.into_iter().map(|node| (node, 1.0)).collect();
    }

    let scale = 1.0 / (n - 1) as f64;
    (0..n)
        .map(|v| (topo.nodes[v].clone(), (topo.out[v].len() + topo.inc[v].len()) as f64 * scale))
        .collect()
}

/// Closeness centrality of every node, measured on incoming paths.
///
/// Uses the Wasserman–Faust correction, so nodes reachable from only part
/// of the graph are scaled down instead of looking artificially central.
#[allow(clippy::cast_precision_loss)]
pub fn closeness_centrality<S: GraphStore>(store: &S) -> HashMap<Node, f64> {
    let topo = Topology::from_store(store);
    let n = topo.len();

    (0..n)
        .map(|v| {
            let distances = topo.bfs_distances(v, true);
            let reached: Vec<usize> = distances.iter().flatten().copied().collect();
            let total: usize = reached.iter().sum();
            let r = reached.len() as f64;

            let closeness = if total > 0 && n > 1 {
                ((r - 1.0) / total as f64) * ((r - 1.0) / (n - 1) as f64)
            } else {
                0.0
            };
            (topo.nodes[v].clone(), closeness)
        })
        .collect()
}

/// Dispersion of every linked pair `u → v`, keyed by `u` then `v`.
///
/// Every node gets an entry, possibly empty.
#[allow(clippy::cast_precision_loss)]
pub fn dispersion<S: GraphStore>(store: &S) -> HashMap<Node, HashMap<Node, f64>> {
    let topo = Topology::from_store(store);
    let successors: Vec<HashSet<usize>> = topo.out.iter().map(|s| s.iter().copied().collect()).collect();

    let mut result: HashMap<Node, HashMap<Node, f64>> =
        topo.nodes.iter().map(|n| (n.clone(), HashMap::new())).collect();

    for u in 0..topo.len() {
        for &v in &topo.out[u] {
            let value = pair_dispersion(&topo, &successors, u, v);
            if let Some(row) = result.get_mut(&topo.nodes[u]) {
                row.insert(topo.nodes[v].clone(), value);
            }
        }
    }
    result
}

fn pair_dispersion(topo: &Topology, successors: &[HashSet<usize>], u: usize, v: usize) -> f64 {
    let u_succ = &successors[u];
    // Common successors, in v's adjacency order.
    let shared: Vec<usize> = topo.out[v].iter().copied().filter(|n| u_succ.contains(n)).collect();

    let mut total = 0usize;
    for (i, &s) in shared.iter().enumerate() {
        for &t in &shared[i + 1..] {
            let s_via_u: HashSet<usize> = u_succ
                .intersection(&successors[s])
                .copied()
                .filter(|&x| x != u && x != v)
                .collect();
            if !s_via_u.contains(&t) && s_via_u.is_disjoint(&successors[t]) {
                total += 1;
            }
        }
    }

    if shared.is_empty() {
        total as f64
    } else {
        total as f64 / shared.len() as f64
    }
}
