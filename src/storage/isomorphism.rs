//! Structural isomorphism of directed graphs.
//!
//! Node kinds, node values and edge attributes are ignored: two stores are
//! isomorphic when some bijection between their nodes maps the edge set of
//! one exactly onto the edge set of the other.
//!
//! The check runs in three stages:
//!
//! 1. counts of nodes and edges,
//! 2. joint colour refinement (1-WL) over both graphs, comparing the colour
//!    histograms,
//! 3. backtracking over same-coloured candidates, with an explicit stack so
//!    large graphs cannot overflow the call stack.

use std::collections::HashMap;
use std::hash::Hash;

use super::{GraphStore, Topology};

/// Whether `a` and `b` have the same shape.
pub fn is_isomorphic<S: GraphStore>(a: &S, b: &S) -> bool {
    topologies_isomorphic(&Topology::from_store(a), &Topology::from_store(b))
}

pub fn topologies_isomorphic(a: &Topology, b: &Topology) -> bool {
    if a.len() != b.len() || a.edge_count() != b.edge_count() {
        return false;
    }
    if a.is_empty() {
        return true;
    }

    let (colors_a, colors_b) = refine_colors(a, b);
    let mut hist_a = colors_a.clone();
    let mut hist_b = colors_b.clone();
    hist_a.sort_unstable();
    hist_b.sort_unstable();
    if hist_a != hist_b {
        tracing::trace!("colour histograms differ");
        return false;
    }

    search(a, b, &colors_a, &colors_b)
}

// ============================================================================
// Colour refinement
// ============================================================================

fn intern<K: Hash + Eq>(palette: &mut HashMap<K, usize>, key: K) -> usize {
    let next = palette.len();
    *palette.entry(key).or_insert(next)
}

type Signature = (usize, Vec<usize>, Vec<usize>);

fn refine_colors(a: &Topology, b: &Topology) -> (Vec<usize>, Vec<usize>) {
    let mut initial = HashMap::new();
    let mut seed = |t: &Topology| -> Vec<usize> {
        (0..t.len())
            .map(|v| intern(&mut initial, (t.out[v].len(), t.inc[v].len(), t.has_edge(v, v))))
            .collect()
    };
    let mut colors_a = seed(a);
    let mut colors_b = seed(b);
    let mut classes = initial.len();

    // Classes only ever split, so the count is bounded by the node total.
    loop {
        let mut palette: HashMap<Signature, usize> = HashMap::new();
        let next_a = recolor(a, &colors_a, &mut palette);
        let next_b = recolor(b, &colors_b, &mut palette);
        colors_a = next_a;
        colors_b = next_b;
        if palette.len() == classes {
            break;
        }
        classes = palette.len();
    }
    (colors_a, colors_b)
}

fn recolor(t: &Topology, colors: &[usize], palette: &mut HashMap<Signature, usize>) -> Vec<usize> {
    (0..t.len())
        .map(|v| {
            let mut out: Vec<usize> = t.out[v].iter().map(|&w| colors[w]).collect();
            let mut inc: Vec<usize> = t.inc[v].iter().map(|&w| colors[w]).collect();
            out.sort_unstable();
            inc.sort_unstable();
            intern(palette, (colors[v], out, inc))
        })
        .collect()
}

// ============================================================================
// Backtracking
// ============================================================================

/// Order `a`'s nodes so that each one, where possible, touches nodes placed
/// before it; rarer colours go first among equals.
fn match_order(a: &Topology, colors: &[usize]) -> Vec<usize> {
    let mut class_size: HashMap<usize, usize> = HashMap::new();
    for &c in colors {
        *class_size.entry(c).or_default() += 1;
    }

    let n = a.len();
    let mut placed = vec![false; n];
    let mut links = vec![0usize; n];
    let mut order = Vec::with_capacity(n);

    for _ in 0..n {
        let next = (0..n)
            .filter(|&v| !placed[v])
            .min_by_key(|&v| (std::cmp::Reverse(links[v]), class_size[&colors[v]], v));
        let Some(v) = next else { break };
        placed[v] = true;
        order.push(v);
        for &w in a.out[v].iter().chain(&a.inc[v]) {
            links[w] += 1;
        }
    }
    order
}

fn feasible(a: &Topology, b: &Topology, map_a: &[Option<usize>], map_b: &[Option<usize>], u: usize, v: usize) -> bool {
    if a.has_edge(u, u) != b.has_edge(v, v) {
        return false;
    }

    // Mapped successors / predecessors of u must land on successors /
    // predecessors of v, and v must have no extra mapped ones.
    let mut mapped_a = 0;
    for &w in &a.out[u] {
        if let Some(x) = map_a[w].filter(|_| w != u) {
            if !b.has_edge(v, x) {
                return false;
            }
            mapped_a += 1;
        }
    }
    let mapped_b = b.out[v].iter().filter(|&&y| y != v && map_b[y].is_some()).count();
    if mapped_a != mapped_b {
        return false;
    }

    let mut mapped_a = 0;
    for &w in &a.inc[u] {
        if let Some(x) = map_a[w].filter(|_| w != u) {
            if !b.has_edge(x, v) {
                return false;
            }
            mapped_a += 1;
        }
    }
    let mapped_b = b.inc[v].iter().filter(|&&y| y != v && map_b[y].is_some()).count();
    mapped_a == mapped_b
}

fn search(a: &Topology, b: &Topology, colors_a: &[usize], colors_b: &[usize]) -> bool {
    let n = a.len();
    let mut by_color: HashMap<usize, Vec<usize>> = HashMap::new();
    for (v, &c) in colors_b.iter().enumerate() {
        by_color.entry(c).or_default().push(v);
    }

    let order = match_order(a, colors_a);
    let mut map_a: Vec<Option<usize>> = vec![None; n];
    let mut map_b: Vec<Option<usize>> = vec![None; n];
    let mut cursor = vec![0usize; n];
    let mut depth = 0;

    while depth < n {
        let u = order[depth];
        let Some(candidates) = by_color.get(&colors_a[u]) else {
            return false;
        };
        if let Some(prev) = map_a[u].take() {
            map_b[prev] = None;
        }

        let mut placed = false;
        while cursor[depth] < candidates.len() {
            let v = candidates[cursor[depth]];
            cursor[depth] += 1;
            if map_b[v].is_none() && feasible(a, b, &map_a, &map_b, u, v) {
                map_a[u] = Some(v);
                map_b[v] = Some(u);
                placed = true;
                break;
            }
        }

        if placed {
            depth += 1;
        } else {
            cursor[depth] = 0;
            if depth == 0 {
                return false;
            }
            depth -= 1;
        }
    }
    true
}
