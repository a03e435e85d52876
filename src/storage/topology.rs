//! Compact index-based snapshot of a store, for whole-graph algorithms.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::Node;
use super::GraphStore;

/// Nodes numbered `0..n` with successor / predecessor lists.
#[derive(Debug, Clone)]
pub struct Topology {
    pub nodes: Vec<Node>,
    pub out: Vec<Vec<usize>>,
    pub inc: Vec<Vec<usize>>,
    edges: HashSet<(usize, usize)>,
}

impl Topology {
    pub fn from_store<S: GraphStore>(store: &S) -> Self {
        let nodes = store.nodes();
        let position: HashMap<&Node, usize> = nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();

        let mut out = vec![Vec::new(); nodes.len()];
        let mut inc = vec![Vec::new(); nodes.len()];
        let mut edges = HashSet::new();
        for (from, to, _) in store.edges() {
            if let (Some(&f), Some(&t)) = (position.get(&from), position.get(&to)) {
                out[f].push(t);
                inc[t].push(f);
                edges.insert((f, t));
            }
        }

        Self { nodes, out, inc, edges }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.edges.contains(&(from, to))
    }

    /// Unweighted shortest-path lengths from `source`, following edges
    /// forward (`reverse = false`) or backward. Unreachable nodes are `None`.
    pub fn bfs_distances(&self, source: usize, reverse: bool) -> Vec<Option<usize>> {
        let adjacency = if reverse { &self.inc } else { &self.out };
        let mut dist = vec![None; self.len()];
        dist[source] = Some(0);
        let mut queue = VecDeque::from([source]);

        while let Some(u) = queue.pop_front() {
            let next = dist[u].map(|d| d + 1);
            for &v in &adjacency[u] {
                if dist[v].is_none() {
                    dist[v] = next;
                    queue.push_back(v);
                }
            }
        }
        dist
    }
}
