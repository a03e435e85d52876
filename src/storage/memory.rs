//! In-memory directed graph store.
//!
//! This is the reference implementation of `GraphStore`: an arena of node
//! slots addressed by position, with edges kept in a map keyed by
//! `(from_slot, to_slot)`. Nodes never own each other, so cycles (an item
//! pointing at a property that points back at the item) need no special
//! handling.
//!
//! ## Layout
//!
//! - `slots`: insertion-ordered arena; removed nodes leave a `None` hole
//! - `index`: `Node → slot` for exact lookups
//! - `by_value`: `Value → slots` for raw lookups (usually one slot, rarely
//!   two or three when a value is both a user and an item)
//! - `edges`: attributes plus an insertion sequence number, so adjacency
//!   order survives a save/load round trip

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::*;
use super::GraphStore;

// ============================================================================
// DiGraphStore
// ============================================================================

/// Arena-backed directed graph keyed by node identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "StoreRepr", into = "StoreRepr")]
pub struct DiGraphStore {
    slots: Vec<Option<Slot>>,
    index: HashMap<Node, usize>,
    by_value: HashMap<Value, SmallVec<[usize; 2]>>,
    edges: HashMap<(usize, usize), EdgeEntry>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    /// Successor slots, in edge insertion order.
    out: Vec<usize>,
    /// Predecessor slots, in edge insertion order.
    inc: Vec<usize>,
}

#[derive(Debug, Clone)]
struct EdgeEntry {
    seq: u64,
    data: EdgeData,
}

impl DiGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_of(&self, node: &Node) -> Option<usize> {
        self.index.get(node).copied()
    }

    fn node_at(&self, idx: usize) -> Option<&Node> {
        self.slots.get(idx).and_then(|s| s.as_ref()).map(|s| &s.node)
    }

    fn nodes_at(&self, slots: &[usize]) -> Vec<Node> {
        slots.iter().filter_map(|&i| self.node_at(i).cloned()).collect()
    }

    fn remove_slot(&mut self, idx: usize) -> bool {
        let Some(slot) = self.slots.get_mut(idx).and_then(Option::take) else {
            return false;
        };

        for &to in &slot.out {
            self.edges.remove(&(idx, to));
            if let Some(Some(target)) = self.slots.get_mut(to) {
                target.inc.retain(|&s| s != idx);
            }
        }
        for &from in &slot.inc {
            self.edges.remove(&(from, idx));
            if let Some(Some(source)) = self.slots.get_mut(from) {
                source.out.retain(|&s| s != idx);
            }
        }

        self.index.remove(&slot.node);
        if let Some(same_value) = self.by_value.get_mut(slot.node.value()) {
            same_value.retain(|s| *s != idx);
            if same_value.is_empty() {
                self.by_value.remove(slot.node.value());
            }
        }
        true
    }
}

// ============================================================================
// GraphStore impl
// ============================================================================

impl GraphStore for DiGraphStore {
    fn add_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(&node) {
            return false;
        }
        let idx = self.slots.len();
        self.by_value.entry(node.value().clone()).or_default().push(idx);
        self.index.insert(node.clone(), idx);
        self.slots.push(Some(Slot { node, out: Vec::new(), inc: Vec::new() }));
        true
    }

    fn contains(&self, node: &Node) -> bool {
        self.index.contains_key(node)
    }

    fn resolve(&self, node: &NodeRef) -> Option<Node> {
        match node {
            NodeRef::Exact(n) => self.contains(n).then(|| n.clone()),
            NodeRef::Raw(v) => {
                let first = *self.by_value.get(v)?.first()?;
                self.node_at(first).cloned()
            }
        }
    }

    fn nodes(&self) -> Vec<Node> {
        self.slots.iter().flatten().map(|s| s.node.clone()).collect()
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<Node> {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.node.kind() == kind)
            .map(|s| s.node.clone())
            .collect()
    }

    fn remove_nodes<'a>(&mut self, nodes: impl IntoIterator<Item = &'a Node>) -> usize {
        let mut removed = 0;
        for node in nodes {
            if let Some(idx) = self.slot_of(node) {
                if self.remove_slot(idx) {
                    removed += 1;
                }
            }
        }
        removed
    }

    fn node_count(&self) -> usize {
        self.index.len()
    }

    fn set_edge(&mut self, from: &Node, to: &Node, data: EdgeData) -> bool {
        let (Some(f), Some(t)) = (self.slot_of(from), self.slot_of(to)) else {
            return false;
        };

        if let Some(entry) = self.edges.get_mut(&(f, t)) {
            entry.data = data;
            return true;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.edges.insert((f, t), EdgeEntry { seq, data });
        if let Some(Some(source)) = self.slots.get_mut(f) {
            source.out.push(t);
        }
        if let Some(Some(target)) = self.slots.get_mut(t) {
            target.inc.push(f);
        }
        true
    }

    fn remove_edge(&mut self, from: &Node, to: &Node) -> Option<EdgeData> {
        let (f, t) = (self.slot_of(from)?, self.slot_of(to)?);
        let entry = self.edges.remove(&(f, t))?;
        if let Some(Some(source)) = self.slots.get_mut(f) {
            source.out.retain(|&s| s != t);
        }
        if let Some(Some(target)) = self.slots.get_mut(t) {
            target.inc.retain(|&s| s != f);
        }
        Some(entry.data)
    }

    fn edge(&self, from: &Node, to: &Node) -> Option<EdgeData> {
        let (f, t) = (self.slot_of(from)?, self.slot_of(to)?);
        self.edges.get(&(f, t)).map(|e| e.data.clone())
    }

    fn neighbors(&self, node: &Node, dir: Direction) -> Option<Vec<Node>> {
        let slot = self.slots.get(self.slot_of(node)?)?.as_ref()?;
        let result = match dir {
            Direction::Outgoing => self.nodes_at(&slot.out),
            Direction::Incoming => self.nodes_at(&slot.inc),
            Direction::Both => {
                let mut all = slot.out.clone();
                all.extend(slot.inc.iter().filter(|s| !slot.out.contains(s)));
                self.nodes_at(&all)
            }
        };
        Some(result)
    }

    fn edges(&self) -> Vec<(Node, Node, EdgeData)> {
        let mut result = Vec::with_capacity(self.edges.len());
        for (idx, slot) in self.slots.iter().enumerate() {
            let Some(slot) = slot else { continue };
            for &to in &slot.out {
                if let (Some(target), Some(entry)) = (self.node_at(to), self.edges.get(&(idx, to))) {
                    result.push((slot.node.clone(), target.clone(), entry.data.clone()));
                }
            }
        }
        result
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

// ============================================================================
// Serialized form
// ============================================================================

/// On-disk shape of a store: live nodes in order, then edges as positions
/// into that list, sorted by insertion sequence. Indices are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct StoreRepr {
    nodes: Vec<Node>,
    edges: Vec<(usize, usize, EdgeData)>,
}

impl From<DiGraphStore> for StoreRepr {
    fn from(store: DiGraphStore) -> Self {
        let mut position = HashMap::with_capacity(store.index.len());
        let mut nodes = Vec::with_capacity(store.index.len());
        for (idx, slot) in store.slots.iter().enumerate() {
            if let Some(slot) = slot {
                position.insert(idx, nodes.len());
                nodes.push(slot.node.clone());
            }
        }

        let mut edges: Vec<_> = store
            .edges
            .iter()
            .filter_map(|(&(f, t), e)| Some((e.seq, *position.get(&f)?, *position.get(&t)?, e.data.clone())))
            .collect();
        edges.sort_by_key(|(seq, ..)| *seq);

        StoreRepr {
            nodes,
            edges: edges.into_iter().map(|(_, f, t, d)| (f, t, d)).collect(),
        }
    }
}

impl TryFrom<StoreRepr> for DiGraphStore {
    type Error = String;

    fn try_from(repr: StoreRepr) -> std::result::Result<Self, Self::Error> {
        let mut store = DiGraphStore::new();
        for node in repr.nodes {
            if !store.add_node(node.clone()) {
                return Err(format!("duplicate {} node '{node}' in serialized graph", node.kind()));
            }
        }
        for (f, t, data) in repr.edges {
            let (Some(from), Some(to)) = (store.node_at(f).cloned(), store.node_at(t).cloned()) else {
                return Err(format!("edge {f} -> {t} references a node outside the graph"));
            };
            store.set_edge(&from, &to, data);
        }
        Ok(store)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn link(store: &mut DiGraphStore, from: &Node, to: &Node, weight: f64) -> bool {
        store.set_edge(from, to, EdgeData::new(weight, "score"))
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut store = DiGraphStore::new();
        assert!(store.add_node(Node::user("u1")));
        assert!(!store.add_node(Node::user("u1")));
        assert!(store.add_node(Node::item("u1")));
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn test_raw_resolution_prefers_earliest_node() {
        let mut store = DiGraphStore::new();
        store.add_node(Node::item("x"));
        store.add_node(Node::user("x"));
        assert_eq!(store.resolve(&NodeRef::from("x")), Some(Node::item("x")));
        assert_eq!(store.resolve(&Node::user("x").into()), Some(Node::user("x")));
        assert_eq!(store.resolve(&Node::property("x").into()), None);

        store.remove_nodes([&Node::item("x")]);
        assert_eq!(store.resolve(&NodeRef::from("x")), Some(Node::user("x")));
    }

    #[test]
    fn test_edge_overwrite_keeps_single_edge() {
        let mut store = DiGraphStore::new();
        let (u, i) = (Node::user("u1"), Node::item("i1"));
        store.add_node(u.clone());
        store.add_node(i.clone());

        assert!(link(&mut store, &u, &i, 0.2));
        assert!(store.set_edge(&u, &i, EdgeData::new(0.9, "other")));
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.edge(&u, &i), Some(EdgeData::new(0.9, "other")));
        assert_eq!(store.edge(&i, &u), None);
    }

    #[test]
    fn test_edge_requires_both_endpoints() {
        let mut store = DiGraphStore::new();
        let u = Node::user("u1");
        store.add_node(u.clone());
        assert!(!link(&mut store, &u, &Node::item("ghost"), 0.5));
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_neighbors_in_insertion_order() {
        let mut store = DiGraphStore::new();
        let u0 = Node::user("u0");
        let u1 = Node::user("u1");
        let i0 = Node::item("i0");
        let i1 = Node::item("i1");
        for n in [&u0, &u1, &i0, &i1] {
            store.add_node(n.clone());
        }
        link(&mut store, &u1, &i0, 0.5);
        link(&mut store, &u0, &i0, 0.5);
        link(&mut store, &u0, &i1, 0.5);
        link(&mut store, &i1, &u0, 0.5);

        assert_eq!(store.neighbors(&i0, Direction::Incoming).unwrap(), vec![u1.clone(), u0.clone()]);
        assert_eq!(store.neighbors(&u0, Direction::Outgoing).unwrap(), vec![i0.clone(), i1.clone()]);
        assert_eq!(store.neighbors(&u0, Direction::Both).unwrap(), vec![i0, i1]);
        assert!(store.neighbors(&Node::user("ghost"), Direction::Outgoing).is_none());
    }

    #[test]
    fn test_remove_nodes_cascades_to_edges() {
        let mut store = DiGraphStore::new();
        let u = Node::user("u1");
        let i = Node::item("i1");
        let p = Node::property("Nolan");
        for n in [&u, &i, &p] {
            store.add_node(n.clone());
        }
        link(&mut store, &u, &i, 0.5);
        link(&mut store, &i, &p, 0.5);
        link(&mut store, &p, &i, 0.5);
        link(&mut store, &i, &i, 0.5);

        assert_eq!(store.remove_nodes([&i, &Node::item("ghost")]), 1);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.neighbors(&u, Direction::Both).unwrap(), Vec::<Node>::new());
        assert_eq!(store.neighbors(&p, Direction::Both).unwrap(), Vec::<Node>::new());
        assert!(!store.contains(&i));
    }

    #[test]
    fn test_remove_edge() {
        let mut store = DiGraphStore::new();
        let (u, i) = (Node::user("u1"), Node::item("i1"));
        store.add_node(u.clone());
        store.add_node(i.clone());
        link(&mut store, &u, &i, 0.7);

        assert_eq!(store.remove_edge(&u, &i).map(|d| d.weight), Some(0.7));
        assert_eq!(store.remove_edge(&u, &i), None);
        assert!(store.neighbors(&i, Direction::Incoming).unwrap().is_empty());
    }

    #[test]
    fn test_serde_round_trip_preserves_order() {
        let mut store = DiGraphStore::new();
        let nodes = [Node::user("u2"), Node::user("u1"), Node::item("i1"), Node::item("gone")];
        for n in &nodes {
            store.add_node(n.clone());
        }
        link(&mut store, &nodes[1], &nodes[2], 0.1);
        link(&mut store, &nodes[0], &nodes[2], 0.2);
        store.remove_nodes([&nodes[3]]);

        let json = serde_json::to_string(&store).unwrap();
        let restored: DiGraphStore = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.nodes(), store.nodes());
        assert_eq!(restored.edges(), store.edges());
        assert_eq!(
            restored.neighbors(&nodes[2], Direction::Incoming),
            store.neighbors(&nodes[2], Direction::Incoming)
        );
    }

    #[test]
    fn test_corrupt_repr_rejected() {
        let json = r#"{"nodes":[{"kind":"User","value":{"type":"String","value":"u1"}}],"edges":[[0,3,{"weight":0.5,"label":"score"}]]}"#;
        assert!(serde_json::from_str::<DiGraphStore>(json).is_err());
    }
}
