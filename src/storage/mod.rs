//! # Graph Store Trait
//!
//! This is the contract between the recommendation graphs and the structure
//! that actually holds nodes and edges. The graph layer decides *which*
//! nodes and links may exist; a store only keeps them.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `DiGraphStore` | `memory` | Arena-backed directed graph, one edge per ordered pair |
//!
//! Analysis over a store (centrality, dispersion, isomorphism) works on a
//! [`Topology`] snapshot and lives in `metrics` and `isomorphism`.

pub mod memory;
pub mod topology;
pub mod metrics;
pub mod isomorphism;

use crate::model::*;

pub use memory::DiGraphStore;
pub use topology::Topology;
pub use isomorphism::is_isomorphic;

// ============================================================================
// GraphStore Trait
// ============================================================================

/// The storage contract.
///
/// Nodes are keyed by their `(kind, value)` identity. Between any ordered
/// pair of nodes there is at most one edge; adding it again overwrites its
/// attributes. Iteration order is insertion order.
pub trait GraphStore: Default + Clone {
    // ========================================================================
    // Nodes
    // ========================================================================

    /// Insert a node. Returns false if it was already present.
    fn add_node(&mut self, node: Node) -> bool;

    fn contains(&self, node: &Node) -> bool;

    /// Resolve a reference to a stored node.
    ///
    /// Exact references must match `(kind, value)`; raw references resolve to
    /// the earliest-inserted node carrying the value.
    fn resolve(&self, node: &NodeRef) -> Option<Node>;

    /// All nodes, in insertion order.
    fn nodes(&self) -> Vec<Node>;

    /// All nodes of one kind, in insertion order.
    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<Node> {
        self.nodes().into_iter().filter(|n| n.kind() == kind).collect()
    }

    /// Remove nodes and every edge incident to them. Returns how many nodes
    /// were actually removed.
    fn remove_nodes<'a>(&mut self, nodes: impl IntoIterator<Item = &'a Node>) -> usize;

    fn node_count(&self) -> usize;

    // ========================================================================
    // Edges
    // ========================================================================

    /// Insert or overwrite the edge `from → to`.
    ///
    /// Returns false, leaving the store untouched, if either endpoint is
    /// absent.
    fn set_edge(&mut self, from: &Node, to: &Node, data: EdgeData) -> bool;

    /// Remove the edge `from → to`, returning its attributes.
    fn remove_edge(&mut self, from: &Node, to: &Node) -> Option<EdgeData>;

    fn edge(&self, from: &Node, to: &Node) -> Option<EdgeData>;

    /// Neighbours of a node, `None` if the node is absent.
    ///
    /// With `Direction::Both`, successors come first, then predecessors that
    /// are not also successors.
    fn neighbors(&self, node: &Node, dir: Direction) -> Option<Vec<Node>>;

    /// Every edge as `(from, to, data)`, grouped by source in insertion order.
    fn edges(&self) -> Vec<(Node, Node, EdgeData)>;

    fn edge_count(&self) -> usize;
}
