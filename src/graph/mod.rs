//! # Recommendation Graphs
//!
//! A graph is built once from a ratings [`Frame`] and then mutated through
//! the operations of the [`Graph`] trait. Every operation that names a node
//! takes anything convertible to [`NodeRef`]: an exact [`Node`], or a raw
//! value that resolves to the earliest-inserted node carrying it.
//!
//! | Graph | Node kinds | Properties |
//! |-------|-----------|------------|
//! | [`BipartiteGraph`] | user, item | none |
//! | [`TripartiteGraph`] | user, item, property | linked from items |
//! | [`FullGraph`] | user, item, property | linked from items and users |
//!
//! Misuse never fails: linking absent nodes, removing absent links or
//! querying absent nodes logs a warning and does nothing. Only a malformed
//! ratings table is an error.

pub mod config;
pub mod persist;
pub mod properties;

mod bipartite;
mod full;
mod tripartite;

pub use bipartite::BipartiteGraph;
pub use config::{GraphConfig, PropertySource, DEFAULT_SCORE_LABEL, DEFAULT_WEIGHT};
pub use full::FullGraph;
pub use persist::{load_graph, read_graph_info, GraphKind, SavedGraphInfo, FORMAT_VERSION};
pub use properties::{extract_properties, ExtractedProperty, ExtractionStrategy, PropertyLinker};
pub use tripartite::TripartiteGraph;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::{Direction, EdgeData, Frame, Node, NodeKind, NodeRef, RatingRow, Value};
use crate::model::frame::{FROM_ID, LABEL, SCORE, TO_ID};
use crate::storage::{is_isomorphic, metrics, GraphStore};
use crate::Result;

// ============================================================================
// Graph trait
// ============================================================================

/// Operations shared by every recommendation graph.
///
/// Implementors supply storage access, the per-row population step and,
/// optionally, a link policy; everything else is provided.
pub trait Graph: Clone {
    type Store: GraphStore;

    /// Tag written into serialized files.
    const KIND: GraphKind;

    fn store(&self) -> &Self::Store;
    fn store_mut(&mut self) -> &mut Self::Store;
    fn config(&self) -> &GraphConfig;

    /// Add the nodes, properties and link described by one rating row.
    fn add_rating(&mut self, row: &RatingRow);

    /// Whether a link `from → to` may exist in this kind of graph.
    fn accepts_link(&self, _from: &Node, _to: &Node) -> bool {
        true
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Reset to an empty store.
    fn create_graph(&mut self) {
        *self.store_mut() = Self::Store::default();
    }

    /// Add every row of `frame`.
    ///
    /// The whole frame is validated first; on error the graph is untouched.
    fn populate_from_dataframe(&mut self, frame: &Frame) -> Result<()> {
        let rows = frame.rating_rows()?;
        let total = rows.len();
        let span = tracing::info_span!("populate", graph = %Self::KIND, rows = total);
        let _guard = span.enter();

        let step = (total / 10).max(1);
        for (i, row) in rows.iter().enumerate() {
            self.add_rating(row);
            let done = i + 1;
            if done % step == 0 || done == total {
                tracing::info!(done, total, "creating graph");
            }
        }
        Ok(())
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    fn user_nodes(&self) -> Vec<Node> {
        self.store().nodes_of_kind(NodeKind::User)
    }

    fn item_nodes(&self) -> Vec<Node> {
        self.store().nodes_of_kind(NodeKind::Item)
    }

    /// Add a user node. Returns false if it already existed.
    fn add_user_node(&mut self, value: impl Into<Value>) -> bool {
        self.store_mut().add_node(Node::user(value))
    }

    /// Add several user nodes, returning how many were new.
    fn add_user_nodes<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) -> usize {
        values.into_iter().map(|v| self.add_user_node(v)).filter(|&added| added).count()
    }

    fn add_item_node(&mut self, value: impl Into<Value>) -> bool {
        self.store_mut().add_node(Node::item(value))
    }

    fn add_item_nodes<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) -> usize {
        values.into_iter().map(|v| self.add_item_node(v)).filter(|&added| added).count()
    }

    /// Resolve a reference to the node it names, if present.
    fn resolve(&self, node: impl Into<NodeRef>) -> Option<Node> {
        self.store().resolve(&node.into())
    }

    fn node_exists(&self, node: impl Into<NodeRef>) -> bool {
        self.resolve(node).is_some()
    }

    /// Whether a user node with this value exists.
    fn is_user_node(&self, node: impl Into<NodeRef>) -> bool {
        self.has_node_of_kind(node, NodeKind::User)
    }

    fn is_item_node(&self, node: impl Into<NodeRef>) -> bool {
        self.has_node_of_kind(node, NodeKind::Item)
    }

    #[doc(hidden)]
    fn has_node_of_kind(&self, node: impl Into<NodeRef>, kind: NodeKind) -> bool {
        node.into().as_kind(kind).is_some_and(|n| self.store().contains(&n))
    }

    /// Remove nodes together with every link touching them. References
    /// that name no node are skipped. Returns how many nodes were removed.
    fn remove_nodes_from_graph<R: Into<NodeRef>>(&mut self, nodes: impl IntoIterator<Item = R>) -> usize {
        let resolved: Vec<Node> = nodes.into_iter().filter_map(|n| self.resolve(n)).collect();
        self.store_mut().remove_nodes(&resolved)
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Create or overwrite the link `start → end`.
    ///
    /// `weight` and `label` fall back to the graph defaults. Both endpoints
    /// must already exist and the link must be allowed by the graph kind;
    /// otherwise a warning is logged and nothing changes.
    fn add_link(
        &mut self,
        start: impl Into<NodeRef>,
        end: impl Into<NodeRef>,
        weight: Option<f64>,
        label: Option<&str>,
    ) -> bool {
        let (start, end) = (start.into(), end.into());
        let (Some(from), Some(to)) = (self.store().resolve(&start), self.store().resolve(&end)) else {
            tracing::warn!(from = %start.value(), to = %end.value(), "both nodes must exist to be linked; link not added");
            return false;
        };
        if !self.accepts_link(&from, &to) {
            tracing::warn!(
                from = %from, from_kind = %from.kind(), to = %to, to_kind = %to.kind(),
                "link not allowed in a {} graph",
                Self::KIND
            );
            return false;
        }

        let config = self.config();
        let weight = weight.unwrap_or(config.default_weight);
        if !weight.is_finite() {
            tracing::warn!(from = %from, to = %to, weight, "link weight must be finite; link not added");
            return false;
        }
        let data = EdgeData::new(weight, label.unwrap_or(config.default_score_label.as_str()));
        self.store_mut().set_edge(&from, &to, data)
    }

    /// Link `start` to each of `ends`, returning how many links were made.
    fn add_links<R: Into<NodeRef>>(
        &mut self,
        start: impl Into<NodeRef>,
        ends: impl IntoIterator<Item = R>,
        weight: Option<f64>,
        label: Option<&str>,
    ) -> usize {
        let start = start.into();
        ends.into_iter()
            .map(|end| self.add_link(start.clone(), end, weight, label))
            .filter(|&linked| linked)
            .count()
    }

    /// Remove the link `start → end`, returning its data. Warns if absent.
    fn remove_link(&mut self, start: impl Into<NodeRef>, end: impl Into<NodeRef>) -> Option<EdgeData> {
        let (start, end) = (start.into(), end.into());
        let removed = match (self.store().resolve(&start), self.store().resolve(&end)) {
            (Some(from), Some(to)) => self.store_mut().remove_edge(&from, &to),
            _ => None,
        };
        if removed.is_none() {
            tracing::warn!(from = %start.value(), to = %end.value(), "no link to remove");
        }
        removed
    }

    /// Weight and label of the link `start → end`.
    fn get_link_data(&self, start: impl Into<NodeRef>, end: impl Into<NodeRef>) -> Option<EdgeData> {
        let from = self.resolve(start)?;
        let to = self.resolve(end)?;
        self.store().edge(&from, &to)
    }

    /// Nodes with a link into `node`; `None` (with a warning) if absent.
    fn get_predecessors(&self, node: impl Into<NodeRef>) -> Option<Vec<Node>> {
        self.neighbors_of(node.into(), Direction::Incoming)
    }

    /// Nodes `node` links to; `None` (with a warning) if absent.
    fn get_successors(&self, node: impl Into<NodeRef>) -> Option<Vec<Node>> {
        self.neighbors_of(node.into(), Direction::Outgoing)
    }

    #[doc(hidden)]
    fn neighbors_of(&self, node: NodeRef, dir: Direction) -> Option<Vec<Node>> {
        let found = self.store().resolve(&node).and_then(|n| self.store().neighbors(&n, dir));
        if found.is_none() {
            tracing::warn!(node = %node.value(), "node not found");
        }
        found
    }

    /// Successors that are users or items: what the node rated, as opposed
    /// to what describes it.
    fn get_voted_contents(&self, node: impl Into<NodeRef>) -> Option<Vec<Node>> {
        self.get_successors(node)
            .map(|succ| succ.into_iter().filter(|n| !n.is_property()).collect())
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Flatten the graph into a `from_id, to_id, score[, label]` table.
    ///
    /// Only user and item nodes are used as sources; their links to
    /// property nodes are included. With `only_values` cells hold raw
    /// values, otherwise `Value::Node`.
    fn convert_to_dataframe(&self, only_values: bool, with_label: bool) -> Frame {
        let mut columns: Vec<String> = [FROM_ID, TO_ID, SCORE].iter().map(|c| c.to_string()).collect();
        if with_label {
            columns.push(LABEL.to_owned());
        }
        let cell = |node: &Node| {
            if only_values { node.value().clone() } else { Value::from(node.clone()) }
        };

        let store = self.store();
        let mut rows = Vec::new();
        for source in self.user_nodes().into_iter().chain(self.item_nodes()) {
            for target in store.neighbors(&source, Direction::Outgoing).unwrap_or_default() {
                let Some(data) = store.edge(&source, &target) else { continue };
                let mut row = vec![cell(&source), cell(&target), Value::Float(data.weight)];
                if with_label {
                    row.push(Value::String(data.label));
                }
                rows.push(row);
            }
        }
        Frame::from_rows_unchecked(columns, rows)
    }

    /// An independent deep copy.
    fn copy(&self) -> Self {
        self.clone()
    }

    /// Compare node sets and links exactly, rather than up to isomorphism
    /// as `==` does.
    fn identical_to(&self, other: &Self) -> bool {
        let (a, b) = (self.store(), other.store());
        if self.config() != other.config() || a.node_count() != b.node_count() || a.edge_count() != b.edge_count() {
            return false;
        }
        a.nodes().iter().all(|n| b.contains(n))
            && a.edges().into_iter().all(|(from, to, data)| b.edge(&from, &to) == Some(data))
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write the graph to `{dir}/{file_name}`, adding `.xz` when missing and
    /// creating `dir` if needed. Returns the written path.
    fn serialize(&self, dir: impl AsRef<Path>, file_name: &str) -> Result<PathBuf>
    where
        Self: serde::Serialize,
    {
        persist::save_graph(self, dir.as_ref(), file_name)
    }

    // ========================================================================
    // Metrics
    // ========================================================================

    fn degree_centrality(&self) -> HashMap<Node, f64> {
        metrics::degree_centrality(self.store())
    }

    fn closeness_centrality(&self) -> HashMap<Node, f64> {
        metrics::closeness_centrality(self.store())
    }

    fn dispersion(&self) -> HashMap<Node, HashMap<Node, f64>> {
        metrics::dispersion(self.store())
    }
}

/// Graph equality: same default label, same default weight and the same
/// shape. Node values are not compared, so two graphs over different ids
/// are equal when their link structure matches; see
/// [`Graph::identical_to`] for an exact comparison.
pub(crate) fn equivalent<G: Graph>(a: &G, b: &G) -> bool {
    a.config().default_score_label == b.config().default_score_label
        && a.config().default_weight == b.config().default_weight
        && is_isomorphic(a.store(), b.store())
}

// ============================================================================
// PropertyGraph trait
// ============================================================================

/// Graphs with property nodes hanging off items (and, for
/// [`FullGraph`], users).
pub trait PropertyGraph: Graph {
    /// Property configuration and content lookup for items.
    fn item_linker(&mut self) -> &mut PropertyLinker;

    fn property_nodes(&self) -> Vec<Node> {
        self.store().nodes_of_kind(NodeKind::Property)
    }

    fn add_property_node(&mut self, value: impl Into<Value>) -> bool {
        self.store_mut().add_node(Node::property(value))
    }

    fn add_property_nodes<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) -> usize {
        values.into_iter().map(|v| self.add_property_node(v)).filter(|&added| added).count()
    }

    fn is_property_node(&self, node: impl Into<NodeRef>) -> bool {
        self.has_node_of_kind(node, NodeKind::Property)
    }

    /// `(link label, property node)` for every property successor of
    /// `node`, empty (with a warning) if the node is absent.
    fn get_properties(&self, node: impl Into<NodeRef>) -> Vec<(String, Node)> {
        let Some(owner) = self.resolve(node) else {
            tracing::warn!("node not found; it has no properties");
            return Vec::new();
        };
        let store = self.store();
        store
            .neighbors(&owner, Direction::Outgoing)
            .unwrap_or_default()
            .into_iter()
            .filter(Node::is_property)
            .filter_map(|prop| store.edge(&owner, &prop).map(|data| (data.label, prop)))
            .collect()
    }

    /// Add item `value` and, if it is new, its properties. Property links
    /// use the default weight since there is no rating row to read from.
    fn add_item_tree(&mut self, value: impl Into<Value>) -> bool {
        let item = Node::item(value);
        if !self.store_mut().add_node(item.clone()) {
            return false;
        }
        let found = self.item_linker().properties_for(&item);
        self.link_properties(&item, found, None);
        true
    }

    /// Add property nodes for `found` and link `owner` to them.
    ///
    /// Link weights come from the row's `<property>_score` column when
    /// present, otherwise from the default weight.
    fn link_properties(&mut self, owner: &Node, found: Vec<ExtractedProperty>, row: Option<&RatingRow>) -> usize {
        let mut linked = 0;
        for prop in found {
            let weight = row
                .and_then(|r| r.preference(&prop.source_property))
                .unwrap_or(self.config().default_weight);
            let node = Node::property(prop.value);
            self.store_mut().add_node(node.clone());
            if self.add_link(owner.clone(), node, Some(weight), Some(prop.label.as_str())) {
                linked += 1;
            }
        }
        tracing::debug!(owner = %owner, kind = %owner.kind(), linked, "attached properties");
        linked
    }
}
