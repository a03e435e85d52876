//! User → item graph.

use super::{equivalent, Graph, GraphConfig, GraphKind};
use crate::model::{Frame, Node, RatingRow};
use crate::storage::{DiGraphStore, GraphStore};
use crate::Result;

/// Users linked to the items they rated, weighted by score.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BipartiteGraph {
    config: GraphConfig,
    store: DiGraphStore,
}

impl BipartiteGraph {
    /// Build a graph from a ratings table with the default configuration.
    pub fn new(frame: &Frame) -> Result<Self> {
        Self::with_config(frame, GraphConfig::default())
    }

    pub fn with_config(frame: &Frame, config: GraphConfig) -> Result<Self> {
        let mut graph = Self { config, store: DiGraphStore::new() };
        graph.create_graph();
        graph.populate_from_dataframe(frame)?;
        Ok(graph)
    }
}

impl Graph for BipartiteGraph {
    type Store = DiGraphStore;
    const KIND: GraphKind = GraphKind::Bipartite;

    fn store(&self) -> &DiGraphStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut DiGraphStore {
        &mut self.store
    }

    fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn add_rating(&mut self, row: &RatingRow) {
        let user = Node::user(row.from_id.clone());
        let item = Node::item(row.to_id.clone());
        self.store.add_node(user.clone());
        self.store.add_node(item.clone());
        self.add_link(user, item, Some(row.score), row.label.as_deref());
    }
}

impl PartialEq for BipartiteGraph {
    fn eq(&self, other: &Self) -> bool {
        equivalent(self, other)
    }
}
