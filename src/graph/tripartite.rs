//! User → item → property graph.

use super::{equivalent, Graph, GraphConfig, GraphKind, PropertyGraph, PropertyLinker, PropertySource};
use crate::model::{Frame, Node, RatingRow};
use crate::storage::{DiGraphStore, GraphStore};
use crate::Result;

/// A bipartite graph whose items also link to property nodes read from
/// their content records.
///
/// Properties of an item are attached once, when the item node is created;
/// later ratings of the same item do not reload its record. Links between
/// users and properties are refused in both directions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TripartiteGraph {
    config: GraphConfig,
    store: DiGraphStore,
    items: PropertyLinker,
}

impl TripartiteGraph {
    pub fn new(frame: &Frame, items: PropertySource) -> Result<Self> {
        Self::with_config(frame, items, GraphConfig::default())
    }

    pub fn with_config(frame: &Frame, items: PropertySource, config: GraphConfig) -> Result<Self> {
        let mut graph = Self {
            config,
            store: DiGraphStore::new(),
            items: PropertyLinker::new(items, None),
        };
        graph.create_graph();
        graph.populate_from_dataframe(frame)?;
        Ok(graph)
    }

    pub fn item_source(&self) -> &PropertySource {
        self.items.source()
    }
}

impl Graph for TripartiteGraph {
    type Store = DiGraphStore;
    const KIND: GraphKind = GraphKind::Tripartite;

    fn store(&self) -> &DiGraphStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut DiGraphStore {
        &mut self.store
    }

    fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn accepts_link(&self, from: &Node, to: &Node) -> bool {
        !(from.is_user() && to.is_property() || from.is_property() && to.is_user())
    }

    fn add_rating(&mut self, row: &RatingRow) {
        let user = Node::user(row.from_id.clone());
        let item = Node::item(row.to_id.clone());
        self.store.add_node(user.clone());
        if self.store.add_node(item.clone()) {
            let found = self.items.properties_for(&item);
            self.link_properties(&item, found, Some(row));
        }
        self.add_link(user, item, Some(row.score), row.label.as_deref());
    }
}

impl PropertyGraph for TripartiteGraph {
    fn item_linker(&mut self) -> &mut PropertyLinker {
        &mut self.items
    }
}

impl PartialEq for TripartiteGraph {
    fn eq(&self, other: &Self) -> bool {
        equivalent(self, other)
    }
}
