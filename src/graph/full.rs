//! Graph with properties on both users and items.

use super::{equivalent, Graph, GraphConfig, GraphKind, PropertyGraph, PropertyLinker, PropertySource};
use crate::model::{Frame, Node, RatingRow, Value};
use crate::storage::{DiGraphStore, GraphStore};
use crate::Result;

/// A tripartite graph whose users also link to property nodes.
///
/// Users and items are configured independently. Each side looks content
/// records up in its own directory first and in the other side's directory
/// second. Any pair of nodes may be linked.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FullGraph {
    config: GraphConfig,
    store: DiGraphStore,
    users: PropertyLinker,
    items: PropertyLinker,
}

impl FullGraph {
    pub fn new(frame: &Frame, users: PropertySource, items: PropertySource) -> Result<Self> {
        Self::with_config(frame, users, items, GraphConfig::default())
    }

    pub fn with_config(
        frame: &Frame,
        users: PropertySource,
        items: PropertySource,
        config: GraphConfig,
    ) -> Result<Self> {
        let user_dir = users.contents_dir.clone();
        let item_dir = items.contents_dir.clone();
        let mut graph = Self {
            config,
            store: DiGraphStore::new(),
            users: PropertyLinker::new(users, item_dir.as_deref()),
            items: PropertyLinker::new(items, user_dir.as_deref()),
        };
        graph.create_graph();
        graph.populate_from_dataframe(frame)?;
        Ok(graph)
    }

    pub fn user_source(&self) -> &PropertySource {
        self.users.source()
    }

    pub fn item_source(&self) -> &PropertySource {
        self.items.source()
    }

    /// Add user `value` and, if it is new, its properties.
    pub fn add_user_tree(&mut self, value: impl Into<Value>) -> bool {
        let user = Node::user(value);
        if !self.store.add_node(user.clone()) {
            return false;
        }
        let found = self.users.properties_for(&user);
        self.link_properties(&user, found, None);
        true
    }
}

impl Graph for FullGraph {
    type Store = DiGraphStore;
    const KIND: GraphKind = GraphKind::Full;

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
        if self.store.add_node(user.clone()) {
            let found = self.users.properties_for(&user);
            self.link_properties(&user, found, Some(row));
        }
        if self.store.add_node(item.clone()) {
            let found = self.items.properties_for(&item);
            self.link_properties(&item, found, Some(row));
        }
        self.add_link(user, item, Some(row.score), row.label.as_deref());
    }
}

impl PropertyGraph for FullGraph {
    fn item_linker(&mut self) -> &mut PropertyLinker {
        &mut self.items
    }
}

impl PartialEq for FullGraph {
    fn eq(&self, other: &Self) -> bool {
        equivalent(self, other)
    }
}
