//! Helpers for graph-based recommenders.
//!
//! A recommender scores nodes for a user and returns a map `node → score`.
//! These functions read the user's profile from the graph and trim such a
//! map down to the nodes worth recommending.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::graph::Graph;
use crate::model::{Direction, Node, Value};
use crate::storage::GraphStore;

/// Scores produced by a recommender, keyed by node.
pub type Scores = HashMap<Node, f64>;

/// The nodes a user links to, with the link weights.
///
/// ```text
/// i1 <--0.2-- u1 --0.4--> i2      extract_profile(g, "u1") == {i1: 0.2, i2: 0.4}
/// ```
///
/// Empty if the user is not in the graph.
pub fn extract_profile<G: Graph>(graph: &G, user_id: impl Into<Value>) -> Scores {
    let user = Node::user(user_id);
    let store = graph.store();
    store
        .neighbors(&user, Direction::Outgoing)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|succ| store.edge(&user, &succ).map(|data| (succ, data.weight)))
        .collect()
}

/// Which nodes [`clean_result`] drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    pub remove_users: bool,
    /// Drop nodes the user already links to.
    pub remove_profile: bool,
    pub remove_properties: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self { remove_users: true, remove_profile: true, remove_properties: true }
    }
}

/// Drop users, already-rated nodes and property nodes from `result`, as
/// selected by `options`.
pub fn clean_result<G: Graph>(graph: &G, result: &Scores, user_id: impl Into<Value>, options: CleanOptions) -> Scores {
    let profile: HashSet<Node> = if options.remove_profile {
        extract_profile(graph, user_id).into_keys().collect()
    } else {
        HashSet::new()
    };

    result
        .iter()
        .filter(|(node, _)| {
            !(options.remove_users && node.is_user()
                || options.remove_profile && profile.contains(*node)
                || options.remove_properties && node.is_property())
        })
        .map(|(node, score)| (node.clone(), *score))
        .collect()
}

/// Keep only the nodes whose value appears in `filter_list`.
pub fn filter_result(result: &Scores, filter_list: &[Value]) -> Scores {
    let wanted: HashSet<&Value> = filter_list.iter().collect();
    result
        .iter()
        .filter(|(node, _)| wanted.contains(node.value()))
        .map(|(node, score)| (node.clone(), *score))
        .collect()
}

/// Sort `result` by descending score, ties broken by node order, keeping
/// at most `recs_number` entries.
pub fn rank_result(result: &Scores, recs_number: Option<usize>) -> Vec<(Node, f64)> {
    let mut ranked: Vec<(Node, f64)> = result.iter().map(|(n, s)| (n.clone(), *s)).collect();
    ranked.sort_by(|(na, sa), (nb, sb)| sb.partial_cmp(sa).unwrap_or(Ordering::Equal).then_with(|| na.cmp(nb)));
    if let Some(n) = recs_number {
        ranked.truncate(n);
    }
    ranked
}
