//! Property-based tests over randomly generated ratings tables.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use recgraph::{BipartiteGraph, Frame, Graph, GraphStore, Node, Value};

/// Up to 40 `(user, item, score)` rows over small id pools, so repeated
/// pairs and shared ids are common.
fn rating_rows() -> impl Strategy<Value = Vec<(u8, u8, f64)>> {
    prop::collection::vec((0u8..8, 0u8..8, -1.0f64..1.0), 0..40)
}

fn frame(rows: &[(u8, u8, f64)]) -> Frame {
    let (from, to, score) = rows.iter().fold(
        (Vec::new(), Vec::new(), Vec::new()),
        |(mut f, mut t, mut s), (u, i, r)| {
            f.push(Value::from(format!("u{u}")));
            t.push(Value::from(format!("i{i}")));
            s.push(Value::from(*r));
            (f, t, s)
        },
    );
    Frame::from_columns(vec![("from_id", from), ("to_id", to), ("score", score)]).unwrap()
}

proptest! {
    // ========================================================================
    // 1. One node per distinct id, one link per distinct pair
    // ========================================================================

    #[test]
    fn test_counts_match_distinct_ids(rows in rating_rows()) {
        let g = BipartiteGraph::new(&frame(&rows)).unwrap();

        let users: HashSet<u8> = rows.iter().map(|r| r.0).collect();
        let items: HashSet<u8> = rows.iter().map(|r| r.1).collect();
        let pairs: HashSet<(u8, u8)> = rows.iter().map(|r| (r.0, r.1)).collect();

        prop_assert_eq!(g.user_nodes().len(), users.len());
        prop_assert_eq!(g.item_nodes().len(), items.len());
        prop_assert_eq!(g.store().edge_count(), pairs.len());
    }

    // ========================================================================
    // 2. The last row for a pair sets the link weight
    // ========================================================================

    #[test]
    fn test_last_row_wins(rows in rating_rows()) {
        let g = BipartiteGraph::new(&frame(&rows)).unwrap();

        let mut last: HashMap<(u8, u8), f64> = HashMap::new();
        for (u, i, s) in &rows {
            last.insert((*u, *i), *s);
        }
        for ((u, i), score) in last {
            let data = g.get_link_data(Node::user(format!("u{u}")), Node::item(format!("i{i}")));
            prop_assert_eq!(data.map(|d| d.weight), Some(score));
        }
    }

    // ========================================================================
    // 3. Adding nodes that exist changes nothing
    // ========================================================================

    #[test]
    fn test_re_adding_nodes_is_idempotent(rows in rating_rows()) {
        let mut g = BipartiteGraph::new(&frame(&rows)).unwrap();
        let before = g.copy();

        let users: Vec<String> = rows.iter().map(|r| format!("u{}", r.0)).collect();
        let items: Vec<String> = rows.iter().map(|r| format!("i{}", r.1)).collect();
        prop_assert_eq!(g.add_user_nodes(users), 0);
        prop_assert_eq!(g.add_item_nodes(items), 0);
        prop_assert!(g.identical_to(&before));
    }

    // ========================================================================
    // 4. Copies are equal, and the table form rebuilds an equal graph
    // ========================================================================

    #[test]
    fn test_copy_and_table_round_trip(rows in rating_rows()) {
        let g = BipartiteGraph::new(&frame(&rows)).unwrap();
        prop_assert!(g.copy() == g);

        let rebuilt = BipartiteGraph::new(&g.convert_to_dataframe(false, true)).unwrap();
        prop_assert!(rebuilt.identical_to(&g));
    }

    // ========================================================================
    // 5. Removed nodes leave no dangling links
    // ========================================================================

    #[test]
    fn test_removal_leaves_no_references(rows in rating_rows(), drop_users in prop::collection::vec(0u8..8, 0..4)) {
        let mut g = BipartiteGraph::new(&frame(&rows)).unwrap();
        let removed: Vec<Node> = drop_users.iter().map(|u| Node::user(format!("u{u}"))).collect();
        g.remove_nodes_from_graph(removed.iter());

        for node in &removed {
            prop_assert!(!g.node_exists(node));
        }
        for (from, to, _) in g.store().edges() {
            prop_assert!(!removed.contains(&from));
            prop_assert!(!removed.contains(&to));
        }
        for item in g.item_nodes() {
            let preds = g.get_predecessors(&item).unwrap_or_default();
            prop_assert!(preds.iter().all(|p| !removed.contains(p)));
        }
    }
}
