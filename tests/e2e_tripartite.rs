//! End-to-end tests for the tripartite user → item → property graph.
//!
//! Content records are written to a temporary directory per test, the way
//! an upstream content analyzer would leave them.

use pretty_assertions::assert_eq;
use recgraph::content::write_content_instance;
use recgraph::{
    Content, EdgeData, Frame, Graph, Node, PropertyGraph, PropertySource, TripartiteGraph, Value,
};
use tempfile::TempDir;

fn ratings() -> Frame {
    Frame::from_json_records(
        r#"[
            {"from_id": "1", "to_id": "tt0112281", "score": 0.8},
            {"from_id": "1", "to_id": "tt0112302", "score": 0.7},
            {"from_id": "2", "to_id": "tt0112281", "score": -0.4},
            {"from_id": "2", "to_id": "tt0112346", "score": 1.0},
            {"from_id": "3", "to_id": "tt0112453", "score": 0.1}
        ]"#,
    )
    .unwrap()
}

/// Records for three of the four rated movies, plus one unrated movie.
fn movies_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let records = [
        ("tt0112281", "Ted Demme", "Denis Leary"),
        ("tt0112302", "Mike Nichols", "Robin Williams"),
        ("tt0112346", "Ted Demme", "Kevin Spacey"),
        ("tt0114709", "http://dbpedia.org/resource/John_Lasseter", "Tom Hanks"),
    ];
    for (id, director, star) in records {
        let content = Content::new(id)
            .with_exogenous(Some("dbpedia"), [("film director", director), ("starring", star)])
            .unwrap()
            .with_exogenous(Some("imdb"), [("starring", star)])
            .unwrap();
        write_content_instance(dir.path(), &content).unwrap();
    }
    dir
}

fn graph(dir: &TempDir) -> TripartiteGraph {
    let items = PropertySource::new(dir.path())
        .with_representation("dbpedia")
        .with_properties(["film director"]);
    TripartiteGraph::new(&ratings(), items).unwrap()
}

// ============================================================================
// 1. Selected properties of one representation
// ============================================================================

#[test]
fn test_graph_created_with_properties() {
    let dir = movies_dir();
    let g = graph(&dir);

    assert_eq!(g.user_nodes().len(), 3);
    assert_eq!(g.item_nodes().len(), 4);
    // Ted Demme is shared by two movies.
    assert_eq!(
        g.property_nodes(),
        vec![Node::property("Ted Demme"), Node::property("Mike Nichols")]
    );
    assert_eq!(
        g.get_properties("tt0112281"),
        vec![("film director".to_owned(), Node::property("Ted Demme"))]
    );
    assert_eq!(
        g.get_link_data("tt0112346", "Ted Demme"),
        Some(EdgeData::new(0.5, "film director"))
    );
    // No record for this movie: no properties, no failure.
    assert!(g.get_properties("tt0112453").is_empty());
}

// ============================================================================
// 2. The other two strategies, and none
// ============================================================================

#[test]
fn test_whole_representation_strategy() {
    let dir = movies_dir();
    let g = TripartiteGraph::new(&ratings(), PropertySource::new(dir.path()).with_representation(0usize)).unwrap();

    let props = g.get_properties("tt0112302");
    assert_eq!(
        props,
        vec![
            ("film director".to_owned(), Node::property("Mike Nichols")),
            ("starring".to_owned(), Node::property("Robin Williams")),
        ]
    );
}

#[test]
fn test_properties_across_representations() {
    let dir = movies_dir();
    let g = TripartiteGraph::new(&ratings(), PropertySource::new(dir.path()).with_properties(["starring"])).unwrap();

    // Both representations name the same actor: one property node, one
    // link, labelled by the last representation that produced it.
    assert_eq!(
        g.get_properties("tt0112346"),
        vec![("starring#1#imdb".to_owned(), Node::property("Kevin Spacey"))]
    );
    assert_eq!(g.property_nodes().len(), 3);
}

#[test]
fn test_renamed_labels_without_external_ids() {
    let dir = tempfile::tempdir().unwrap();
    let movie = Content::new("m1")
        .with_exogenous(None, [("director", "Nolan")])
        .unwrap()
        .with_exogenous(None, [("director", "Spielberg")])
        .unwrap();
    write_content_instance(dir.path(), &movie).unwrap();
    let frame = Frame::from_json_records(r#"[{"from_id": "u1", "to_id": "m1", "score": 1.0}]"#).unwrap();

    let across = TripartiteGraph::new(&frame, PropertySource::new(dir.path()).with_properties(["director"])).unwrap();
    assert_eq!(
        across.get_properties("m1"),
        vec![
            ("director#0".to_owned(), Node::property("Nolan")),
            ("director#1".to_owned(), Node::property("Spielberg")),
        ]
    );

    let first = TripartiteGraph::new(&frame, PropertySource::new(dir.path()).with_representation(0usize)).unwrap();
    assert_eq!(first.get_properties("m1"), vec![("director".to_owned(), Node::property("Nolan"))]);
}

#[test]
fn test_no_strategy_no_properties() {
    let dir = movies_dir();
    let g = TripartiteGraph::new(&ratings(), PropertySource::new(dir.path())).unwrap();
    assert!(g.property_nodes().is_empty());
    assert_eq!(g.item_nodes().len(), 4);
}

#[test]
fn test_missing_representation_is_skipped() {
    let dir = movies_dir();
    let items = PropertySource::new(dir.path()).with_representation("wikidata");
    let g = TripartiteGraph::new(&ratings(), items).unwrap();
    assert!(g.property_nodes().is_empty());
}

// ============================================================================
// 3. Property preferences come from `<label>_score` columns
// ============================================================================

#[test]
fn test_property_preference_column() {
    let dir = movies_dir();
    let frame = Frame::from_json_records(
        r#"[
            {"from_id": "1", "to_id": "tt0112281", "score": 0.8, "film director_score": 0.95},
            {"from_id": "1", "to_id": "tt0112302", "score": 0.7}
        ]"#,
    )
    .unwrap();
    let items = PropertySource::new(dir.path())
        .with_representation("dbpedia")
        .with_properties(["film director"]);
    let g = TripartiteGraph::new(&frame, items).unwrap();

    assert_eq!(g.get_link_data("tt0112281", "Ted Demme").unwrap().weight, 0.95);
    assert_eq!(g.get_link_data("tt0112302", "Mike Nichols").unwrap().weight, 0.5);
}

// ============================================================================
// 4. Property nodes and links
// ============================================================================

#[test]
fn test_add_property_nodes() {
    let dir = movies_dir();
    let mut g = graph(&dir);

    assert!(!g.is_property_node("Nolan"));
    g.add_property_node("Nolan");
    assert!(g.is_property_node("Nolan"));

    assert_eq!(g.add_property_nodes(["prop1", "prop2", "prop3"]), 3);
    assert!(["prop1", "prop2", "prop3"].iter().all(|p| g.is_property_node(*p)));

    // Same id as an existing user: both nodes exist.
    assert!(g.add_property_node("1"));
    assert!(g.is_property_node("1"));
    assert!(g.is_user_node("1"));
}

#[test]
fn test_item_property_links() {
    let dir = movies_dir();
    let mut g = graph(&dir);

    g.add_item_node("Tenet");
    g.add_property_node("Nolan");
    g.add_link("Tenet", "Nolan", Some(0.5), Some("Director"));
    assert_eq!(g.get_properties("Tenet"), vec![("Director".to_owned(), Node::property("Nolan"))]);

    g.add_item_node("i_list");
    g.add_property_nodes(["prop1", "prop2", "prop3"]);
    g.add_links("i_list", ["prop1", "prop2", "prop3"], Some(0.5), Some("starring"));
    let expected: Vec<(String, Node)> = ["prop1", "prop2", "prop3"]
        .iter()
        .map(|p| ("starring".to_owned(), Node::property(*p)))
        .collect();
    assert_eq!(g.get_properties("i_list"), expected);

    // Property → item is allowed too.
    g.add_item_node("Inception");
    g.add_link("Nolan", "Inception", Some(0.5), Some("Director of"));
    assert_eq!(g.get_link_data("Nolan", "Inception"), Some(EdgeData::new(0.5, "Director of")));

    assert!(!g.add_link("i_new", "prop_new", Some(0.5), Some("PropertyNew")));
    assert!(!g.is_item_node("i_new"));
    assert!(!g.is_property_node("prop_new"));
}

#[test]
fn test_user_property_links_refused() {
    let dir = movies_dir();
    let mut g = graph(&dir);

    g.add_user_node("u1");
    g.add_property_node("Nolan");
    assert!(!g.add_link("u1", "Nolan", Some(0.5), Some("Friend")));
    assert!(g.get_properties("u1").is_empty());

    g.add_user_node("u2");
    assert!(!g.add_link("Nolan", "u2", Some(0.5), Some("Friend")));
    assert_eq!(g.get_link_data("Nolan", "u2"), None);
}

#[test]
fn test_voted_contents_exclude_properties() {
    let dir = movies_dir();
    let g = graph(&dir);
    assert_eq!(g.get_voted_contents("tt0112281"), Some(vec![]));
    assert_eq!(
        g.get_voted_contents("1"),
        Some(vec![Node::item("tt0112281"), Node::item("tt0112302")])
    );
}

// ============================================================================
// 5. Item trees
// ============================================================================

#[test]
fn test_add_item_tree() {
    let dir = movies_dir();
    let mut g = graph(&dir);

    assert!(!g.is_item_node("tt0114709"));
    assert!(!g.is_property_node("http://dbpedia.org/resource/John_Lasseter"));
    assert!(g.add_item_tree("tt0114709"));
    assert!(g.is_item_node("tt0114709"));
    assert!(g.is_property_node("http://dbpedia.org/resource/John_Lasseter"));

    // An existing item is left alone.
    assert!(!g.add_item_tree("tt0114709"));

    // An id known only as a user becomes an item too, without properties.
    g.add_user_node("20");
    assert!(g.add_item_tree("20"));
    assert!(g.is_item_node("20"));
    assert!(g.get_properties(Node::item("20")).is_empty());
}

// ============================================================================
// 6. Conversion keeps the ratings apart from property links
// ============================================================================

#[test]
fn test_convert_to_dataframe() {
    let dir = movies_dir();
    let g = graph(&dir);
    let properties = g.property_nodes();

    let frame = g.convert_to_dataframe(true, true);
    assert!(frame.has_column("label"));

    let mut rated: Vec<(String, String)> = frame
        .rows()
        .filter(|r| !properties.iter().any(|p| p == r.get("to_id").unwrap()))
        .map(|r| (r.get("from_id").unwrap().to_string(), r.get("to_id").unwrap().to_string()))
        .collect();
    rated.sort();

    let mut expected: Vec<(String, String)> = ratings()
        .rows()
        .map(|r| (r.get("from_id").unwrap().to_string(), r.get("to_id").unwrap().to_string()))
        .collect();
    expected.sort();
    assert_eq!(rated, expected);

    // Property links appear with item sources.
    assert_eq!(frame.len(), ratings().len() + 3);
    assert!(frame.column("from_id").unwrap().iter().all(|v| v != &&Value::from("Ted Demme")));
}

// ============================================================================
// 7. Copies
// ============================================================================

#[test]
fn test_copy_and_mutate() {
    let dir = movies_dir();
    let g = graph(&dir);
    let mut copy = g.copy();
    assert_eq!(copy, g);

    copy.add_user_node("new_user");
    assert_ne!(copy, g);
    assert!(!g.is_user_node("new_user"));
}
