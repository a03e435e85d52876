//! # recgraph — Heterogeneous Graphs for Recommender Systems
//!
//! Typed user / item / property graphs built from ratings tables, with
//! properties attached lazily from per-entity content records.
//!
//! ## Design Principles
//!
//! 1. **Typed identity**: a node is `(kind, value)`; the same id can be a
//!    user, an item and a property at once, as three distinct nodes
//! 2. **Trait-first**: `GraphStore` is the contract between graphs and
//!    storage, `Graph` / `PropertyGraph` hold every shared operation
//! 3. **Degrade, don't abort**: only a malformed ratings table is an error;
//!    missing content, nodes or links are logged and skipped
//! 4. **Arena storage**: nodes live in slots, edges are keyed by slot pairs,
//!    so cycles need no special ownership
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recgraph::{Frame, Graph, PropertyGraph, PropertySource, TripartiteGraph};
//!
//! # fn example() -> recgraph::Result<()> {
//! let ratings = Frame::from_json_records(
//!     r#"[{"from_id": "u1", "to_id": "tt0112281", "score": 0.8}]"#,
//! )?;
//!
//! let items = PropertySource::new("contents/movies")
//!     .with_representation("dbpedia")
//!     .with_properties(["film director"]);
//! let graph = TripartiteGraph::new(&ratings, items)?;
//!
//! for (label, property) in graph.get_properties("tt0112281") {
//!     println!("{label}: {property}");
//! }
//! graph.serialize("out", "movies_graph")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Graphs
//!
//! | Graph | Nodes | Property links |
//! |-------|-------|----------------|
//! | `BipartiteGraph` | user, item | — |
//! | `TripartiteGraph` | user, item, property | item → property |
//! | `FullGraph` | user, item, property | item → property, user → property |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod content;
pub mod storage;
pub mod graph;
pub mod algorithm;
pub mod evaluation;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Node, NodeKind, NodeRef, Value,
    Direction, EdgeData, Frame, RatingRow,
};

// ============================================================================
// Re-exports: Content
// ============================================================================

pub use content::{Content, ContentLoader, ExogenousRepresentation, RepresentationId};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use storage::{DiGraphStore, GraphStore};

// ============================================================================
// Re-exports: Graphs
// ============================================================================

pub use graph::{
    Graph, PropertyGraph,
    BipartiteGraph, TripartiteGraph, FullGraph,
    GraphConfig, PropertySource, GraphKind, load_graph,
};

// ============================================================================
// Re-exports: Evaluation
// ============================================================================

pub use evaluation::{RankSplit, RankingRun};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Ratings table is missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Evaluation run error: {0}")]
    RunState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
