//! Directed, weighted, labelled links between nodes.

use serde::{Deserialize, Serialize};

/// Traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

/// Attributes of the single edge stored for an ordered node pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub weight: f64,
    pub label: String,
}

impl EdgeData {
    pub fn new(weight: f64, label: impl Into<String>) -> Self {
        Self { weight, label: label.into() }
    }
}
