//! # Content records
//!
//! A content record is the serialized description of one user or item,
//! produced upstream by a content analyzer. The graph only reads its
//! exogenous representations: named groups of `property → value` pairs
//! (e.g. the "dbpedia" view of a movie).
//!
//! Each representation has an internal id (its position, `0, 1, 2, ...`)
//! and an optional external id chosen by whoever produced it. Either one
//! can be used to look the representation up.

pub mod loader;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Value;
use crate::{Error, Result};

pub use loader::{load_content_instance, write_content_instance, ContentCache, ContentLoader};

// ============================================================================
// Representation ids
// ============================================================================

/// Key of an exogenous representation: its internal position or its
/// external alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepresentationId {
    Internal(usize),
    External(String),
}

impl fmt::Display for RepresentationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepresentationId::Internal(i) => write!(f, "{i}"),
            RepresentationId::External(s) => write!(f, "{s}"),
        }
    }
}

impl From<usize> for RepresentationId { fn from(v: usize) -> Self { RepresentationId::Internal(v) } }
impl From<&str> for RepresentationId { fn from(v: &str) -> Self { RepresentationId::External(v.to_owned()) } }
impl From<String> for RepresentationId { fn from(v: String) -> Self { RepresentationId::External(v) } }

// ============================================================================
// Exogenous representation
// ============================================================================

/// One named group of properties attached to a content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExogenousRepresentation {
    pub internal_id: usize,
    pub external_id: Option<String>,
    pub properties: BTreeMap<String, Value>,
}

impl ExogenousRepresentation {
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    pub fn matches(&self, id: &RepresentationId) -> bool {
        match id {
            RepresentationId::Internal(i) => self.internal_id == *i,
            RepresentationId::External(s) => self.external_id.as_deref() == Some(s.as_str()),
        }
    }
}

// ============================================================================
// Content
// ============================================================================

/// Serialized per-entity data bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub content_id: String,
    #[serde(default)]
    exogenous: Vec<ExogenousRepresentation>,
}

impl Content {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self { content_id: content_id.into(), exogenous: Vec::new() }
    }

    /// Append a representation, assigning the next internal id.
    ///
    /// External ids must be unique within a content.
    pub fn append_exogenous<K, V>(
        &mut self,
        external_id: Option<&str>,
        properties: impl IntoIterator<Item = (K, V)>,
    ) -> Result<usize>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        if let Some(ext) = external_id {
            if self.exogenous.iter().any(|r| r.external_id.as_deref() == Some(ext)) {
                return Err(Error::Validation(format!(
                    "content {}: representation id '{ext}' already in use",
                    self.content_id
                )));
            }
        }

        let internal_id = self.exogenous.last().map(|r| r.internal_id + 1).unwrap_or(0);
        self.exogenous.push(ExogenousRepresentation {
            internal_id,
            external_id: external_id.map(str::to_owned),
            properties: properties.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        });
        Ok(internal_id)
    }

    /// Builder form of [`Content::append_exogenous`].
    pub fn with_exogenous<K, V>(
        mut self,
        external_id: Option<&str>,
        properties: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.append_exogenous(external_id, properties)?;
        Ok(self)
    }

    /// Look a representation up by internal or external id.
    pub fn get_exogenous_rep(&self, id: &RepresentationId) -> Option<&ExogenousRepresentation> {
        self.exogenous.iter().find(|r| r.matches(id))
    }

    /// Every representation as `(internal_id, external_id)`, in order.
    pub fn representation_ids(&self) -> Vec<(usize, Option<&str>)> {
        self.exogenous
            .iter()
            .map(|r| (r.internal_id, r.external_id.as_deref()))
            .collect()
    }

    pub fn representations(&self) -> &[ExogenousRepresentation] {
        &self.exogenous
    }

    /// Remove a representation, returning it.
    pub fn remove_exogenous(&mut self, id: &RepresentationId) -> Option<ExogenousRepresentation> {
        let pos = self.exogenous.iter().position(|r| r.matches(id))?;
        Some(self.exogenous.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie() -> Content {
        Content::new("tt0114709")
            .with_exogenous(Some("dbpedia"), [("director", "John Lasseter")])
            .unwrap()
            .with_exogenous(None, [("director", "Lasseter"), ("year", "1995")])
            .unwrap()
    }

    #[test]
    fn test_lookup_by_internal_and_external_id() {
        let content = movie();
        let by_ext = content.get_exogenous_rep(&"dbpedia".into()).unwrap();
        let by_int = content.get_exogenous_rep(&0.into()).unwrap();
        assert_eq!(by_ext, by_int);
        assert_eq!(by_int.get("director"), Some(&Value::from("John Lasseter")));
        assert!(content.get_exogenous_rep(&"wikidata".into()).is_none());
        assert!(content.get_exogenous_rep(&7.into()).is_none());
    }

    #[test]
    fn test_representation_ids_in_order() {
        assert_eq!(movie().representation_ids(), vec![(0, Some("dbpedia")), (1, None)]);
    }

    #[test]
    fn test_duplicate_external_id_rejected() {
        let mut content = movie();
        let result = content.append_exogenous(Some("dbpedia"), [("k", "v")]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_internal_ids_stay_consecutive_after_removal() {
        let mut content = movie();
        content.remove_exogenous(&0.into()).unwrap();
        let next = content.append_exogenous(None, [("k", "v")]).unwrap();
        assert_eq!(next, 2);
    }

    #[test]
    fn test_representation_id_serde_is_untagged() {
        let ids: Vec<RepresentationId> = serde_json::from_str(r#"[0, "dbpedia"]"#).unwrap();
        assert_eq!(ids, vec![RepresentationId::Internal(0), RepresentationId::External("dbpedia".into())]);
    }
}
