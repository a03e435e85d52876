//! Turning content records into property links.
//!
//! The three extraction strategies, and the [`PropertyLinker`] that pairs a
//! [`PropertySource`] with a content loader and a cache of missing records,
//! so an entity without content is looked up on disk only once.

use crate::content::{Content, ContentCache, ContentLoader, RepresentationId};
use crate::model::{Node, Value};
use super::config::PropertySource;

/// How properties are picked out of a content record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractionStrategy<'a> {
    /// The named properties of one representation.
    Selected { representation: &'a RepresentationId, properties: &'a [String] },
    /// Every property of one representation.
    WholeRepresentation { representation: &'a RepresentationId },
    /// The named properties of every representation. Labels become
    /// `"{property}#{internal_id}"`, plus `"#{external_id}"` when the
    /// representation has one.
    AcrossRepresentations { properties: &'a [String] },
}

/// A property found on a content record.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedProperty {
    /// Label of the link from the owner to the property node.
    pub label: String,
    /// Property name in the record; preference columns are keyed on it.
    pub source_property: String,
    pub value: Value,
}

impl ExtractedProperty {
    fn plain(property: &str, value: &Value) -> Self {
        Self { label: property.to_owned(), source_property: property.to_owned(), value: value.clone() }
    }
}

/// Extract properties from `content`.
///
/// Missing representations and properties are logged and skipped.
pub fn extract_properties(content: &Content, strategy: &ExtractionStrategy<'_>) -> Vec<ExtractedProperty> {
    let content_id = content.content_id.as_str();
    match *strategy {
        ExtractionStrategy::Selected { representation, properties } => {
            let Some(rep) = content.get_exogenous_rep(representation) else {
                tracing::warn!(content_id, %representation, "representation not found");
                return Vec::new();
            };
            properties
                .iter()
                .filter_map(|prop| match rep.get(prop) {
                    Some(value) => Some(ExtractedProperty::plain(prop, value)),
                    None => {
                        tracing::warn!(content_id, property = %prop, "property not found");
                        None
                    }
                })
                .collect()
        }

        ExtractionStrategy::WholeRepresentation { representation } => {
            let Some(rep) = content.get_exogenous_rep(representation) else {
                tracing::warn!(content_id, %representation, "representation not found");
                return Vec::new();
            };
            if rep.properties.is_empty() {
                tracing::warn!(content_id, %representation, "representation has no properties");
            }
            rep.properties.iter().map(|(prop, value)| ExtractedProperty::plain(prop, value)).collect()
        }

        ExtractionStrategy::AcrossRepresentations { properties } => {
            let mut found = Vec::new();
            let mut missing: Vec<&str> = Vec::new();
            for rep in content.representations() {
                for prop in properties {
                    match rep.get(prop) {
                        Some(value) => {
                            let label = match &rep.external_id {
                                Some(ext) => format!("{prop}#{}#{ext}", rep.internal_id),
                                None => format!("{prop}#{}", rep.internal_id),
                            };
                            found.push(ExtractedProperty {
                                label,
                                source_property: prop.clone(),
                                value: value.clone(),
                            });
                        }
                        None => missing.push(prop),
                    }
                }
            }

            if found.is_empty() {
                tracing::warn!(content_id, "none of the requested properties was found");
            } else {
                for prop in missing {
                    tracing::warn!(content_id, property = prop, "property not found");
                }
            }
            found
        }
    }
}

// ============================================================================
// PropertyLinker
// ============================================================================

/// Property configuration of one side of a graph, with its content lookup.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PropertyLinker {
    source: PropertySource,
    loader: ContentLoader,
    #[serde(skip)]
    cache: ContentCache,
}

impl PropertyLinker {
    /// Records are looked up in the source's own directory, then in
    /// `fallback` (if any).
    pub fn new(source: PropertySource, fallback: Option<&std::path::Path>) -> Self {
        let dirs = source.contents_dir().into_iter().chain(fallback);
        let loader = ContentLoader::new(dirs.map(std::path::Path::to_path_buf));
        Self { source, loader, cache: ContentCache::new() }
    }

    pub fn source(&self) -> &PropertySource {
        &self.source
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    /// Load `owner`'s content record, skipping ids known to have none.
    pub fn content_for(&mut self, owner: &Node) -> Option<Content> {
        if self.loader.is_empty() {
            return None;
        }
        self.cache.get_or_load(&self.loader, &owner.to_string())
    }

    /// Properties to attach to `owner`, empty when the source selects none
    /// or the owner has no content record.
    pub fn properties_for(&mut self, owner: &Node) -> Vec<ExtractedProperty> {
        if self.source.strategy().is_none() {
            return Vec::new();
        }
        let Some(content) = self.content_for(owner) else {
            return Vec::new();
        };
        match self.source.strategy() {
            Some(strategy) => extract_properties(&content, &strategy),
            None => Vec::new(),
        }
    }
}

impl PartialEq for PropertyLinker {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.loader == other.loader
    }
}
