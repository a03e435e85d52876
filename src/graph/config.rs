//! Graph configuration.
//!
//! [`GraphConfig`] carries the defaults every graph owns; [`PropertySource`]
//! says where a tripartite or full graph finds content records and which of
//! their properties become property nodes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::properties::ExtractionStrategy;
use crate::content::RepresentationId;
use crate::Result;

pub const DEFAULT_SCORE_LABEL: &str = "score";
pub const DEFAULT_WEIGHT: f64 = 0.5;

/// Defaults applied when a link or property carries no explicit value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Label of rating links when the ratings table has no `label` column.
    pub default_score_label: String,
    /// Weight of links added without one, and of properties without a
    /// `<label>_score` column.
    pub default_weight: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_score_label: DEFAULT_SCORE_LABEL.to_owned(),
            default_weight: DEFAULT_WEIGHT,
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score_label(mut self, label: impl Into<String>) -> Self {
        self.default_score_label = label.into();
        self
    }

    pub fn with_default_weight(mut self, weight: f64) -> Self {
        self.default_weight = weight;
        self
    }

    /// Parse a JSON object; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// PropertySource
// ============================================================================

/// Where properties of one side of the graph (users or items) come from.
///
/// Which of `representation` and `properties` are set picks the
/// [`ExtractionStrategy`]; with neither, no properties are attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertySource {
    pub contents_dir: Option<PathBuf>,
    pub representation: Option<RepresentationId>,
    pub properties: Option<Vec<String>>,
}

impl PropertySource {
    /// A source reading content records from `contents_dir`.
    pub fn new(contents_dir: impl Into<PathBuf>) -> Self {
        Self { contents_dir: Some(contents_dir.into()), ..Self::default() }
    }

    /// A source that attaches nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_representation(mut self, id: impl Into<RepresentationId>) -> Self {
        self.representation = Some(id.into());
        self
    }

    pub fn with_properties<S: Into<String>>(mut self, properties: impl IntoIterator<Item = S>) -> Self {
        self.properties = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    pub fn contents_dir(&self) -> Option<&Path> {
        self.contents_dir.as_deref()
    }

    pub fn strategy(&self) -> Option<ExtractionStrategy<'_>> {
        match (&self.representation, &self.properties) {
            (Some(representation), Some(properties)) => {
                Some(ExtractionStrategy::Selected { representation, properties })
            }
            (Some(representation), None) => Some(ExtractionStrategy::WholeRepresentation { representation }),
            (None, Some(properties)) => Some(ExtractionStrategy::AcrossRepresentations { properties }),
            (None, None) => None,
        }
    }
}
