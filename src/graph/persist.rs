//! Saving and loading whole graphs.
//!
//! A saved graph is one xz-compressed JSON document:
//!
//! ```text
//! { "format_version": 1,
//!   "saved_at": "2024-05-01T12:00:00Z",
//!   "kind": "tripartite",
//!   "graph": { "config": ..., "store": { "nodes": [...], "edges": [...] }, ... } }
//! ```
//!
//! Content caches are not saved; a loaded graph reads records from disk
//! again the first time it needs them.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use super::Graph;
use crate::content::loader::{XZ_EXTENSION, XZ_LEVEL};
use crate::{Error, Result};

/// Version of the saved-graph document layout.
pub const FORMAT_VERSION: u32 = 1;

/// Which graph type a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    Bipartite,
    Tripartite,
    Full,
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphKind::Bipartite => write!(f, "bipartite"),
            GraphKind::Tripartite => write!(f, "tripartite"),
            GraphKind::Full => write!(f, "full"),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeOut<'a, G> {
    format_version: u32,
    saved_at: DateTime<Utc>,
    kind: GraphKind,
    graph: &'a G,
}

/// Header of a saved graph, readable without decoding the graph itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavedGraphInfo {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub kind: GraphKind,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    #[serde(flatten)]
    info: SavedGraphInfo,
    graph: serde_json::Value,
}

/// `file_name` with the `.xz` extension enforced.
pub fn xz_file_name(file_name: &str) -> String {
    let suffix = format!(".{XZ_EXTENSION}");
    if file_name.ends_with(&suffix) {
        file_name.to_owned()
    } else {
        format!("{file_name}{suffix}")
    }
}

pub(crate) fn save_graph<G>(graph: &G, dir: &Path, file_name: &str) -> Result<PathBuf>
where
    G: Graph + Serialize,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(xz_file_name(file_name));

    let envelope = EnvelopeOut {
        format_version: FORMAT_VERSION,
        saved_at: Utc::now(),
        kind: G::KIND,
        graph,
    };
    let mut encoder = XzEncoder::new(BufWriter::new(File::create(&path)?), XZ_LEVEL);
    serde_json::to_writer(&mut encoder, &envelope)?;
    encoder.finish()?.flush()?;

    tracing::info!(path = %path.display(), kind = %G::KIND, "graph saved");
    Ok(path)
}

fn read_envelope(path: &Path) -> Result<EnvelopeIn> {
    let reader = XzDecoder::new(BufReader::new(File::open(path)?));
    Ok(serde_json::from_reader(reader)?)
}

/// Read the header of a saved graph.
pub fn read_graph_info(path: impl AsRef<Path>) -> Result<SavedGraphInfo> {
    read_envelope(path.as_ref()).map(|e| e.info)
}

/// Load a graph written by [`Graph::serialize`].
///
/// Fails with a validation error if the file was written by another format
/// version or holds a different kind of graph than `G`.
pub fn load_graph<G>(path: impl AsRef<Path>) -> Result<G>
where
    G: Graph + DeserializeOwned,
{
    let path = path.as_ref();
    let EnvelopeIn { info, graph } = read_envelope(path)?;

    if info.format_version != FORMAT_VERSION {
        return Err(Error::Validation(format!(
            "{}: format version {} is not supported (expected {FORMAT_VERSION})",
            path.display(),
            info.format_version
        )));
    }
    if info.kind != G::KIND {
        return Err(Error::Validation(format!(
            "{}: holds a {} graph, not a {} graph",
            path.display(),
            info.kind,
            G::KIND
        )));
    }

    let graph = serde_json::from_value(graph)?;
    tracing::info!(path = %path.display(), kind = %info.kind, saved_at = %info.saved_at, "graph loaded");
    Ok(graph)
}
