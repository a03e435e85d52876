//! Loading content records from disk.
//!
//! One record per entity, stored as `{directory}/{content_id}.xz`
//! (xz-compressed JSON). A missing file is not an error: it means the entity
//! has no content, and the graph simply attaches no properties to it.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use super::Content;
use crate::Result;

/// File extension of content records and serialized graphs.
pub const XZ_EXTENSION: &str = "xz";

/// xz preset used when writing records and saved graphs.
pub(crate) const XZ_LEVEL: u32 = 6;

/// Load the record for `content_id` from `directory`.
///
/// Returns `Ok(None)` when no such file exists. I/O failures other than
/// "not found", and undecodable records, are returned as errors.
pub fn load_content_instance(directory: impl AsRef<Path>, content_id: &str) -> Result<Option<Content>> {
    let path = directory.as_ref().join(format!("{content_id}.{XZ_EXTENSION}"));
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let reader = XzDecoder::new(BufReader::new(file));
    let content = serde_json::from_reader(reader)?;
    Ok(Some(content))
}

/// Write `content` as `{directory}/{content_id}.xz`, creating the directory
/// if needed. Returns the written path.
pub fn write_content_instance(directory: impl AsRef<Path>, content: &Content) -> Result<PathBuf> {
    let directory = directory.as_ref();
    fs::create_dir_all(directory)?;
    let path = directory.join(format!("{}.{XZ_EXTENSION}", content.content_id));

    let mut encoder = XzEncoder::new(BufWriter::new(File::create(&path)?), XZ_LEVEL);
    serde_json::to_writer(&mut encoder, content)?;
    encoder.finish()?.flush()?;
    Ok(path)
}

// ============================================================================
// ContentLoader: ordered directory search
// ============================================================================

/// Looks records up in a list of directories, first hit wins.
///
/// Graphs with separate user and item directories search their own
/// directory first and the other one as a fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentLoader {
    dirs: Vec<PathBuf>,
}

impl ContentLoader {
    pub fn new<P: Into<PathBuf>>(dirs: impl IntoIterator<Item = P>) -> Self {
        Self { dirs: dirs.into_iter().map(Into::into).collect() }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Search every directory in order and return the first readable record.
    ///
    /// An unreadable record does not hide a good one in a later directory.
    /// The first error is returned only when no directory has a readable
    /// record.
    pub fn load(&self, content_id: &str) -> Result<Option<Content>> {
        let mut first_error = None;
        for dir in &self.dirs {
            match load_content_instance(dir, content_id) {
                Ok(Some(content)) => return Ok(Some(content)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(content_id, dir = %dir.display(), error = %e, "unreadable content record; trying next directory");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

// ============================================================================
// ContentCache: lazy, memoised loads
// ============================================================================

/// Remembers which ids have no usable record.
///
/// Only misses are kept: a found record is handed to the caller and not
/// retained, so the cache stays small however many entities have content.
/// A failed decode is logged and remembered as a miss, so one corrupt file
/// costs a single warning rather than one per rating row.
#[derive(Debug, Clone, Default)]
pub struct ContentCache {
    misses: HashSet<String>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the record for `content_id`, unless it is already known to be
    /// missing.
    pub fn get_or_load(&mut self, loader: &ContentLoader, content_id: &str) -> Option<Content> {
        if self.misses.contains(content_id) {
            tracing::debug!(content_id, "known missing content record");
            return None;
        }

        let loaded = match loader.load(content_id) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(content_id, error = %e, "could not read content record; treating as missing");
                None
            }
        };
        if loaded.is_none() {
            tracing::debug!(content_id, "no content record found");
            self.misses.insert(content_id.to_owned());
        }
        loaded
    }

    /// Whether `content_id` is remembered as having no record.
    pub fn contains(&self, content_id: &str) -> bool {
        self.misses.contains(content_id)
    }

    pub fn len(&self) -> usize {
        self.misses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.misses.is_empty()
    }

    pub fn clear(&mut self) {
        self.misses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn sample() -> Content {
        Content::new("tt0112281")
            .with_exogenous(Some("dbpedia"), [("film director", "Ted Demme")])
            .unwrap()
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_content_instance(dir.path(), &sample()).unwrap();
        assert!(path.ends_with("tt0112281.xz"));

        let loaded = load_content_instance(dir.path(), "tt0112281").unwrap().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_content_instance(dir.path(), "nope").unwrap().is_none());
        assert!(load_content_instance(dir.path().join("absent"), "nope").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.xz"), b"not xz at all").unwrap();
        assert!(load_content_instance(dir.path(), "bad").is_err());
    }

    #[test]
    fn test_loader_falls_back_to_second_dir() {
        let items = tempfile::tempdir().unwrap();
        let users = tempfile::tempdir().unwrap();
        let user = Content::new("u1").with_exogenous(None, [("age", 31)]).unwrap();
        write_content_instance(users.path(), &user).unwrap();

        let loader = ContentLoader::new([items.path(), users.path()]);
        let found = loader.load("u1").unwrap().unwrap();
        assert_eq!(found.representations()[0].get("age"), Some(&Value::Int(31)));
        assert!(loader.load("u2").unwrap().is_none());
    }

    #[test]
    fn test_loader_skips_corrupt_record_for_later_dir() {
        let primary = tempfile::tempdir().unwrap();
        let fallback = tempfile::tempdir().unwrap();
        fs::write(primary.path().join("tt0112281.xz"), b"garbage").unwrap();
        write_content_instance(fallback.path(), &sample()).unwrap();

        let loader = ContentLoader::new([primary.path(), fallback.path()]);
        assert_eq!(loader.load("tt0112281").unwrap(), Some(sample()));

        // Nothing readable anywhere: the decode error surfaces.
        let alone = ContentLoader::new([primary.path()]);
        assert!(alone.load("tt0112281").is_err());
    }

    #[test]
    fn test_cache_remembers_only_misses() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.xz"), b"garbage").unwrap();
        write_content_instance(dir.path(), &sample()).unwrap();
        let loader = ContentLoader::new([dir.path()]);
        let mut cache = ContentCache::new();

        assert_eq!(cache.get_or_load(&loader, "tt0112281"), Some(sample()));
        assert!(cache.get_or_load(&loader, "bad").is_none());
        assert!(cache.get_or_load(&loader, "missing").is_none());
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("tt0112281"));
        assert!(cache.contains("bad"));

        // Hits are not retained: a removed file is read as missing.
        fs::remove_file(dir.path().join("tt0112281.xz")).unwrap();
        assert!(cache.get_or_load(&loader, "tt0112281").is_none());

        // Misses stay misses until the cache is cleared.
        write_content_instance(dir.path(), &Content::new("missing")).unwrap();
        assert!(cache.get_or_load(&loader, "missing").is_none());
        cache.clear();
        assert!(cache.get_or_load(&loader, "missing").is_some());
    }
}
