//! Where chapter documents come from.

use crate::error::{Error, Result};
use crate::extract::chapter_url;
use std::fs;
use std::path::{Path, PathBuf};

/// Fetch-by-URL capability for chapter markup.
///
/// Implementations receive a section URL and return the text of the chapter
/// document it points into; the fragment is ignored.
pub trait ChapterSource {
    fn chapter(&self, url: &str) -> Result<String>;
}

/// Chapter pages saved in a local directory under their own file names
/// (`https://.../pub/chap_001.htm` → `<root>/chap_001.htm`).
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache path for `url`, if the URL names a file at all.
    pub fn path_for(&self, url: &str) -> Option<PathBuf> {
        let base = chapter_url(url);
        let base = base.split_once('?').map_or(base, |(path, _)| path);
        let name = base.rsplit('/').next().unwrap_or(base);
        if name.is_empty() {
            return None;
        }
        Some(self.root.join(name))
    }
}

impl ChapterSource for DirSource {
    fn chapter(&self, url: &str) -> Result<String> {
        let not_cached = |path: PathBuf| Error::ChapterNotCached {
            url: chapter_url(url).to_string(),
            path,
        };

        let path = self.path_for(url).ok_or_else(|| not_cached(self.root.clone()))?;
        if !path.is_file() {
            return Err(not_cached(path));
        }

        // Older chapter pages are not always valid UTF-8
        let bytes = fs::read(&path)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read cached chapter");
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_uses_last_segment() {
        let source = DirSource::new("/cache");
        assert_eq!(
            source.path_for("https://www.cga.ct.gov/current/pub/chap_001.htm#sec_1-1"),
            Some(PathBuf::from("/cache/chap_001.htm"))
        );
        assert_eq!(
            source.path_for("chap_002.htm?v=3#sec_2-1"),
            Some(PathBuf::from("/cache/chap_002.htm"))
        );
        assert_eq!(source.path_for("https://example.test/"), None);
    }

    #[test]
    fn test_reads_cached_chapter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chap_001.htm"), b"<p>caf\xe9</p>").unwrap();

        let source = DirSource::new(dir.path());
        let html = source.chapter("https://example.test/pub/chap_001.htm#sec_1-1").unwrap();
        assert!(html.starts_with("<p>caf"));
    }

    #[test]
    fn test_missing_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirSource::new(dir.path());
        let err = source.chapter("https://example.test/pub/chap_404.htm").unwrap_err();
        assert!(matches!(err, Error::ChapterNotCached { .. }));
        assert!(err.to_string().contains("chap_404.htm"));
    }
}
