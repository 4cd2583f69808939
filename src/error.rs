use std::path::PathBuf;

/// Failures that can occur while loading inputs from disk.
///
/// The lookup and extraction engine itself never fails; these errors only
/// come from reading manifests, config files, and cached chapter documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid glob: {0}")]
    Glob(#[from] globset::Error),
    #[error("manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),
    #[error("chapter not cached: {url} (looked for {})", .path.display())]
    ChapterNotCached { url: String, path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;
