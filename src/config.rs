//! Optional `.cgs.toml` settings.
//!
//! Every key has a default, so a missing file is the same as an empty one.
//! Command-line flags take precedence over whatever is loaded here.

use crate::error::Result;
use crate::search::RESULT_CAP;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = ".cgs.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Manifest file or crawler output directory.
    pub manifest: PathBuf,
    /// Directory of cached chapter pages.
    pub chapters: PathBuf,
    /// Results shown per search.
    pub limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            manifest: PathBuf::from("data"),
            chapters: PathBuf::from("data/chapters"),
            limit: RESULT_CAP,
        }
    }
}

impl Config {
    /// Load `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.limit = config.limit.clamp(1, RESULT_CAP);
        Ok(config)
    }
}
