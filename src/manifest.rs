//! The Title → Chapter → Section manifest and its flattened form.
//!
//! Every field of the manifest is optional. Defaults are applied here, at
//! the flattening boundary, so the index and extractor only ever see fully
//! populated [`SectionDocument`] records.

use crate::error::{Error, Result};
use crate::normalize::{key_from_fragment, key_from_label};
use crate::text::Annotation;
use globset::Glob;
use ignore::WalkBuilder;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// Master index written next to the per-title files.
pub const MASTER_INDEX: &str = "titles_index.json";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Manifest {
    #[serde(default, deserialize_with = "null_default")]
    pub titles: Vec<Title>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Title {
    #[serde(default, deserialize_with = "null_default")]
    pub title_key: String,
    #[serde(default, deserialize_with = "null_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub chapters: Vec<Chapter>,
    /// Per-title file referenced from the master index.
    #[serde(default, deserialize_with = "null_default")]
    pub file: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Chapter {
    #[serde(default, deserialize_with = "null_default")]
    pub chapter_key: String,
    #[serde(default, deserialize_with = "null_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub sections: Vec<Section>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Section {
    #[serde(default, deserialize_with = "null_default")]
    pub section_key: String,
    #[serde(default, deserialize_with = "null_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_default")]
    pub url: String,
    /// Text the crawler already pulled out of the chapter page.
    #[serde(default)]
    pub content: Option<SectionContent>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionContent {
    #[serde(default, deserialize_with = "null_default")]
    pub body_paragraphs: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub source: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub history: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub annotations: Vec<Annotation>,
    #[serde(default, deserialize_with = "null_default")]
    pub text: String,
    /// `"repealed"` when `text` is the chapter's repeal notice.
    #[serde(default, deserialize_with = "null_default")]
    pub status: String,
}

impl SectionContent {
    pub fn is_repealed(&self) -> bool {
        self.status.eq_ignore_ascii_case("repealed")
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.body_paragraphs.iter().all(|p| p.trim().is_empty())
    }
}

/// One section with its ancestry denormalized into a single record.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SectionDocument {
    /// `titleKey|chapterKey|sectionKey`
    pub id: String,
    pub title_key: String,
    pub title_label: String,
    pub title_name: String,
    pub chapter_key: String,
    pub chapter_label: String,
    pub chapter_name: String,
    pub sec_key: String,
    pub heading: String,
    pub url: String,
    #[serde(skip)]
    pub content: Option<SectionContent>,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestStats {
    pub titles: usize,
    pub chapters: usize,
    pub sections: usize,
}

impl Manifest {
    pub fn stats(&self) -> ManifestStats {
        let chapters = self.titles.iter().map(|t| t.chapters.len()).sum();
        let sections = self
            .titles
            .iter()
            .flat_map(|t| &t.chapters)
            .map(|c| c.sections.len())
            .sum();
        ManifestStats {
            titles: self.titles.len(),
            chapters,
            sections,
        }
    }
}

/// Treat an explicit `null` the same as a missing field.
fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Flatten the manifest into one record per section, in document order.
pub fn flatten(manifest: &Manifest) -> Vec<SectionDocument> {
    let mut docs = Vec::new();

    for title in &manifest.titles {
        for chapter in &title.chapters {
            for section in &chapter.sections {
                let sec_key = section_key(section);
                let heading = if !section.label.is_empty() {
                    section.label.clone()
                } else if !sec_key.is_empty() {
                    format!("Sec. {}", sec_key)
                } else {
                    String::new()
                };

                docs.push(SectionDocument {
                    id: format!("{}|{}|{}", title.title_key, chapter.chapter_key, sec_key),
                    title_key: title.title_key.clone(),
                    title_label: title.label.clone(),
                    title_name: title.name.clone(),
                    chapter_key: chapter.chapter_key.clone(),
                    chapter_label: chapter.label.clone(),
                    chapter_name: chapter.name.clone(),
                    sec_key,
                    heading,
                    url: section.url.clone(),
                    content: section.content.clone(),
                });
            }
        }
    }

    docs
}

/// The section's own key, or one recovered from its anchor or label.
fn section_key(section: &Section) -> String {
    let key = section.section_key.trim();
    if !key.is_empty() {
        return key.to_string();
    }
    key_from_fragment(&section.url)
        .or_else(|| key_from_label(&section.label))
        .unwrap_or_default()
}

/// Load a manifest from a single JSON/YAML file or from a crawler output
/// directory.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    if path.is_dir() {
        load_manifest_dir(path)
    } else if path.is_file() {
        parse_file(path)
    } else {
        Err(Error::ManifestNotFound(path.to_path_buf()))
    }
}

fn parse_file<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

fn load_manifest_dir(dir: &Path) -> Result<Manifest> {
    let master = dir.join(MASTER_INDEX);
    if master.is_file() {
        let mut manifest: Manifest = parse_file(&master)?;
        for title in &mut manifest.titles {
            if !title.chapters.is_empty() || title.file.is_empty() {
                continue;
            }
            match parse_file::<Title>(&dir.join(&title.file)) {
                Ok(full) => title.chapters = full.chapters,
                Err(e) => {
                    tracing::warn!(file = %title.file, error = %e, "skipping unreadable title file");
                }
            }
        }
        return Ok(manifest);
    }

    // No master index: pick up every title_*.json beside each other
    let matcher = Glob::new("title_*.{json,yaml,yml}")?.compile_matcher();
    let mut titles = Vec::new();

    let walker = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .hidden(true)
        .git_ignore(false)
        .build();

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        if !matcher.is_match(name) {
            continue;
        }
        match parse_file::<Title>(path) {
            Ok(title) => titles.push(title),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable title file");
            }
        }
    }

    titles.sort_by(|a, b| title_order(&a.title_key).cmp(&title_order(&b.title_key)));
    Ok(Manifest { titles })
}

/// Numeric part first, then the letter suffix: 1, 2, 4a, 10, 47b.
fn title_order(key: &str) -> (u64, String) {
    let digits: String = key.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u64>() {
        Ok(n) => (n, key[digits.len()..].to_lowercase()),
        Err(_) => (u64::MAX, key.to_lowercase()),
    }
}
