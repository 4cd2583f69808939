//! Exact/prefix key map and fuzzy text index over flattened sections.

use crate::fuzzy::FuzzyIndex;
use crate::manifest::{flatten, Manifest, SectionDocument};
use crate::normalize::normalize;
use ahash::AHashMap;

/// Immutable lookup structures for one manifest load.
///
/// Rebuilt wholesale when the manifest changes; there is no incremental
/// update path.
#[derive(Debug, Default)]
pub struct LookupIndex {
    docs: Vec<SectionDocument>,
    buckets: AHashMap<String, Vec<usize>>,
    /// Bucket keys in first-insertion order, for deterministic prefix scans.
    keys: Vec<String>,
    by_id: AHashMap<String, usize>,
    fuzzy: FuzzyIndex,
}

impl LookupIndex {
    pub fn build(docs: Vec<SectionDocument>) -> Self {
        let mut buckets: AHashMap<String, Vec<usize>> = AHashMap::new();
        let mut keys = Vec::new();
        let mut by_id = AHashMap::new();

        for (position, doc) in docs.iter().enumerate() {
            by_id.entry(doc.id.clone()).or_insert(position);

            let key = normalize(&doc.sec_key);
            if key.is_empty() {
                continue;
            }
            buckets
                .entry(key)
                .or_insert_with_key(|k| {
                    keys.push(k.clone());
                    Vec::new()
                })
                .push(position);
        }

        let fuzzy = FuzzyIndex::build(&docs);

        tracing::info!(
            documents = docs.len(),
            keys = keys.len(),
            "built lookup index"
        );

        LookupIndex {
            docs,
            buckets,
            keys,
            by_id,
            fuzzy,
        }
    }

    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self::build(flatten(manifest))
    }

    pub fn documents(&self) -> &[SectionDocument] {
        &self.docs
    }

    pub fn get(&self, id: &str) -> Option<&SectionDocument> {
        self.by_id.get(id).map(|&i| &self.docs[i])
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of distinct normalized keys.
    pub fn bucket_count(&self) -> usize {
        self.keys.len()
    }

    /// Records whose key normalizes to nothing and so live outside every bucket.
    pub fn unkeyed_count(&self) -> usize {
        let keyed: usize = self.buckets.values().map(Vec::len).sum();
        self.docs.len() - keyed
    }

    /// Documents whose normalized key is exactly `key`, in insertion order.
    pub fn exact(&self, key: &str) -> Vec<&SectionDocument> {
        self.buckets
            .get(key)
            .map(|bucket| bucket.iter().map(|&i| &self.docs[i]).collect())
            .unwrap_or_default()
    }

    /// Documents whose normalized key starts with `key` without equalling it.
    ///
    /// Scanning stops once `cap` documents are collected; the last bucket
    /// visited is taken whole, so the result may run past `cap`.
    pub fn prefixed(&self, key: &str, cap: usize) -> Vec<&SectionDocument> {
        let mut out = Vec::new();
        if key.is_empty() {
            return out;
        }
        for candidate in &self.keys {
            if out.len() >= cap {
                break;
            }
            if candidate == key || !candidate.starts_with(key) {
                continue;
            }
            if let Some(bucket) = self.buckets.get(candidate) {
                out.extend(bucket.iter().map(|&i| &self.docs[i]));
            }
        }
        out
    }

    /// Fuzzy text matches, most relevant first.
    pub fn fuzzy(&self, query: &str, limit: usize) -> Vec<&SectionDocument> {
        self.fuzzy
            .search(query, limit)
            .into_iter()
            .map(|hit| &self.docs[hit.position])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(title: &str, chapter: &str, key: &str) -> SectionDocument {
        SectionDocument {
            id: format!("{title}|{chapter}|{key}"),
            title_key: title.to_string(),
            title_label: format!("Title {title}"),
            title_name: String::new(),
            chapter_key: chapter.to_string(),
            chapter_label: format!("Chapter {chapter}"),
            chapter_name: String::new(),
            sec_key: key.to_string(),
            heading: format!("Sec. {key}."),
            url: format!("https://example.test/chap_{chapter}.htm#sec_{key}"),
            content: None,
        }
    }

    #[test]
    fn test_every_keyed_document_in_exactly_one_bucket() {
        let docs = vec![
            section("04", "050", "4-62"),
            section("04", "050", "Sec. 4-62A"),
            section("04", "050", ""),
            section("04", "051", "4-62a"),
        ];
        let index = LookupIndex::build(docs);

        assert_eq!(index.bucket_count(), 2);
        assert_eq!(index.unkeyed_count(), 1);

        let a: Vec<_> = index.exact("4-62a").iter().map(|d| d.id.clone()).collect();
        assert_eq!(a, vec!["04|050|Sec. 4-62A", "04|051|4-62a"]);

        let plain: Vec<_> = index.exact("4-62").iter().map(|d| d.id.clone()).collect();
        assert_eq!(plain, vec!["04|050|4-62"]);

        // the unkeyed record is still part of the collection
        assert_eq!(index.len(), 4);
        assert!(index.get("04|050|").is_some());
    }

    #[test]
    fn test_prefixed_excludes_exact_key_and_keeps_key_order() {
        let docs = vec![
            section("04", "050", "4-62b"),
            section("04", "050", "4-62"),
            section("04", "050", "4-62a"),
            section("04", "050", "4-63"),
        ];
        let index = LookupIndex::build(docs);
        let keys: Vec<_> = index.prefixed("4-62", 40).iter().map(|d| d.sec_key.clone()).collect();
        assert_eq!(keys, vec!["4-62b", "4-62a"]);
    }

    #[test]
    fn test_prefixed_stops_scanning_at_cap() {
        let docs: Vec<_> = (0..60)
            .map(|i| section("01", "001", &format!("1-1{i}")))
            .collect();
        let index = LookupIndex::build(docs);
        assert_eq!(index.prefixed("1-1", 40).len(), 40);
        assert!(index.prefixed("", 40).is_empty());
    }

    #[test]
    fn test_exact_miss_is_empty() {
        let index = LookupIndex::build(vec![section("04", "050", "4-62")]);
        assert!(index.exact("99-999").is_empty());
        assert!(index.get("nope").is_none());
    }
}
