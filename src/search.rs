//! Hybrid query resolution: structural key lookup first, fuzzy text second.

use crate::index::LookupIndex;
use crate::manifest::SectionDocument;
use crate::normalize::{is_identifier, lookup_key};
use serde::Serialize;

/// Most results any query returns.
pub const RESULT_CAP: usize = 40;

/// Which strategy produced a result list.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Nothing to search for.
    Empty,
    /// Exact and prefix matches on the normalized section key.
    Identifier,
    /// Weighted fuzzy text ranking.
    Text,
}

#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub strategy: Strategy,
    pub documents: Vec<&'a SectionDocument>,
}

/// Ranked documents for a raw query, at most [`RESULT_CAP`].
pub fn resolve<'a>(index: &'a LookupIndex, raw_query: &str) -> Vec<&'a SectionDocument> {
    resolve_with_strategy(index, raw_query).documents
}

/// [`resolve`], also reporting which strategy answered.
pub fn resolve_with_strategy<'a>(index: &'a LookupIndex, raw_query: &str) -> Resolution<'a> {
    if raw_query.trim().is_empty() {
        return Resolution {
            strategy: Strategy::Empty,
            documents: Vec::new(),
        };
    }

    if is_identifier(raw_query) {
        let key = lookup_key(raw_query);
        let mut documents = index.exact(&key);
        let prefix = index.prefixed(&key, RESULT_CAP);
        tracing::debug!(
            key = %key,
            exact = documents.len(),
            prefix = prefix.len(),
            "identifier lookup"
        );

        // Citations are answered structurally or not at all; a miss is not
        // retried as fuzzy text.
        documents.extend(prefix);
        documents.truncate(RESULT_CAP);
        return Resolution {
            strategy: Strategy::Identifier,
            documents,
        };
    }

    let documents = index.fuzzy(raw_query, RESULT_CAP);
    tracing::debug!(query = raw_query, hits = documents.len(), "fuzzy search");
    Resolution {
        strategy: Strategy::Text,
        documents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;

    fn corpus() -> LookupIndex {
        let manifest: Manifest = serde_json::from_str(
            r#"{ "titles": [
              { "title_key": "04", "label": "Title 4", "name": "Management of State Agencies", "chapters": [
                { "chapter_key": "050", "label": "Chapter 50", "name": "Accounting", "sections": [
                  { "section_key": "4-62b", "label": "Sec. 4-62b. Audits.", "url": "u#sec_4-62b" },
                  { "section_key": "4-62", "label": "Sec. 4-62. Petty cash funds.", "url": "u#sec_4-62" },
                  { "section_key": "4-62a", "label": "Sec. 4-62a. Reports.", "url": "u#sec_4-62a" },
                  { "section_key": "4-63", "label": "Sec. 4-63. Travel.", "url": "u#sec_4-63" }
                ] },
                { "chapter_key": "050a", "label": "Chapter 50a", "name": "Accounting (transferred)", "sections": [
                  { "section_key": "Sec. 4-62", "label": "Sec. 4-62. Transferred.", "url": "v#sec_4-62" }
                ] }
              ] },
              { "title_key": "45a", "label": "Title 45a", "name": "Probate Courts and Procedure", "chapters": [
                { "chapter_key": "801", "label": "Chapter 801", "name": "Probate Bonds", "sections": [
                  { "section_key": "45a-139", "label": "Sec. 45a-139. Bonds of fiduciaries.", "url": "w#sec_45a-139" },
                  { "section_key": "45a-98", "label": "Sec. 45a-98. General powers of courts of probate.", "url": "w#sec_45a-98" }
                ] }
              ] },
              { "title_key": "47a", "label": "Title 47a", "name": "Landlord and Tenant", "chapters": [
                { "chapter_key": "830", "label": "Chapter 830", "name": "Rights and Responsibilities", "sections": [
                  { "section_key": "47a-21", "label": "Sec. 47a-21. Security deposits.", "url": "x#sec_47a-21" }
                ] }
              ] },
              { "title_key": "99", "chapters": [
                { "chapter_key": "999", "sections": [ { "section_key": "99-99", "label": "Sec. 99-99. Reserved." } ] }
              ] }
            ] }"#,
        )
        .unwrap();
        LookupIndex::from_manifest(&manifest)
    }

    fn ids(docs: &[&SectionDocument]) -> Vec<String> {
        docs.iter().map(|d| d.id.clone()).collect()
    }

    #[test]
    fn test_empty_query() {
        let index = corpus();
        let res = resolve_with_strategy(&index, "   ");
        assert_eq!(res.strategy, Strategy::Empty);
        assert!(res.documents.is_empty());
    }

    #[test]
    fn test_identifier_exact_then_prefix() {
        let index = corpus();
        let res = resolve_with_strategy(&index, "4-62");
        assert_eq!(res.strategy, Strategy::Identifier);
        assert_eq!(
            ids(&res.documents),
            vec!["04|050|4-62", "04|050a|Sec. 4-62", "04|050|4-62b", "04|050|4-62a"]
        );
    }

    #[test]
    fn test_identifier_query_spellings() {
        let index = corpus();
        let a = ids(&resolve(&index, "SEC. 4-62A"));
        let b = ids(&resolve(&index, "sec 4 - 62a"));
        assert_eq!(a, vec!["04|050|4-62a"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_identifier_miss_does_not_fall_back_to_fuzzy() {
        let index = corpus();
        // fuzzy ranking alone would surface 99-99 for this input
        assert!(!index.fuzzy("99-999", RESULT_CAP).is_empty());

        let res = resolve_with_strategy(&index, "99-999");
        assert_eq!(res.strategy, Strategy::Identifier);
        assert!(res.documents.is_empty());
    }

    #[test]
    fn test_prefix_only_hit_is_structural() {
        let index = corpus();
        let res = resolve_with_strategy(&index, "45a-1");
        assert_eq!(res.strategy, Strategy::Identifier);
        assert_eq!(ids(&res.documents), vec!["45a|801|45a-139"]);
    }

    #[test]
    fn test_text_query_ranks_heading_first() {
        let index = corpus();
        let res = resolve_with_strategy(&index, "probate");
        assert_eq!(res.strategy, Strategy::Text);
        assert_eq!(res.documents[0].id, "45a|801|45a-98");
        assert!(ids(&res.documents).contains(&"45a|801|45a-139".to_string()));
    }

    #[test]
    fn test_text_query_with_typo() {
        let index = corpus();
        let res = resolve(&index, "securty deposits");
        assert_eq!(res[0].id, "47a|830|47a-21");
    }

    #[test]
    fn test_combined_cap() {
        let sections: Vec<String> = (0..50)
            .map(|i| format!(r#"{{ "section_key": "9-9{i}", "url": "u#sec_9-9{i}" }}"#))
            .collect();
        let exact: Vec<String> = (0..5)
            .map(|i| format!(r#"{{ "section_key": "9-9", "label": "dup {i}" }}"#))
            .collect();
        let json = format!(
            r#"{{ "titles": [ {{ "title_key": "09", "chapters": [
                {{ "chapter_key": "a", "sections": [ {} ] }},
                {{ "chapter_key": "b", "sections": [ {} ] }}
            ] }} ] }}"#,
            sections.join(","),
            exact.join(",")
        );
        let manifest: Manifest = serde_json::from_str(&json).unwrap();
        let index = LookupIndex::from_manifest(&manifest);

        let res = resolve(&index, "9-9");
        assert_eq!(res.len(), RESULT_CAP);
        // exact matches lead
        assert!(res[..5].iter().all(|d| d.sec_key == "9-9"));
        assert!(res[5..].iter().all(|d| d.sec_key != "9-9"));
    }
}
