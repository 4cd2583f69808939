//! Locate statute sections in a Title → Chapter → Section corpus and carve
//! a single section's text out of its chapter document.
//!
//! The pipeline is: [`manifest::flatten`] the hierarchy into records, build a
//! [`index::LookupIndex`] over them, [`search::resolve`] user queries against
//! it, then [`extract::extract`] the chosen section from chapter markup
//! obtained through a [`source::ChapterSource`].

pub mod config;
pub mod error;
pub mod extract;
pub mod fuzzy;
pub mod index;
pub mod manifest;
pub mod normalize;
pub mod search;
pub mod selection;
pub mod source;
pub mod text;

pub use error::{Error, Result};

#[cfg(test)]
mod tests {
    use crate::extract::extract;
    use crate::index::LookupIndex;
    use crate::manifest::load_manifest;
    use crate::search::resolve;
    use crate::source::{ChapterSource, DirSource};
    use crate::text::SectionText;
    use std::fs;

    #[test]
    fn test_manifest_to_section_text() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let chapters = data.join("chapters");
        fs::create_dir_all(&chapters).unwrap();

        fs::write(
            data.join("titles_index.json"),
            r#"{ "titles": [ { "title_key": "47a", "label": "Title 47a", "name": "Landlord and Tenant", "file": "title_47a.json" } ] }"#,
        )
        .unwrap();
        fs::write(
            data.join("title_47a.json"),
            r#"{ "title_key": "47a", "chapters": [ { "chapter_key": "830", "label": "Chapter 830", "name": "Rights and Responsibilities of Landlord and Tenant", "sections": [
                { "section_key": "47a-21", "label": "Sec. 47a-21. Security deposits.", "url": "https://www.cga.ct.gov/current/pub/chap_830.htm#sec_47a-21" },
                { "section_key": "47a-22", "label": "Sec. 47a-22. Prohibited provisions.", "url": "https://www.cga.ct.gov/current/pub/chap_830.htm#sec_47a-22" }
            ] } ] }"#,
        )
        .unwrap();
        fs::write(
            chapters.join("chap_830.htm"),
            r#"<html><body>
                <p><span class="catchln" id="sec_47a-21">Sec. 47a-21. Security deposits.</span> (a) As used in this section:</p>
                <p>(b) No landlord may demand a security deposit in excess of two months' rent.</p>
                <script>track()</script>
                <p class="source-first">(P.A. 79-571, S. 1.)</p>
                <p><span class="catchln" id="sec_47a-22">Sec. 47a-22. Prohibited provisions.</span> (a) A rental agreement shall not.</p>
            </body></html>"#,
        )
        .unwrap();

        let index = LookupIndex::from_manifest(&load_manifest(&data).unwrap());
        assert_eq!(index.len(), 2);

        let by_key = resolve(&index, "Sec. 47a-21");
        assert_eq!(by_key.len(), 1);
        let by_words = resolve(&index, "security deposit");
        assert_eq!(by_words[0].id, by_key[0].id);

        let doc = by_key[0];
        let markup = DirSource::new(&chapters).chapter(&doc.url).unwrap();
        let fragment = extract(doc, &markup).unwrap();
        assert!(!fragment.as_str().contains("track()"));
        assert!(!fragment.as_str().contains("sec_47a-22"));

        let text = SectionText::from_fragment(&fragment, &doc.heading);
        assert_eq!(
            text.body,
            vec![
                "(a) As used in this section:".to_string(),
                "(b) No landlord may demand a security deposit in excess of two months' rent."
                    .to_string()
            ]
        );
        assert_eq!(text.source, vec!["(P.A. 79-571, S. 1.)".to_string()]);
    }
}
