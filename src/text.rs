//! Plain-text view of an extracted section, for terminals and JSON output.
//!
//! Chapter pages tag trailing paragraphs with classes (`source-first`,
//! `history`, `annotation`), which lets the body be separated from the
//! legislative source notes and annotations.

use crate::extract::{extract, repealed_note, Fragment};
use crate::manifest::{SectionContent, SectionDocument};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Annotation {
    pub first: bool,
    pub text: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionText {
    pub body: Vec<String>,
    pub source: Vec<String>,
    pub history: Vec<String>,
    pub annotations: Vec<Annotation>,
}

/// What can be shown for a section, best source first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    /// Carved out of the chapter page.
    Extracted(Fragment),
    /// Repeal notice, from the chapter page or the manifest.
    Repealed(String),
    /// Text the crawler stored in the manifest.
    Stored(SectionText),
    /// Nothing usable; the reader gets the full chapter instead.
    Missing,
}

impl SectionBody {
    /// Extract from `chapter_markup` when available, else fall back.
    pub fn resolve(doc: &SectionDocument, chapter_markup: Option<&str>) -> Self {
        match chapter_markup.and_then(|markup| extract(doc, markup)) {
            Some(fragment) => SectionBody::Extracted(fragment),
            None => Self::fallback(doc, chapter_markup),
        }
    }

    /// Body for a section whose fragment could not be extracted.
    pub fn fallback(doc: &SectionDocument, chapter_markup: Option<&str>) -> Self {
        if let Some(note) = chapter_markup.and_then(|markup| repealed_note(markup, &doc.sec_key)) {
            return SectionBody::Repealed(note);
        }
        let Some(content) = doc.content.as_ref().filter(|c| !c.is_empty()) else {
            return SectionBody::Missing;
        };
        if content.is_repealed() {
            let note = match content.text.trim() {
                "" => content.body_paragraphs.join(" "),
                text => text.to_string(),
            };
            return SectionBody::Repealed(note);
        }
        SectionBody::Stored(SectionText::from(content))
    }
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl SectionText {
    /// Split a fragment into classified paragraphs.
    ///
    /// `label` is the section's display heading; a leading copy of it is
    /// removed from the first body paragraph.
    pub fn from_fragment(fragment: &Fragment, label: &str) -> Self {
        let html = Html::parse_fragment(fragment.as_str());
        let mut out = SectionText::default();

        let paragraphs: Vec<ElementRef<'_>> = html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| is_paragraph(el) && !inside_paragraph(el))
            .collect();

        if paragraphs.is_empty() {
            let text = element_text(html.root_element());
            out.push_body(text, label);
            return out;
        }

        for el in paragraphs {
            let text = element_text(el);
            if text.is_empty() {
                continue;
            }
            let classes: Vec<&str> = el.value().classes().collect();
            if classes.iter().any(|c| matches!(*c, "source" | "source-first")) {
                push_dedup(&mut out.source, text);
            } else if classes.iter().any(|c| matches!(*c, "history" | "history-first")) {
                push_dedup(&mut out.history, text);
            } else if classes.contains(&"annotation-first") {
                out.push_annotation(true, text);
            } else if classes.contains(&"annotation") {
                out.push_annotation(false, text);
            } else {
                out.push_body(text, label);
            }
        }

        out
    }

    /// Body paragraphs separated by blank lines.
    pub fn text(&self) -> String {
        self.body.join("\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
            && self.source.is_empty()
            && self.history.is_empty()
            && self.annotations.is_empty()
    }

    fn push_body(&mut self, text: String, label: &str) {
        let label = collapse_whitespace(label);
        let text = if self.body.is_empty() && !label.is_empty() {
            match text.strip_prefix(label.as_str()) {
                Some(rest) => rest.trim().to_string(),
                None => text,
            }
        } else {
            text
        };
        if !text.is_empty() {
            push_dedup(&mut self.body, text);
        }
    }

    fn push_annotation(&mut self, first: bool, text: String) {
        if self.annotations.last().map(|a| a.text.as_str()) != Some(text.as_str()) {
            self.annotations.push(Annotation { first, text });
        }
    }
}

impl From<&SectionContent> for SectionText {
    fn from(content: &SectionContent) -> Self {
        let mut body: Vec<String> = content
            .body_paragraphs
            .iter()
            .map(|p| collapse_whitespace(p))
            .filter(|p| !p.is_empty())
            .collect();
        if body.is_empty() {
            body = content
                .text
                .split("\n\n")
                .map(collapse_whitespace)
                .filter(|p| !p.is_empty())
                .collect();
        }
        SectionText {
            body,
            source: content.source.clone(),
            history: content.history.clone(),
            annotations: content.annotations.clone(),
        }
    }
}

fn is_paragraph(el: &ElementRef<'_>) -> bool {
    matches!(el.value().name(), "p" | "li")
}

fn inside_paragraph(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| is_paragraph(&a))
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Append unless it repeats the previous entry.
fn push_dedup(list: &mut Vec<String>, text: String) {
    if list.last() != Some(&text) {
        list.push(text);
    }
}
