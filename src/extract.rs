//! Carve one section out of a chapter document.
//!
//! Chapter pages carry no per-section structure beyond anchors, so a
//! section runs from its own anchor up to (not including) the next element
//! that opens another section. Everything collected is sanitized before it
//! is handed back.

use crate::manifest::SectionDocument;
use crate::normalize::key_from_fragment;
use crate::text::collapse_whitespace;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::fmt;
use std::sync::LazyLock;

/// Elements removed with their whole subtree.
const BLOCKED_TAGS: [&str; 8] = [
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "noscript",
];

/// Inline elements that sit inside a heading paragraph rather than wrap it.
const INLINE_TAGS: [&str; 7] = ["span", "a", "b", "strong", "em", "i", "font"];

static REPEALED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bare repealed\b").expect("repealed pattern"));

/// Sanitized markup for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The chapter document address: `url` without its fragment.
pub fn chapter_url(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

/// The in-document anchor name carried by `url`.
pub fn fragment_id(url: &str) -> Option<&str> {
    url.split_once('#')
        .map(|(_, frag)| frag)
        .filter(|frag| !frag.is_empty())
}

/// Extract the section `doc` points at from its chapter markup.
///
/// Returns `None` when the URL has no fragment, the anchor is missing, or
/// nothing meaningful is left after sanitation. The caller falls back to
/// the full chapter document in every case.
pub fn extract(doc: &SectionDocument, chapter_markup: &str) -> Option<Fragment> {
    let Some(target) = fragment_id(&doc.url) else {
        tracing::debug!(id = %doc.id, url = %doc.url, "no fragment identifier");
        return None;
    };

    let html = Html::parse_document(chapter_markup);
    let Some(anchor) = find_anchor(&html, target) else {
        tracing::debug!(id = %doc.id, anchor = target, "anchor not found");
        return None;
    };

    let start = start_node(anchor);
    if is_bare_anchor(start) {
        tracing::debug!(id = %doc.id, anchor = target, "anchor has no content after it");
        return None;
    }

    let mut parts = vec![start.html()];
    for node in start.next_siblings() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if opens_section(el) {
            break;
        }
        parts.push(el.html());
    }

    let cleaned = sanitize(&parts.concat());
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        tracing::debug!(id = %doc.id, anchor = target, "nothing left after sanitation");
        return None;
    }

    Some(Fragment(cleaned.to_string()))
}

/// Remove active and embedded content, including everything inside it.
pub fn sanitize(markup: &str) -> String {
    let mut fragment = Html::parse_fragment(markup);

    let blocked: Vec<_> = fragment
        .tree
        .root()
        .descendants()
        .filter(|node| {
            node.value()
                .as_element()
                .is_some_and(|el| BLOCKED_TAGS.contains(&el.name()))
        })
        .map(|node| node.id())
        .collect();

    for id in blocked {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    fragment.root_element().inner_html()
}

/// Text of the paragraph announcing that `sec_key` was repealed, if any.
///
/// Chapter pages list repealed sections as
/// `<p>Sections <a href="#sec_7-123">7-123</a> ... are repealed.</p>`
/// instead of giving them an anchor of their own.
pub fn repealed_note(chapter_markup: &str, sec_key: &str) -> Option<String> {
    let key = sec_key.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }

    let html = Html::parse_document(chapter_markup);
    html.tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "p")
        .find_map(|p| {
            let text = collapse_whitespace(&p.text().collect::<Vec<_>>().join(" "));
            if !REPEALED.is_match(&text) {
                return None;
            }
            let links_key = p
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "a")
                .filter_map(|a| a.value().attr("href"))
                .filter_map(key_from_fragment)
                .any(|k| k == key);
            links_key.then_some(text)
        })
}

/// First element whose `id` is `target`, else the first whose `name` is.
fn find_anchor<'a>(html: &'a Html, target: &str) -> Option<ElementRef<'a>> {
    let elements = || html.tree.root().descendants().filter_map(ElementRef::wrap);
    elements()
        .find(|el| el.value().id() == Some(target))
        .or_else(|| elements().find(|el| el.value().attr("name") == Some(target)))
}

fn start_node(anchor: ElementRef<'_>) -> ElementRef<'_> {
    let mut start = anchor;
    if is_bare_anchor(anchor) {
        if let Some(next) = anchor.next_siblings().find_map(ElementRef::wrap) {
            start = next;
        }
    }

    // <p><span id="sec_1-1">Sec. 1-1.</span> text</p>: the paragraph is the unit
    if !INLINE_TAGS.contains(&start.value().name()) {
        return start;
    }
    for ancestor in start.ancestors().filter_map(ElementRef::wrap) {
        let name = ancestor.value().name();
        if matches!(name, "p" | "li") {
            return ancestor;
        }
        if !INLINE_TAGS.contains(&name) {
            break;
        }
    }
    start
}

/// `<a name="...">` marker with no link target.
fn is_bare_anchor(el: ElementRef<'_>) -> bool {
    el.value().name() == "a" && el.value().attr("href").is_none()
}

/// True when `el` or anything inside it carries a section anchor.
fn opens_section(el: ElementRef<'_>) -> bool {
    el.descendants().filter_map(ElementRef::wrap).any(|e| {
        let value = e.value();
        value.id().is_some_and(is_section_anchor)
            || value.attr("name").is_some_and(is_section_anchor)
    })
}

/// `sec_7-123`, `sec-7-123`, `sec7-123`, any case.
fn is_section_anchor(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() > 3
        && bytes[..3].eq_ignore_ascii_case(b"sec")
        && matches!(bytes[3], b'_' | b'-' | b'0'..=b'9')
}
