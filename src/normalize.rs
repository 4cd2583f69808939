//! Canonical forms for section identifiers.
//!
//! Section keys arrive in several spellings ("Sec. 4-62a", "sec 4-62A",
//! "§ 4-62a"). Everything that is used as an index key goes through
//! [`normalize`] so those spellings collapse to one bucket.

use regex::Regex;
use std::sync::LazyLock;

/// Citation words that may precede a section number. Longer forms first so
/// "sections" is not read as "sec" + "tions".
const CITATION_PREFIXES: [&str; 5] = ["sections", "section", "secs", "sec", "§"];

// 4-62, 4-62a, 4a-62, 462
static IDENTIFIER_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+[a-z]?-?[0-9]+[a-z]?$").expect("identifier shape pattern")
});

// #sec_7-123 or #sec7-123
static FRAGMENT_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)#sec[_-]?([0-9]+[a-z]*-[0-9]+[a-z]*)").expect("fragment key pattern")
});

// "Sec. 7-123. Words and phrases."
static LABEL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bSec\.\s*([0-9]+[a-z]*-[0-9]+[a-z]*)\b").expect("label key pattern")
});

/// Canonicalize a raw section key or query.
///
/// Lowercases, strips any leading citation prefix ("Sec. ", "section ",
/// "§"), and trims. Prefixes are stripped until none remain, so the function
/// is idempotent.
pub fn normalize(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let mut rest = lower.trim();
    while let Some(stripped) = strip_citation_prefix(rest) {
        rest = stripped.trim();
    }
    rest.to_string()
}

/// [`normalize`] with all internal whitespace removed.
pub fn lookup_key(raw: &str) -> String {
    normalize(raw).split_whitespace().collect()
}

/// True when the query looks like a statute citation rather than words.
///
/// The check is purely syntactic: "99-999" is identifier-shaped whether or
/// not such a section exists.
pub fn is_identifier(raw: &str) -> bool {
    IDENTIFIER_SHAPE.is_match(&lookup_key(raw))
}

/// Section key carried by a `#sec_7-123` style URL fragment.
pub fn key_from_fragment(url: &str) -> Option<String> {
    FRAGMENT_KEY
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Section key printed in a visible `Sec. 7-123.` label.
pub fn key_from_label(label: &str) -> Option<String> {
    LABEL_KEY
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

fn strip_citation_prefix(s: &str) -> Option<&str> {
    for prefix in CITATION_PREFIXES {
        let Some(rest) = s.strip_prefix(prefix) else {
            continue;
        };
        if prefix == "§" {
            return Some(rest);
        }
        // "sec" only counts as a prefix when the word ends there
        match rest.chars().next() {
            None => return Some(rest),
            Some('.') => return Some(&rest[1..]),
            Some(c) if c.is_whitespace() || c.is_ascii_digit() => return Some(rest),
            Some(_) => {}
        }
    }
    None
}
