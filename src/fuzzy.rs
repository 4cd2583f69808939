//! Weighted approximate text matching over section records.
//!
//! Each field is scored by the best approximate-substring edit distance of
//! the query against that field, so a match may sit anywhere in the field.
//! Field scores are combined with fixed weights; the heading dominates.

use crate::manifest::SectionDocument;

/// Largest tolerated `distance / pattern length` for a field to match.
pub const THRESHOLD: f64 = 0.4;

/// Patterns shorter than this never match.
pub const MIN_MATCH_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Heading,
    ChapterName,
    TitleName,
    SecKey,
    ChapterLabel,
    TitleLabel,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Heading,
        Field::ChapterName,
        Field::TitleName,
        Field::SecKey,
        Field::ChapterLabel,
        Field::TitleLabel,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Field::Heading => 0.55,
            Field::ChapterName => 0.18,
            Field::TitleName => 0.15,
            Field::SecKey => 0.12,
            Field::ChapterLabel => 0.07,
            Field::TitleLabel => 0.05,
        }
    }

    pub fn of(self, doc: &SectionDocument) -> &str {
        match self {
            Field::Heading => &doc.heading,
            Field::ChapterName => &doc.chapter_name,
            Field::TitleName => &doc.title_name,
            Field::SecKey => &doc.sec_key,
            Field::ChapterLabel => &doc.chapter_label,
            Field::TitleLabel => &doc.title_label,
        }
    }
}

/// A matching document, by position in the indexed collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyHit {
    pub position: usize,
    pub score: f64,
}

/// Lower-cased field text for every document, prepared once per build.
#[derive(Debug, Default)]
pub struct FuzzyIndex {
    rows: Vec<[Vec<char>; 6]>,
}

impl FuzzyIndex {
    pub fn build(docs: &[SectionDocument]) -> Self {
        let rows = docs
            .iter()
            .map(|doc| {
                Field::ALL.map(|field| field.of(doc).to_lowercase().chars().collect::<Vec<char>>())
            })
            .collect();
        FuzzyIndex { rows }
    }

    /// Best `limit` matches, highest score first; ties keep document order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<FuzzyHit> {
        let pattern: Vec<char> = query.to_lowercase().chars().collect();
        if pattern.len() < MIN_MATCH_CHARS {
            return Vec::new();
        }

        let mut hits: Vec<FuzzyHit> = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(position, row)| {
                let score = score_row(&pattern, row);
                (score > 0.0).then_some(FuzzyHit { position, score })
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        hits
    }
}

fn score_row(pattern: &[char], row: &[Vec<char>; 6]) -> f64 {
    let mut score = 0.0;
    for (field, text) in Field::ALL.iter().zip(row) {
        if text.is_empty() {
            continue;
        }
        let ratio = substring_distance(pattern, text) as f64 / pattern.len() as f64;
        if ratio <= THRESHOLD {
            score += field.weight() * (1.0 - ratio);
        }
    }
    score
}

/// Smallest edit distance between `pattern` and any substring of `text`.
pub fn substring_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    if m == 0 {
        return 0;
    }

    // prev[i]: distance of pattern[..i] ending at the previous text position
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut cur = vec![0usize; m + 1];
    let mut best = m;

    for &tc in text {
        cur[0] = 0;
        for i in 1..=m {
            let substitute = prev[i - 1] + usize::from(pattern[i - 1] != tc);
            cur[i] = substitute.min(prev[i] + 1).min(cur[i - 1] + 1);
        }
        best = best.min(cur[m]);
        if best == 0 {
            break;
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}
