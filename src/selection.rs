//! Last-write-wins bookkeeping for section views.
//!
//! A view request starts when the user selects a record and finishes when
//! its chapter markup arrives and has been extracted. Only the most recent
//! selection may publish a result; anything older is discarded.

use crate::extract::Fragment;

/// Handed out by [`Selection::select`] and redeemed by [`Selection::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    doc_id: String,
}

impl Ticket {
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }
}

/// What the view currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Idle,
    /// Selected, extraction not finished yet.
    Pending(String),
    Ready(String, Fragment),
    /// Extraction found nothing; show the full chapter instead.
    Fallback(String),
}

#[derive(Debug)]
pub struct Selection {
    generation: u64,
    view: View,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            generation: 0,
            view: View::Idle,
        }
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start viewing `doc_id`, superseding any request still in flight.
    pub fn select(&mut self, doc_id: &str) -> Ticket {
        self.generation += 1;
        self.view = View::Pending(doc_id.to_string());
        Ticket {
            generation: self.generation,
            doc_id: doc_id.to_string(),
        }
    }

    /// Publish an extraction result. Returns false (and changes nothing)
    /// when a newer selection has been made since `ticket` was issued.
    pub fn complete(&mut self, ticket: Ticket, result: Option<Fragment>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(doc = %ticket.doc_id, "dropping superseded extraction");
            return false;
        }
        self.view = match result {
            Some(fragment) => View::Ready(ticket.doc_id, fragment),
            None => View::Fallback(ticket.doc_id),
        };
        true
    }

    pub fn current(&self) -> &View {
        &self.view
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.view = View::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::manifest::SectionDocument;

    fn fragment_for(key: &str) -> Fragment {
        let doc = SectionDocument {
            id: format!("01|001|{key}"),
            title_key: "01".to_string(),
            title_label: String::new(),
            title_name: String::new(),
            chapter_key: "001".to_string(),
            chapter_label: String::new(),
            chapter_name: String::new(),
            sec_key: key.to_string(),
            heading: String::new(),
            url: format!("chap_001.htm#sec_{key}"),
            content: None,
        };
        let chapter = format!(r#"<body><div id="sec_{key}">Sec. {key}.</div></body>"#);
        extract(&doc, &chapter).unwrap()
    }

    #[test]
    fn test_latest_selection_wins() {
        let mut selection = Selection::new();
        let first = selection.select("01|001|1-1");
        let second = selection.select("01|001|1-2");

        // the slower, older request resolves last but must not be shown
        assert!(selection.complete(second, Some(fragment_for("1-2"))));
        assert!(!selection.complete(first, Some(fragment_for("1-1"))));

        match selection.current() {
            View::Ready(id, fragment) => {
                assert_eq!(id, "01|001|1-2");
                assert!(fragment.as_str().contains("Sec. 1-2."));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_stale_result_while_pending() {
        let mut selection = Selection::new();
        let first = selection.select("a");
        let _second = selection.select("b");
        assert!(!selection.complete(first, None));
        assert_eq!(selection.current(), &View::Pending("b".to_string()));
    }

    #[test]
    fn test_not_found_becomes_fallback() {
        let mut selection = Selection::new();
        let ticket = selection.select("a");
        assert_eq!(ticket.doc_id(), "a");
        assert!(selection.complete(ticket, None));
        assert_eq!(selection.current(), &View::Fallback("a".to_string()));
    }

    #[test]
    fn test_clear_invalidates_outstanding_tickets() {
        let mut selection = Selection::new();
        let ticket = selection.select("a");
        selection.clear();
        assert!(!selection.complete(ticket, None));
        assert_eq!(selection.current(), &View::Idle);
    }
}
