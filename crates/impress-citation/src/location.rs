//! Location extraction
//!
//! Page and locator elements differ too much between citation styles to be
//! expanded generically, so callers plug in their own extractor.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

use crate::element::CitationElement;

/// Pulls location properties (pages, electronic locators) out of a citation.
///
/// Returns property name → value for what was actually found. The normalizer
/// ignores properties the entry type does not declare.
pub trait LocationExtractor: Send + Sync {
    fn extract(&self, citation: &CitationElement) -> BTreeMap<String, String>;
}

lazy_static! {
    static ref PAGE_RANGE: Regex =
        Regex::new(r"^\s*([A-Za-z]?\d+[A-Za-z]?)\s*(?:-|–|—|--)\s*([A-Za-z]?\d+[A-Za-z]?)\s*$").unwrap();
}

/// Reads JATS `fpage`, `lpage`, `page-range` and `elocation-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JatsLocationExtractor;

impl JatsLocationExtractor {
    /// Split "12-19" into ("12", "19"). Returns `None` for anything that is
    /// not a single range.
    pub fn split_range(range: &str) -> Option<(String, String)> {
        let caps = PAGE_RANGE.captures(range)?;
        Some((caps[1].to_string(), caps[2].to_string()))
    }
}

impl LocationExtractor for JatsLocationExtractor {
    fn extract(&self, citation: &CitationElement) -> BTreeMap<String, String> {
        let mut found = BTreeMap::new();
        for (element, property) in [
            ("fpage", "fpage"),
            ("lpage", "lpage"),
            ("page-range", "pageRange"),
            ("elocation-id", "elocationId"),
        ] {
            if let Some(text) = citation.child_text(element) {
                found.insert(property.to_string(), text.to_string());
            }
        }

        if let Some((first, last)) = found.get("pageRange").and_then(|r| Self::split_range(r)) {
            found.entry("fpage".to_string()).or_insert(first);
            found.entry("lpage".to_string()).or_insert(last);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_range() {
        assert_eq!(
            JatsLocationExtractor::split_range("12-19"),
            Some(("12".into(), "19".into()))
        );
        assert_eq!(
            JatsLocationExtractor::split_range(" e101 – e109 "),
            Some(("e101".into(), "e109".into()))
        );
        assert_eq!(JatsLocationExtractor::split_range("12, 15-19"), None);
        assert_eq!(JatsLocationExtractor::split_range("12"), None);
    }

    #[test]
    fn page_range_fills_missing_pages_only() {
        let citation = CitationElement::new("element-citation")
            .with_child(CitationElement::leaf("fpage", "11"))
            .with_child(CitationElement::leaf("page-range", "12-19"));
        let found = JatsLocationExtractor.extract(&citation);
        assert_eq!(found["fpage"], "11");
        assert_eq!(found["lpage"], "19");
        assert_eq!(found["pageRange"], "12-19");
    }

    #[test]
    fn nothing_found() {
        let citation = CitationElement::new("element-citation")
            .with_child(CitationElement::leaf("source", "Nature"));
        assert!(JatsLocationExtractor.extract(&citation).is_empty());
    }

    #[test]
    fn elocation_id() {
        let citation = CitationElement::new("element-citation")
            .with_child(CitationElement::leaf("elocation-id", "e1002"));
        let found = JatsLocationExtractor.extract(&citation);
        assert_eq!(found.len(), 1);
        assert_eq!(found["elocationId"], "e1002");
    }
}
