use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of a raw citation tree, e.g. a JATS `element-citation`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationElement {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Text content of the element and all its descendants, whitespace
    /// collapsed.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<CitationElement>,
}

impl CitationElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Element with text content and no children.
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(tag).with_text(text)
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child. The parent's text is not updated.
    pub fn with_child(mut self, child: CitationElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&CitationElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a CitationElement> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Trimmed text of the first direct child with the given tag.
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.child(tag).map(|c| c.text.trim()).filter(|t| !t.is_empty())
    }

    /// All elements with the given tag in document order, this one included.
    pub fn descendants_named<'a>(&'a self, tag: &str) -> Vec<&'a CitationElement> {
        let mut found = Vec::new();
        self.collect_named(tag, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, tag: &str, found: &mut Vec<&'a CitationElement>) {
        if self.tag == tag {
            found.push(self);
        }
        for child in &self.children {
            child.collect_named(tag, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_and_lookup() {
        let el = CitationElement::new("element-citation")
            .with_attr("publication-type", "book")
            .with_child(CitationElement::leaf("source", "  Dune "))
            .with_child(CitationElement::leaf("year", ""));
        assert_eq!(el.attr("publication-type"), Some("book"));
        assert_eq!(el.child_text("source"), Some("Dune"));
        assert_eq!(el.child_text("year"), None);
        assert_eq!(el.children_named("source").count(), 1);
    }

    #[test]
    fn descendants_in_document_order() {
        let tree = CitationElement::new("ref-list")
            .with_child(CitationElement::new("ref").with_child(CitationElement::leaf("element-citation", "a")))
            .with_child(CitationElement::leaf("element-citation", "b"));
        let texts: Vec<&str> = tree
            .descendants_named("element-citation")
            .iter()
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
