//! Editor sections and the table of contents built from them

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collection::CollectionKind;
use crate::graph::EntityGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    /// The article record's own fields.
    Article,
    Collection(CollectionKind),
}

/// Sections in the order the editor shows them.
pub const SECTIONS: [Section; 10] = [
    Section::Article,
    Section::Collection(CollectionKind::Authors),
    Section::Collection(CollectionKind::Editors),
    Section::Collection(CollectionKind::Groups),
    Section::Collection(CollectionKind::Organisations),
    Section::Collection(CollectionKind::Awards),
    Section::Collection(CollectionKind::References),
    Section::Collection(CollectionKind::Keywords),
    Section::Collection(CollectionKind::Subjects),
    Section::Collection(CollectionKind::CustomFields),
];

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Article => "Article",
            Section::Collection(kind) => kind.label(),
        }
    }

    /// Stable anchor id for linking to the section.
    pub fn anchor(&self) -> String {
        match self {
            Section::Article => "article-record".to_string(),
            Section::Collection(kind) => format!("{}-section", kind.property()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub section: Section,
    pub label: String,
    pub anchor: String,
    /// Member count; `None` for sections that are not collections.
    pub count: Option<usize>,
}

impl fmt::Display for TocEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.count {
            Some(n) => write!(f, "{} ({})", self.label, n),
            None => f.write_str(&self.label),
        }
    }
}

pub fn table_of_contents(graph: &EntityGraph) -> Vec<TocEntry> {
    SECTIONS
        .iter()
        .map(|section| TocEntry {
            section: *section,
            label: section.label().to_string(),
            anchor: section.anchor(),
            count: match section {
                Section::Article => None,
                Section::Collection(kind) => Some(graph.collection_len(*kind)),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::props;
    use crate::registry::SchemaRegistry;
    use std::sync::Arc;

    #[test]
    fn every_collection_has_a_section() {
        for kind in CollectionKind::ALL {
            assert!(SECTIONS.contains(&Section::Collection(kind)));
        }
    }

    #[test]
    fn toc_renders_counts() {
        let mut g = EntityGraph::new(Arc::new(SchemaRegistry::default())).unwrap();
        for title in ["A", "B"] {
            g.create_in_collection(CollectionKind::References, "book", props([("title", title)]))
                .unwrap();
        }
        let toc = table_of_contents(&g);
        let rendered: Vec<String> = toc.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "Article",
                "Authors (0)",
                "Editors (0)",
                "Groups (0)",
                "Affiliations (0)",
                "Awards (0)",
                "References (2)",
                "Keywords (0)",
                "Subjects (0)",
                "Custom Fields (0)",
            ]
        );
        assert_eq!(toc[6].anchor, "references-section");
    }
}
