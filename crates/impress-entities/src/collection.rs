use serde::{Deserialize, Serialize};

/// Ordered collections owned by the article record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionKind {
    Authors,
    Editors,
    Groups,
    Organisations,
    Awards,
    Keywords,
    Subjects,
    References,
    CustomFields,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 9] = [
        CollectionKind::Authors,
        CollectionKind::Editors,
        CollectionKind::Groups,
        CollectionKind::Organisations,
        CollectionKind::Awards,
        CollectionKind::Keywords,
        CollectionKind::Subjects,
        CollectionKind::References,
        CollectionKind::CustomFields,
    ];

    /// Property of the article record holding the collection.
    pub fn property(&self) -> &'static str {
        match self {
            CollectionKind::Authors => "authors",
            CollectionKind::Editors => "editors",
            CollectionKind::Groups => "groups",
            CollectionKind::Organisations => "organisations",
            CollectionKind::Awards => "awards",
            CollectionKind::Keywords => "keywords",
            CollectionKind::Subjects => "subjects",
            CollectionKind::References => "references",
            CollectionKind::CustomFields => "customFields",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CollectionKind::Authors => "Authors",
            CollectionKind::Editors => "Editors",
            CollectionKind::Groups => "Groups",
            CollectionKind::Organisations => "Affiliations",
            CollectionKind::Awards => "Awards",
            CollectionKind::Keywords => "Keywords",
            CollectionKind::Subjects => "Subjects",
            CollectionKind::References => "References",
            CollectionKind::CustomFields => "Custom Fields",
        }
    }

    pub fn from_property(property: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.property() == property)
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.property())
    }
}
