use serde::{Deserialize, Serialize};

/// Broad grouping of entity types. Reference properties may name a category
/// instead of listing every admissible type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Record,
    Publication,
    Contributor,
    Award,
    Taxonomy,
    Extension,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Record => "record",
            Category::Publication => "publication",
            Category::Contributor => "contributor",
            Category::Award => "award",
            Category::Taxonomy => "taxonomy",
            Category::Extension => "extension",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "record" => Some(Category::Record),
            "publication" => Some(Category::Publication),
            "contributor" => Some(Category::Contributor),
            "award" => Some(Category::Award),
            "taxonomy" => Some(Category::Taxonomy),
            "extension" => Some(Category::Extension),
            _ => None,
        }
    }
}

/// The concrete kinds of cited works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PublicationKind {
    JournalArticle,
    Book,
    Chapter,
    ConferencePaper,
    DataPublication,
    MagazineArticle,
    NewspaperArticle,
    Patent,
    Report,
    Software,
    Thesis,
    Webpage,
}

impl PublicationKind {
    pub const ALL: [PublicationKind; 12] = [
        PublicationKind::JournalArticle,
        PublicationKind::Book,
        PublicationKind::Chapter,
        PublicationKind::ConferencePaper,
        PublicationKind::DataPublication,
        PublicationKind::MagazineArticle,
        PublicationKind::NewspaperArticle,
        PublicationKind::Patent,
        PublicationKind::Report,
        PublicationKind::Software,
        PublicationKind::Thesis,
        PublicationKind::Webpage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationKind::JournalArticle => "journal-article",
            PublicationKind::Book => "book",
            PublicationKind::Chapter => "chapter",
            PublicationKind::ConferencePaper => "conference-paper",
            PublicationKind::DataPublication => "data-publication",
            PublicationKind::MagazineArticle => "magazine-article",
            PublicationKind::NewspaperArticle => "newspaper-article",
            PublicationKind::Patent => "patent",
            PublicationKind::Report => "report",
            PublicationKind::Software => "software",
            PublicationKind::Thesis => "thesis",
            PublicationKind::Webpage => "webpage",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Properties that must be non-empty for this kind out of the box.
    ///
    /// Patents carry no requirement by default: inventor lists are not
    /// produced by the citation rules, so requiring them would flag every
    /// imported patent.
    pub fn default_required(&self) -> &'static [&'static str] {
        match self {
            PublicationKind::Book => &["authors", "title"],
            PublicationKind::Chapter
            | PublicationKind::DataPublication
            | PublicationKind::MagazineArticle
            | PublicationKind::NewspaperArticle
            | PublicationKind::JournalArticle
            | PublicationKind::Webpage => &["title", "containerTitle", "authors"],
            PublicationKind::ConferencePaper
            | PublicationKind::Report
            | PublicationKind::Software => &["title", "authors"],
            PublicationKind::Thesis => &["title", "authors", "year"],
            PublicationKind::Patent => &[],
        }
    }
}

/// The kinds of people and bodies that can be credited on a work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContributorKind {
    Person,
    Group,
    Organisation,
    /// A named contributor of a reference that cannot be resolved to a full person.
    RefContrib,
}

impl ContributorKind {
    pub const ALL: [ContributorKind; 4] = [
        ContributorKind::Person,
        ContributorKind::Group,
        ContributorKind::Organisation,
        ContributorKind::RefContrib,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContributorKind::Person => "person",
            ContributorKind::Group => "group",
            ContributorKind::Organisation => "organisation",
            ContributorKind::RefContrib => "ref-contrib",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn default_required(&self) -> &'static [&'static str] {
        match self {
            ContributorKind::Person => &["surname", "givenNames"],
            ContributorKind::RefContrib => &["name", "givenNames"],
            ContributorKind::Group | ContributorKind::Organisation => &["name"],
        }
    }
}

/// Tagged kind of an entity in the graph.
///
/// Built-in kinds are enum variants; types that only exist in a deployment's
/// schema configuration use `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    ArticleRecord,
    Publication(PublicationKind),
    Contributor(ContributorKind),
    Award,
    Keyword,
    Subject,
    CustomField,
    Custom(String),
}

impl EntityKind {
    pub fn name(&self) -> &str {
        match self {
            EntityKind::ArticleRecord => "article-record",
            EntityKind::Publication(k) => k.as_str(),
            EntityKind::Contributor(k) => k.as_str(),
            EntityKind::Award => "award",
            EntityKind::Keyword => "keyword",
            EntityKind::Subject => "subject",
            EntityKind::CustomField => "custom-metadata-field",
            EntityKind::Custom(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        if let Some(k) = PublicationKind::from_name(name) {
            return EntityKind::Publication(k);
        }
        if let Some(k) = ContributorKind::from_name(name) {
            return EntityKind::Contributor(k);
        }
        match name {
            "article-record" => EntityKind::ArticleRecord,
            "award" => EntityKind::Award,
            "keyword" => EntityKind::Keyword,
            "subject" => EntityKind::Subject,
            "custom-metadata-field" => EntityKind::CustomField,
            other => EntityKind::Custom(other.to_string()),
        }
    }

    /// Category a built-in kind belongs to; `None` for configured types.
    pub fn builtin_category(&self) -> Option<Category> {
        match self {
            EntityKind::ArticleRecord => Some(Category::Record),
            EntityKind::Publication(_) => Some(Category::Publication),
            EntityKind::Contributor(_) => Some(Category::Contributor),
            EntityKind::Award => Some(Category::Award),
            EntityKind::Keyword | EntityKind::Subject => Some(Category::Taxonomy),
            EntityKind::CustomField => Some(Category::Extension),
            EntityKind::Custom(_) => None,
        }
    }

    pub fn is_publication(&self) -> bool {
        matches!(self, EntityKind::Publication(_))
    }

    pub fn is_contributor(&self) -> bool {
        matches!(self, EntityKind::Contributor(_))
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for EntityKind {
    fn from(name: String) -> Self {
        EntityKind::from_name(&name)
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.name().to_string()
    }
}
