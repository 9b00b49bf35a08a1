//! Built-in schema tables.
//!
//! These are the defaults behind `SchemaConfig::default()`. Deployments can
//! replace them wholesale (JSON/TOML config) or patch them with
//! `SchemaOverrides`.

use std::collections::BTreeMap;

use crate::kind::{Category, ContributorKind, PublicationKind};
use crate::schema::{
    ElementRule, EntityTypeSpec, IdentifierKind, PropertyDef, PublicationTypeSpec,
};

pub const ARTICLE_RECORD: &str = "article-record";
pub const BIBLIOGRAPHIC_ENTRY: &str = "bibliographic-entry";

pub const IDENTIFIER_KINDS: &[(&str, &str)] =
    &[("doi", "DOI"), ("pmid", "PubMed ID"), ("isbn", "ISBN")];

/// Element kinds that describe where in the cited work the citation points.
/// They vary too much between citation styles to be auto-expanded.
pub const LOCATION_ELEMENTS: &[&str] = &["fpage", "lpage", "page-range", "elocation-id", "size"];

const TYPE_LABELS: &[(&str, &str)] = &[
    (ARTICLE_RECORD, "Article"),
    (BIBLIOGRAPHIC_ENTRY, "Bibliographic Entry"),
    ("journal-article", "Journal Article"),
    ("book", "Book"),
    ("chapter", "Chapter"),
    ("conference-paper", "Conference Paper"),
    ("data-publication", "Data Publication"),
    ("magazine-article", "Magazine Article"),
    ("newspaper-article", "Newspaper Article"),
    ("patent", "Patent"),
    ("report", "Report"),
    ("software", "Software"),
    ("thesis", "Thesis"),
    ("webpage", "Webpage"),
    ("person", "Person"),
    ("group", "Group"),
    ("organisation", "Affiliation"),
    ("ref-contrib", "Contributor"),
    ("award", "Award"),
    ("keyword", "Keyword"),
    ("subject", "Subject"),
    ("custom-metadata-field", "Custom Field"),
];

const BIBLIOGRAPHIC_TEXT: &[&str] = &[
    "title",
    "containerTitle",
    "chapterTitle",
    "edition",
    "issue",
    "volume",
    "comment",
    "year",
    "month",
    "day",
    "publisherLoc",
    "publisherName",
    "confName",
    "confLoc",
    "dataTitle",
    "patentNumber",
    "patentCountry",
    "version",
    "uri",
    "accessedDate",
    "fpage",
    "lpage",
    "pageRange",
    "elocationId",
    "doi",
    "pmid",
    "isbn",
];

const BIBLIOGRAPHIC_CONTRIBUTORS: &[&str] = &["authors", "editors", "inventors"];

const PERSON_TEXT: &[&str] = &[
    "surname",
    "givenNames",
    "prefix",
    "suffix",
    "alias",
    "orcid",
    "email",
    "bio",
];

const ORGANISATION_TEXT: &[&str] = &[
    "name",
    "division1",
    "division2",
    "division3",
    "street",
    "addressLine",
    "city",
    "region",
    "country",
    "postalCode",
    "phone",
    "fax",
    "email",
    "uri",
];

const ARTICLE_TEXT: &[&str] = &[
    "title",
    "volume",
    "issue",
    "issueTitle",
    "fpage",
    "lpage",
    "pageRange",
    "elocationId",
    "receivedDate",
    "acceptedDate",
    "publishedDate",
];

/// Article collections: property name and admissible member types.
pub const ARTICLE_COLLECTIONS: &[(&str, &[&str])] = &[
    ("authors", &["person"]),
    ("editors", &["person"]),
    ("groups", &["group"]),
    ("organisations", &["organisation"]),
    ("awards", &["award"]),
    ("keywords", &["keyword"]),
    ("subjects", &["subject"]),
    ("references", &["publication"]),
    ("customFields", &["custom-metadata-field"]),
];

/// JATS publication-type → (entity type, admitted identifier kinds, redirects).
const PUBLICATION_TYPES: &[(&str, &str, &[&str], &[(&str, &str)])] = &[
    ("journal", "journal-article", &["doi", "pmid"], &[]),
    ("book", "book", &["doi", "pmid", "isbn"], &[("source", "title")]),
    (
        "chapter",
        "chapter",
        &["doi", "pmid", "isbn"],
        &[("chapter-title", "title")],
    ),
    ("confproc", "conference-paper", &["doi", "pmid", "isbn"], &[]),
    (
        "data",
        "data-publication",
        &["doi", "pmid", "isbn"],
        &[("data-title", "title")],
    ),
    ("magazine", "magazine-article", &["doi", "pmid"], &[]),
    ("newspaper", "newspaper-article", &["doi", "pmid"], &[]),
    ("patent", "patent", &["doi", "pmid", "isbn"], &[]),
    ("report", "report", &["doi", "pmid", "isbn"], &[("source", "title")]),
    ("software", "software", &["doi", "pmid", "isbn"], &[("source", "title")]),
    ("thesis", "thesis", &["doi", "pmid", "isbn"], &[("source", "title")]),
    ("webpage", "webpage", &["doi", "pmid", "isbn"], &[]),
];

pub fn type_label(name: &str) -> Option<&'static str> {
    TYPE_LABELS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, label)| *label)
}

fn spec(
    name: &str,
    category: Category,
    properties: Vec<PropertyDef>,
    required: &[&str],
) -> EntityTypeSpec {
    EntityTypeSpec {
        name: name.into(),
        label: type_label(name).unwrap_or(name).into(),
        category,
        is_abstract: false,
        inherits: None,
        properties,
        required: required.iter().map(|r| r.to_string()).collect(),
    }
}

fn texts(names: &[&str]) -> Vec<PropertyDef> {
    names.iter().map(|n| PropertyDef::text(n)).collect()
}

pub fn entity_types() -> Vec<EntityTypeSpec> {
    let mut types = Vec::new();

    let mut article_props = texts(ARTICLE_TEXT);
    article_props.extend(
        ARTICLE_COLLECTIONS
            .iter()
            .map(|(name, targets)| PropertyDef::references(name, targets)),
    );
    types.push(spec(ARTICLE_RECORD, Category::Record, article_props, &[]));

    let mut entry_props = texts(BIBLIOGRAPHIC_TEXT);
    entry_props.extend(
        BIBLIOGRAPHIC_CONTRIBUTORS
            .iter()
            .map(|name| PropertyDef::references(name, &["contributor"])),
    );
    let mut entry = spec(BIBLIOGRAPHIC_ENTRY, Category::Publication, entry_props, &[]);
    entry.is_abstract = true;
    types.push(entry);

    for kind in PublicationKind::ALL {
        let mut variant = spec(
            kind.as_str(),
            Category::Publication,
            Vec::new(),
            kind.default_required(),
        );
        variant.inherits = Some(BIBLIOGRAPHIC_ENTRY.into());
        types.push(variant);
    }

    for kind in ContributorKind::ALL {
        let properties = match kind {
            ContributorKind::Person => {
                let mut props = texts(PERSON_TEXT);
                props.extend([
                    PropertyDef::boolean("equalContrib"),
                    PropertyDef::boolean("corresp"),
                    PropertyDef::boolean("deceased"),
                    PropertyDef::references("affiliations", &["organisation"]),
                    PropertyDef::references("awards", &["award"]),
                    PropertyDef::references("group", &["group"]),
                ]);
                props
            }
            ContributorKind::Group => {
                let mut props = texts(&["name", "email"]);
                props.extend([
                    PropertyDef::references("affiliations", &["organisation"]),
                    PropertyDef::references("awards", &["award"]),
                    PropertyDef::references("members", &["person"]),
                ]);
                props
            }
            ContributorKind::Organisation => texts(ORGANISATION_TEXT),
            ContributorKind::RefContrib => texts(&["name", "givenNames", "prefix", "suffix"]),
        };
        types.push(spec(
            kind.as_str(),
            Category::Contributor,
            properties,
            kind.default_required(),
        ));
    }

    types.push(spec(
        "award",
        Category::Award,
        texts(&["institution", "fundRefId", "awardId"]),
        &["institution"],
    ));
    types.push(spec(
        "keyword",
        Category::Taxonomy,
        texts(&["name", "category", "language"]),
        &["name"],
    ));
    types.push(spec(
        "subject",
        Category::Taxonomy,
        texts(&["name", "category", "language"]),
        &[],
    ));
    types.push(spec(
        "custom-metadata-field",
        Category::Extension,
        texts(&["name", "value"]),
        &[],
    ));

    types
}

pub fn identifier_kinds() -> Vec<IdentifierKind> {
    IDENTIFIER_KINDS
        .iter()
        .map(|(kind, label)| IdentifierKind {
            kind: kind.to_string(),
            label: label.to_string(),
        })
        .collect()
}

pub fn publication_types() -> Vec<PublicationTypeSpec> {
    PUBLICATION_TYPES
        .iter()
        .map(|(name, entity_type, kinds, redirects)| PublicationTypeSpec {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
            identifier_kinds: kinds.iter().map(|k| k.to_string()).collect(),
            redirects: redirects
                .iter()
                .map(|(element, property)| (element.to_string(), property.to_string()))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect()
}

/// Elements that must be present on every normalized citation, in scan order.
pub fn citation_elements() -> Vec<ElementRule> {
    vec![
        ElementRule::discriminated("person-group", "person-group-type", "author", "authors"),
        ElementRule::discriminated("person-group", "person-group-type", "editor", "editors"),
        ElementRule::plain("article-title", "title"),
        ElementRule::plain("chapter-title", "chapterTitle"),
        ElementRule::plain("edition", "edition"),
        ElementRule::plain("issue", "issue"),
        ElementRule::plain("source", "containerTitle"),
        ElementRule::plain("volume", "volume"),
        ElementRule::plain("comment", "comment"),
        ElementRule::plain("year", "year"),
        ElementRule::plain("publisher-loc", "publisherLoc"),
        ElementRule::plain("publisher-name", "publisherName"),
        ElementRule::plain("conf-name", "confName"),
        ElementRule::plain("data-title", "dataTitle"),
        ElementRule::plain("patent", "patentNumber"),
        ElementRule::plain("version", "version"),
        ElementRule::plain("uri", "uri"),
        ElementRule::discriminated("pub-id", "pub-id-type", "doi", "doi"),
        ElementRule::discriminated("pub-id", "pub-id-type", "pmid", "pmid"),
        ElementRule::discriminated("pub-id", "pub-id-type", "isbn", "isbn"),
    ]
}

pub fn location_elements() -> Vec<String> {
    LOCATION_ELEMENTS.iter().map(|e| e.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_publication_kind_has_a_label_and_publication_type() {
        let pub_types = publication_types();
        for kind in PublicationKind::ALL {
            assert!(type_label(kind.as_str()).is_some(), "{}", kind.as_str());
            assert!(
                pub_types.iter().any(|p| p.entity_type == kind.as_str()),
                "no publication type for {}",
                kind.as_str()
            );
        }
    }

    #[test]
    fn journal_and_book_identifier_kinds() {
        let pub_types = publication_types();
        let journal = pub_types.iter().find(|p| p.name == "journal").unwrap();
        assert_eq!(journal.identifier_kinds, vec!["doi", "pmid"]);
        let book = pub_types.iter().find(|p| p.name == "book").unwrap();
        assert_eq!(book.identifier_kinds, vec!["doi", "pmid", "isbn"]);
    }

    #[test]
    fn citation_elements_exclude_location() {
        let rules = citation_elements();
        assert_eq!(rules.len(), 20);
        for loc in LOCATION_ELEMENTS {
            assert!(rules.iter().all(|r| r.element != *loc));
        }
    }
}
