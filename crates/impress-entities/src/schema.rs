use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::kind::Category;

/// Name of a registered entity type (e.g. "journal-article", "person").
pub type TypeName = String;

/// A property declaration within an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDef {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Text,
            description: None,
        }
    }

    pub fn boolean(name: &str) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Boolean,
            description: None,
        }
    }

    pub fn references(name: &str, targets: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::References {
                targets: targets.iter().map(|t| t.to_string()).collect(),
            },
            description: None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, PropertyKind::References { .. })
    }
}

/// Value shapes a property can hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PropertyKind {
    Text,
    Integer,
    Boolean,
    /// Ordered list of entity ids. Each target entry is either a type name or
    /// a category name ("publication", "contributor", ...).
    References { targets: Vec<String> },
}

impl PropertyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PropertyKind::Text => "text",
            PropertyKind::Integer => "integer",
            PropertyKind::Boolean => "boolean",
            PropertyKind::References { .. } => "references",
        }
    }
}

/// Definition of an entity type: what it is called, which properties it
/// declares and which of them must be filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeSpec {
    pub name: TypeName,
    pub label: String,
    pub category: Category,
    /// Abstract types only contribute properties to the types inheriting them.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits: Option<TypeName>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub required: Vec<String>,
}

/// Display label for an identifier kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierKind {
    pub kind: String,
    pub label: String,
}

/// A publication type as named by citation markup (`publication-type="book"`),
/// the entity type it produces, and the identifier kinds it admits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationTypeSpec {
    pub name: String,
    pub entity_type: TypeName,
    pub identifier_kinds: Vec<String>,
    /// Element tag → property, replacing the element rule's default target
    /// for this publication type (a book's `source` is its title).
    #[serde(default)]
    pub redirects: BTreeMap<String, String>,
}

/// Attribute that distinguishes elements sharing a tag
/// (`person-group-type="editor"`, `pub-id-type="doi"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Discriminator {
    pub attribute: String,
    pub value: String,
}

/// One element kind that citation normalization always materializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRule {
    pub element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    pub property: String,
}

impl ElementRule {
    pub fn plain(element: &str, property: &str) -> Self {
        Self {
            element: element.into(),
            discriminator: None,
            property: property.into(),
        }
    }

    pub fn discriminated(element: &str, attribute: &str, value: &str, property: &str) -> Self {
        Self {
            element: element.into(),
            discriminator: Some(Discriminator {
                attribute: attribute.into(),
                value: value.into(),
            }),
            property: property.into(),
        }
    }

    /// Human-readable key, e.g. `pub-id[pub-id-type=doi]`.
    pub fn key(&self) -> String {
        match &self.discriminator {
            Some(d) => format!("{}[{}={}]", self.element, d.attribute, d.value),
            None => self.element.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_serde_round_trip() {
        let spec = EntityTypeSpec {
            name: "person".into(),
            label: "Person".into(),
            category: Category::Contributor,
            is_abstract: false,
            inherits: None,
            properties: vec![
                PropertyDef::text("surname"),
                PropertyDef::references("affiliations", &["organisation"]),
            ],
            required: vec!["surname".into()],
        };
        let json = serde_json::to_string_pretty(&spec).unwrap();
        let back: EntityTypeSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }

    #[test]
    fn property_kind_is_internally_tagged() {
        let def = PropertyDef::references("authors", &["contributor"]);
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["kind"]["type"], "references");
        assert_eq!(json["kind"]["targets"][0], "contributor");
    }

    #[test]
    fn element_rule_key() {
        let rule = ElementRule::discriminated("pub-id", "pub-id-type", "doi", "doi");
        assert_eq!(rule.key(), "pub-id[pub-id-type=doi]");
        assert_eq!(ElementRule::plain("volume", "volume").key(), "volume");
    }
}
