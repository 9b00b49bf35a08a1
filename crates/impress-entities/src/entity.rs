use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::kind::{EntityKind, PublicationKind};

/// Globally unique entity identifier (UUID v4).
pub type EntityId = Uuid;

/// Property values keyed by property name.
pub type Properties = BTreeMap<String, Value>;

/// Partial update: present keys are replaced, `Value::Null` removes the key.
pub type PropertyPatch = BTreeMap<String, Value>;

/// Dynamic value type for entity properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Boolean(bool),
    Refs(Vec<EntityId>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn refs(ids: impl IntoIterator<Item = EntityId>) -> Self {
        Value::Refs(ids.into_iter().collect())
    }

    /// Empty text (whitespace only counts as empty), an empty reference list,
    /// or null.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Refs(ids) => ids.is_empty(),
            Value::Integer(_) | Value::Boolean(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_refs(&self) -> Option<&[EntityId]> {
        match self {
            Value::Refs(ids) => Some(ids),
            _ => None,
        }
    }

    /// Short name of the value shape, for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Refs(_) => "references",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<EntityId>> for Value {
    fn from(ids: Vec<EntityId>) -> Self {
        Value::Refs(ids)
    }
}

/// Build a property map from `(name, value)` pairs.
pub fn props<K, V, I>(pairs: I) -> Properties
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A node of the entity graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub properties: Properties,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Entity {
    pub fn new(kind: EntityKind, properties: Properties) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            properties,
            created: now,
            modified: now,
        }
    }

    pub fn type_name(&self) -> &str {
        self.kind.name()
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    pub fn text(&self, property: &str) -> Option<&str> {
        self.get(property).and_then(Value::as_text)
    }

    /// Reference list of a property; empty when unset.
    pub fn refs(&self, property: &str) -> &[EntityId] {
        self.get(property).and_then(Value::as_refs).unwrap_or(&[])
    }

    /// Whether any reference property points at `target`.
    pub fn references(&self, target: EntityId) -> bool {
        self.properties
            .values()
            .any(|v| v.as_refs().is_some_and(|ids| ids.contains(&target)))
    }

    /// Shared accessors for publication entities.
    pub fn as_entry(&self) -> Option<EntryView<'_>> {
        match self.kind {
            EntityKind::Publication(kind) => Some(EntryView { entity: self, kind }),
            _ => None,
        }
    }

    /// Values of a custom metadata field. A field holds one text in which
    /// several values may be separated by commas.
    pub fn field_values(&self) -> Vec<&str> {
        if self.kind != EntityKind::CustomField {
            return Vec::new();
        }
        self.text("value")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Roles under which contributors are linked to a bibliographic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorRole {
    Author,
    Editor,
    Inventor,
}

impl ContributorRole {
    pub fn property(&self) -> &'static str {
        match self {
            ContributorRole::Author => "authors",
            ContributorRole::Editor => "editors",
            ContributorRole::Inventor => "inventors",
        }
    }
}

/// Accessors shared by every kind of bibliographic entry.
pub trait BibliographicEntry {
    fn publication_kind(&self) -> PublicationKind;
    fn title(&self) -> Option<&str>;
    fn container_title(&self) -> Option<&str>;
    fn year(&self) -> Option<&str>;
    fn contributors(&self, role: ContributorRole) -> &[EntityId];
    fn identifier(&self, kind: &str) -> Option<&str>;
}

/// Borrowed view of a publication entity.
#[derive(Debug, Clone, Copy)]
pub struct EntryView<'a> {
    entity: &'a Entity,
    kind: PublicationKind,
}

impl<'a> EntryView<'a> {
    pub fn entity(&self) -> &'a Entity {
        self.entity
    }

    fn non_empty(&self, property: &str) -> Option<&'a str> {
        self.entity.text(property).filter(|s| !s.trim().is_empty())
    }
}

impl BibliographicEntry for EntryView<'_> {
    fn publication_kind(&self) -> PublicationKind {
        self.kind
    }

    fn title(&self) -> Option<&str> {
        self.non_empty("title")
    }

    fn container_title(&self) -> Option<&str> {
        self.non_empty("containerTitle")
    }

    fn year(&self) -> Option<&str> {
        self.non_empty("year")
    }

    fn contributors(&self, role: ContributorRole) -> &[EntityId] {
        self.entity.refs(role.property())
    }

    fn identifier(&self, kind: &str) -> Option<&str> {
        self.non_empty(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ContributorKind;

    #[test]
    fn value_serde_round_trip() {
        let values = vec![
            Value::Null,
            Value::text("hello"),
            Value::Integer(42),
            Value::Boolean(true),
            Value::refs([Uuid::new_v4(), Uuid::new_v4()]),
        ];
        for v in &values {
            let json = serde_json::to_string(v).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(*v, back);
        }
    }

    #[test]
    fn emptiness() {
        assert!(Value::Null.is_empty());
        assert!(Value::text("").is_empty());
        assert!(Value::text("   ").is_empty());
        assert!(Value::Refs(vec![]).is_empty());
        assert!(!Value::text("X").is_empty());
        assert!(!Value::Boolean(false).is_empty());
    }

    #[test]
    fn entity_serde_round_trip() {
        let author = Uuid::new_v4();
        let entity = Entity::new(
            EntityKind::Publication(PublicationKind::JournalArticle),
            props([
                ("title", Value::text("A Great Paper")),
                ("authors", Value::refs([author])),
            ]),
        );
        let json = serde_json::to_string_pretty(&entity).unwrap();
        assert!(json.contains("\"type\": \"journal-article\""));
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(entity, back);
    }

    #[test]
    fn entry_view_accessors() {
        let author = Uuid::new_v4();
        let entity = Entity::new(
            EntityKind::Publication(PublicationKind::Book),
            props([
                ("title", Value::text("Dune")),
                ("containerTitle", Value::text("  ")),
                ("isbn", Value::text("978-0441013593")),
                ("authors", Value::refs([author])),
            ]),
        );
        let entry = entity.as_entry().unwrap();
        assert_eq!(entry.publication_kind(), PublicationKind::Book);
        assert_eq!(entry.title(), Some("Dune"));
        assert_eq!(entry.container_title(), None);
        assert_eq!(entry.identifier("isbn"), Some("978-0441013593"));
        assert_eq!(entry.contributors(ContributorRole::Author), &[author]);
        assert!(entry.contributors(ContributorRole::Editor).is_empty());

        let person = Entity::new(EntityKind::Contributor(ContributorKind::Person), Properties::new());
        assert!(person.as_entry().is_none());
    }

    #[test]
    fn custom_field_values_split_on_commas() {
        let field = Entity::new(
            EntityKind::CustomField,
            props([("name", "Funding"), ("value", "NIH, NSF ,, ERC")]),
        );
        assert_eq!(field.field_values(), vec!["NIH", "NSF", "ERC"]);
    }

    #[test]
    fn role_properties() {
        assert_eq!(ContributorRole::Author.property(), "authors");
        assert_eq!(ContributorRole::Editor.property(), "editors");
        assert_eq!(ContributorRole::Inventor.property(), "inventors");
    }
}
