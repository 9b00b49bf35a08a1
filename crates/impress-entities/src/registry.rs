use std::collections::{BTreeSet, HashMap};

use crate::builtin;
use crate::config::{collect_properties, ConfigError, SchemaConfig};
use crate::kind::{Category, EntityKind};
use crate::schema::{
    ElementRule, EntityTypeSpec, IdentifierKind, PropertyDef, PropertyKind, PublicationTypeSpec,
};

/// Error from the schema registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A registered entity type with inheritance already resolved.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub spec: EntityTypeSpec,
    pub kind: EntityKind,
    pub properties: Vec<PropertyDef>,
    pub required: BTreeSet<String>,
}

/// Lookup tables for entity types, publication types and citation rules.
///
/// Built once from a validated `SchemaConfig` and immutable afterwards.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    name: String,
    version: String,
    types: HashMap<String, ResolvedType>,
    type_order: Vec<String>,
    publication_types: Vec<PublicationTypeSpec>,
    publication_by_entity: HashMap<String, usize>,
    identifier_kinds: Vec<IdentifierKind>,
    element_rules: Vec<ElementRule>,
    location_elements: Vec<String>,
}

impl SchemaRegistry {
    /// Validate `config` and build a registry from it.
    pub fn new(config: SchemaConfig) -> Result<Self, RegistryError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SchemaConfig) -> Self {
        let by_name: HashMap<&str, &EntityTypeSpec> = config
            .entity_types
            .iter()
            .map(|t| (t.name.as_str(), t))
            .collect();

        let mut types = HashMap::new();
        let mut type_order = Vec::new();
        for spec in &config.entity_types {
            let mut required = BTreeSet::new();
            let mut cursor = Some(spec);
            while let Some(s) = cursor {
                required.extend(s.required.iter().cloned());
                cursor = s.inherits.as_deref().and_then(|p| by_name.get(p).copied());
            }
            let resolved = ResolvedType {
                spec: spec.clone(),
                kind: EntityKind::from_name(&spec.name),
                properties: collect_properties(&by_name, spec),
                required,
            };
            type_order.push(spec.name.clone());
            types.insert(spec.name.clone(), resolved);
        }

        let publication_by_entity = config
            .publication_types
            .iter()
            .enumerate()
            .rev()
            .map(|(i, p)| (p.entity_type.clone(), i))
            .collect();

        Self {
            name: config.name,
            version: config.version,
            types,
            type_order,
            publication_types: config.publication_types,
            publication_by_entity,
            identifier_kinds: config.identifier_kinds,
            element_rules: config.citation_elements,
            location_elements: config.location_elements,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Registered type names in declaration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.type_order.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Get a resolved type by name.
    pub fn entity_type(&self, type_name: &str) -> Result<&ResolvedType, RegistryError> {
        self.types
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownType(type_name.to_string()))
    }

    /// Get a type that can be instantiated. Abstract types are reported as unknown.
    pub fn concrete_type(&self, type_name: &str) -> Result<&ResolvedType, RegistryError> {
        let resolved = self.entity_type(type_name)?;
        if resolved.spec.is_abstract {
            return Err(RegistryError::UnknownType(type_name.to_string()));
        }
        Ok(resolved)
    }

    /// Required property names for a type, inherited requirements included.
    pub fn required_properties(&self, type_name: &str) -> Result<&BTreeSet<String>, RegistryError> {
        Ok(&self.entity_type(type_name)?.required)
    }

    /// Property declarations for a type, inherited ones first.
    pub fn properties(&self, type_name: &str) -> Result<&[PropertyDef], RegistryError> {
        Ok(&self.entity_type(type_name)?.properties)
    }

    pub fn property(&self, type_name: &str, property: &str) -> Option<&PropertyDef> {
        self.types
            .get(type_name)?
            .properties
            .iter()
            .find(|p| p.name == property)
    }

    pub fn label(&self, type_name: &str) -> Result<&str, RegistryError> {
        Ok(&self.entity_type(type_name)?.spec.label)
    }

    pub fn category(&self, type_name: &str) -> Result<Category, RegistryError> {
        Ok(self.entity_type(type_name)?.spec.category)
    }

    /// Whether an entity of `type_name` may be the target of a reference
    /// property declaring `targets`.
    pub fn accepts(&self, targets: &[String], type_name: &str) -> bool {
        let category = match self.types.get(type_name) {
            Some(t) => t.spec.category,
            None => return false,
        };
        targets
            .iter()
            .any(|t| t == type_name || t == category.as_str())
    }

    /// Admissible targets of a reference property, if it is one.
    pub fn reference_targets(&self, type_name: &str, property: &str) -> Option<&[String]> {
        match &self.property(type_name, property)?.kind {
            PropertyKind::References { targets } => Some(targets),
            _ => None,
        }
    }

    pub fn publication_type(&self, name: &str) -> Result<&PublicationTypeSpec, RegistryError> {
        self.publication_types
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| RegistryError::UnknownType(name.to_string()))
    }

    pub fn publication_types(&self) -> &[PublicationTypeSpec] {
        &self.publication_types
    }

    /// The publication type an entity type is produced for, if any.
    pub fn publication_type_for_entity(&self, entity_type: &str) -> Option<&PublicationTypeSpec> {
        self.publication_by_entity
            .get(entity_type)
            .map(|&i| &self.publication_types[i])
    }

    /// Allowed identifier kinds for a publication type, in declared order,
    /// each with its display label.
    pub fn identifier_kinds(&self, publication_type: &str) -> Result<Vec<&IdentifierKind>, RegistryError> {
        let spec = self.publication_type(publication_type)?;
        Ok(spec
            .identifier_kinds
            .iter()
            .filter_map(|k| self.identifier_kinds.iter().find(|i| &i.kind == k))
            .collect())
    }

    pub fn all_identifier_kinds(&self) -> &[IdentifierKind] {
        &self.identifier_kinds
    }

    pub fn is_identifier(&self, kind: &str) -> bool {
        self.identifier_kinds.iter().any(|i| i.kind == kind)
    }

    pub fn identifier_label(&self, kind: &str) -> Option<&str> {
        self.identifier_kinds
            .iter()
            .find(|i| i.kind == kind)
            .map(|i| i.label.as_str())
    }

    pub fn element_rules(&self) -> &[ElementRule] {
        &self.element_rules
    }

    pub fn location_elements(&self) -> &[String] {
        &self.location_elements
    }

    pub fn article_record_type(&self) -> &'static str {
        builtin::ARTICLE_RECORD
    }
}

impl Default for SchemaRegistry {
    /// Registry over the built-in tables.
    fn default() -> Self {
        Self::build(SchemaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyDef;

    #[test]
    fn required_properties_for_builtin_types() {
        let reg = SchemaRegistry::default();
        let journal = reg.required_properties("journal-article").unwrap();
        assert_eq!(
            journal.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            vec!["authors", "containerTitle", "title"]
        );
        assert!(reg.required_properties("subject").unwrap().is_empty());
        assert_eq!(reg.required_properties("award").unwrap().len(), 1);
    }

    #[test]
    fn unknown_type_fails() {
        let reg = SchemaRegistry::default();
        assert!(matches!(
            reg.required_properties("poster"),
            Err(RegistryError::UnknownType(_))
        ));
        assert!(matches!(
            reg.identifier_kinds("preprint"),
            Err(RegistryError::UnknownType(_))
        ));
    }

    #[test]
    fn abstract_type_is_not_concrete() {
        let reg = SchemaRegistry::default();
        assert!(reg.entity_type(builtin::BIBLIOGRAPHIC_ENTRY).is_ok());
        assert!(reg.concrete_type(builtin::BIBLIOGRAPHIC_ENTRY).is_err());
        assert!(reg.concrete_type("book").is_ok());
    }

    #[test]
    fn variants_inherit_entry_properties() {
        let reg = SchemaRegistry::default();
        assert!(reg.property("thesis", "containerTitle").is_some());
        assert!(reg.property("thesis", "isbn").is_some());
        assert!(reg.property("person", "isbn").is_none());
    }

    #[test]
    fn identifier_kinds_with_labels() {
        let reg = SchemaRegistry::default();
        let journal: Vec<_> = reg
            .identifier_kinds("journal")
            .unwrap()
            .into_iter()
            .map(|k| (k.kind.as_str(), k.label.as_str()))
            .collect();
        assert_eq!(journal, vec![("doi", "DOI"), ("pmid", "PubMed ID")]);
        assert_eq!(reg.identifier_kinds("book").unwrap().len(), 3);
        assert_eq!(reg.identifier_label("isbn"), Some("ISBN"));
    }

    #[test]
    fn accepts_by_type_or_category() {
        let reg = SchemaRegistry::default();
        let authors = reg.reference_targets("journal-article", "authors").unwrap();
        assert!(reg.accepts(authors, "person"));
        assert!(reg.accepts(authors, "ref-contrib"));
        assert!(!reg.accepts(authors, "keyword"));
        let affiliations = reg.reference_targets("person", "affiliations").unwrap();
        assert!(reg.accepts(affiliations, "organisation"));
        assert!(!reg.accepts(affiliations, "group"));
    }

    #[test]
    fn publication_type_for_entity() {
        let reg = SchemaRegistry::default();
        assert_eq!(
            reg.publication_type_for_entity("journal-article").unwrap().name,
            "journal"
        );
        assert!(reg.publication_type_for_entity("person").is_none());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = SchemaConfig::default();
        config
            .entity_types
            .iter_mut()
            .find(|t| t.name == "keyword")
            .unwrap()
            .properties
            .push(PropertyDef::text("name"));
        assert!(matches!(
            SchemaRegistry::new(config),
            Err(RegistryError::Config(ConfigError::DuplicateProperty { .. }))
        ));
    }

    #[test]
    fn custom_types_from_config() {
        let mut config = SchemaConfig::default();
        config.entity_types.push(EntityTypeSpec {
            name: "funding-statement".into(),
            label: "Funding Statement".into(),
            category: Category::Extension,
            is_abstract: false,
            inherits: None,
            properties: vec![PropertyDef::text("text")],
            required: vec!["text".into()],
        });
        let reg = SchemaRegistry::new(config).unwrap();
        let resolved = reg.entity_type("funding-statement").unwrap();
        assert_eq!(resolved.kind, EntityKind::Custom("funding-statement".into()));
        assert!(reg.type_names().any(|n| n == "funding-statement"));
    }
}
