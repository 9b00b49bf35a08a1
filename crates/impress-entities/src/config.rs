//! Schema configuration
//!
//! The registry is built from a `SchemaConfig` value. The default value
//! carries the built-in tables; deployments may load a complete replacement
//! from JSON or TOML, or patch the defaults with `SchemaOverrides`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::builtin;
use crate::kind::{Category, EntityKind};
use crate::schema::{
    ElementRule, EntityTypeSpec, IdentifierKind, PropertyDef, PropertyKind, PublicationTypeSpec,
};

/// Complete description of the entity schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub name: String,
    pub version: String,
    pub identifier_kinds: Vec<IdentifierKind>,
    pub entity_types: Vec<EntityTypeSpec>,
    pub publication_types: Vec<PublicationTypeSpec>,
    /// Citation elements that normalization always materializes, in scan order.
    pub citation_elements: Vec<ElementRule>,
    /// Citation elements left to caller-supplied location extraction.
    #[serde(default)]
    pub location_elements: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            name: "impress-metadata".into(),
            version: "1.0.0".into(),
            identifier_kinds: builtin::identifier_kinds(),
            entity_types: builtin::entity_types(),
            publication_types: builtin::publication_types(),
            citation_elements: builtin::citation_elements(),
            location_elements: builtin::location_elements(),
        }
    }
}

/// Per-deployment adjustments applied on top of a `SchemaConfig`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaOverrides {
    /// Entity type → replacement set of required properties.
    #[serde(default)]
    pub required: BTreeMap<String, Vec<String>>,
    /// Publication type → replacement list of admitted identifier kinds.
    #[serde(default)]
    pub identifier_kinds: BTreeMap<String, Vec<String>>,
}

impl SchemaOverrides {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.identifier_kinds.is_empty()
    }
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Apply overrides in place. Every named type must already exist.
    pub fn apply_overrides(&mut self, overrides: &SchemaOverrides) -> Result<(), ConfigError> {
        for (type_name, required) in &overrides.required {
            let spec = self
                .entity_types
                .iter_mut()
                .find(|t| &t.name == type_name)
                .ok_or_else(|| ConfigError::UnknownType(type_name.clone()))?;
            spec.required = required.clone();
        }
        for (pub_type, kinds) in &overrides.identifier_kinds {
            let spec = self
                .publication_types
                .iter_mut()
                .find(|p| &p.name == pub_type)
                .ok_or_else(|| ConfigError::UnknownType(pub_type.clone()))?;
            spec.identifier_kinds = kinds.clone();
        }
        Ok(())
    }

    /// Check that the tables are internally consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut by_name: HashMap<&str, &EntityTypeSpec> = HashMap::new();
        for spec in &self.entity_types {
            if by_name.insert(spec.name.as_str(), spec).is_some() {
                return Err(ConfigError::DuplicateType(spec.name.clone()));
            }
            if Category::from_name(&spec.name).is_some() {
                return Err(ConfigError::Invalid(format!(
                    "type name '{}' collides with a category name",
                    spec.name
                )));
            }
            if let Some(builtin) = EntityKind::from_name(&spec.name).builtin_category() {
                if builtin != spec.category {
                    return Err(ConfigError::Invalid(format!(
                        "built-in type '{}' must keep category '{}'",
                        spec.name,
                        builtin.as_str()
                    )));
                }
            }
            let mut seen = HashSet::new();
            for prop in &spec.properties {
                if !seen.insert(prop.name.as_str()) {
                    return Err(ConfigError::DuplicateProperty {
                        entity_type: spec.name.clone(),
                        property: prop.name.clone(),
                    });
                }
            }
        }

        for spec in &self.entity_types {
            // Parent chain must exist and be acyclic
            let mut visited = HashSet::from([spec.name.as_str()]);
            let mut parent = spec.inherits.as_deref();
            while let Some(p) = parent {
                let parent_spec = by_name.get(p).ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "type '{}' inherits unknown type '{}'",
                        spec.name, p
                    ))
                })?;
                if !visited.insert(p) {
                    return Err(ConfigError::Invalid(format!(
                        "inheritance cycle through '{}'",
                        spec.name
                    )));
                }
                parent = parent_spec.inherits.as_deref();
            }

            let properties = collect_properties(&by_name, spec);
            for required in &spec.required {
                if !properties.iter().any(|p| &p.name == required) {
                    return Err(ConfigError::Invalid(format!(
                        "type '{}' requires undeclared property '{}'",
                        spec.name, required
                    )));
                }
            }
            for prop in &properties {
                if let PropertyKind::References { targets } = &prop.kind {
                    for target in targets {
                        if !by_name.contains_key(target.as_str())
                            && Category::from_name(target).is_none()
                        {
                            return Err(ConfigError::Invalid(format!(
                                "property '{}.{}' targets unknown type '{}'",
                                spec.name, prop.name, target
                            )));
                        }
                    }
                }
            }
        }

        let known_ids: HashSet<&str> = self.identifier_kinds.iter().map(|k| k.kind.as_str()).collect();
        let mut pub_names = HashSet::new();
        for pub_type in &self.publication_types {
            if !pub_names.insert(pub_type.name.as_str()) {
                return Err(ConfigError::DuplicateType(pub_type.name.clone()));
            }
            let entity = by_name.get(pub_type.entity_type.as_str()).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "publication type '{}' maps to unknown entity type '{}'",
                    pub_type.name, pub_type.entity_type
                ))
            })?;
            if entity.category != Category::Publication || entity.is_abstract {
                return Err(ConfigError::Invalid(format!(
                    "publication type '{}' must map to a concrete publication type",
                    pub_type.name
                )));
            }
            for kind in &pub_type.identifier_kinds {
                if !known_ids.contains(kind.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "publication type '{}' admits unknown identifier kind '{}'",
                        pub_type.name, kind
                    )));
                }
            }
            let properties = collect_properties(&by_name, entity);
            let declared = |name: &str| properties.iter().any(|p| p.name == name);
            for rule in &self.citation_elements {
                let target = pub_type
                    .redirects
                    .get(&rule.element)
                    .unwrap_or(&rule.property);
                if !declared(target) {
                    return Err(ConfigError::Invalid(format!(
                        "element '{}' targets '{}', which '{}' does not declare",
                        rule.key(),
                        target,
                        entity.name
                    )));
                }
            }
        }

        for loc in &self.location_elements {
            if self.citation_elements.iter().any(|r| &r.element == loc) {
                return Err(ConfigError::Invalid(format!(
                    "location element '{}' must not be auto-expanded",
                    loc
                )));
            }
        }

        Ok(())
    }
}

/// Properties of a type including inherited ones; own declarations replace
/// inherited declarations of the same name.
pub(crate) fn collect_properties(
    by_name: &HashMap<&str, &EntityTypeSpec>,
    spec: &EntityTypeSpec,
) -> Vec<PropertyDef> {
    let mut properties = Vec::new();

    if let Some(parent) = spec.inherits.as_deref().and_then(|p| by_name.get(p)) {
        properties.extend(collect_properties(by_name, parent));
    }

    for prop in &spec.properties {
        if let Some(pos) = properties.iter().position(|p: &PropertyDef| p.name == prop.name) {
            properties[pos] = prop.clone();
        } else {
            properties.push(prop.clone());
        }
    }

    properties
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Duplicate type: {0}")]
    DuplicateType(String),

    #[error("Duplicate property '{property}' in type '{entity_type}'")]
    DuplicateProperty {
        entity_type: String,
        property: String,
    },

    #[error("Unknown type in overrides: {0}")]
    UnknownType(String),

    #[error("Invalid schema: {0}")]
    Invalid(String),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_serialization() {
        let config = SchemaConfig::default();
        let json = config.to_json().unwrap();
        let parsed = SchemaConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_toml_serialization() {
        let config = SchemaConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = SchemaConfig::from_toml(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_duplicate_type() {
        let mut config = SchemaConfig::default();
        let first = config.entity_types[0].clone();
        config.entity_types.push(first);
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateType(_))));
    }

    #[test]
    fn test_builtin_type_keeps_its_category() {
        let mut config = SchemaConfig::default();
        let keyword = config
            .entity_types
            .iter_mut()
            .find(|t| t.name == "keyword")
            .unwrap();
        keyword.category = Category::Publication;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_required_must_be_declared() {
        let mut config = SchemaConfig::default();
        let award = config
            .entity_types
            .iter_mut()
            .find(|t| t.name == "award")
            .unwrap();
        award.required.push("amount".into());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_location_elements_cannot_be_expanded() {
        let mut config = SchemaConfig::default();
        config
            .citation_elements
            .push(ElementRule::plain("fpage", "fpage"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inheritance_cycle() {
        let mut config = SchemaConfig::default();
        let entry = config
            .entity_types
            .iter_mut()
            .find(|t| t.name == builtin::BIBLIOGRAPHIC_ENTRY)
            .unwrap();
        entry.inherits = Some("book".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let overrides = SchemaOverrides::from_toml(
            r#"
            [required]
            subject = ["name"]

            [identifier_kinds]
            journal = ["doi"]
            "#,
        )
        .unwrap();
        let mut config = SchemaConfig::default();
        config.apply_overrides(&overrides).unwrap();
        assert!(config.validate().is_ok());

        let subject = config.entity_types.iter().find(|t| t.name == "subject").unwrap();
        assert_eq!(subject.required, vec!["name"]);
        let journal = config
            .publication_types
            .iter()
            .find(|p| p.name == "journal")
            .unwrap();
        assert_eq!(journal.identifier_kinds, vec!["doi"]);
    }

    #[test]
    fn test_overrides_unknown_type() {
        let mut overrides = SchemaOverrides::default();
        overrides.required.insert("poster".into(), vec![]);
        let mut config = SchemaConfig::default();
        assert!(matches!(
            config.apply_overrides(&overrides),
            Err(ConfigError::UnknownType(_))
        ));
    }
}
