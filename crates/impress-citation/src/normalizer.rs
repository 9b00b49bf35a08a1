//! Citation normalization
//!
//! Turns a raw citation tree into a bibliographic entry in the graph whose
//! shape does not depend on which elements the source happened to contain:
//! every auto-expanded element is materialized, empty if absent.

use serde::{Deserialize, Serialize};
use std::fmt;

use impress_entities::{
    CollectionKind, ElementRule, EntityGraph, EntityId, Properties, PropertyKind,
    PublicationTypeSpec, SchemaRegistry, Value,
};

use crate::element::CitationElement;
use crate::error::NormalizeError;
use crate::location::LocationExtractor;

pub const CITATION_ROOT: &str = "element-citation";
pub const DEFAULT_PUBLICATION_TYPE: &str = "journal";

/// Non-fatal findings. The entry is still produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "kebab-case")]
pub enum NormalizeWarning {
    /// An identifier of a kind the publication type does not admit was dropped.
    DisallowedIdentifier {
        kind: String,
        publication_type: String,
        value: String,
    },
    /// A `pub-id` of a kind the schema does not know.
    UnknownIdentifier { kind: String, value: String },
    /// The element occurred more than once; the first occurrence was used.
    DuplicateElement { element: String },
    /// A discriminated element matched no rule (e.g. a translator group).
    IgnoredElement { element: String },
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeWarning::DisallowedIdentifier {
                kind,
                publication_type,
                value,
            } => write!(f, "dropped {} '{}': not allowed for {}", kind, value, publication_type),
            NormalizeWarning::UnknownIdentifier { kind, value } => {
                write!(f, "unknown identifier kind '{}' ({})", kind, value)
            }
            NormalizeWarning::DuplicateElement { element } => {
                write!(f, "repeated {}; first occurrence kept", element)
            }
            NormalizeWarning::IgnoredElement { element } => write!(f, "ignored {}", element),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCitation {
    pub entry: EntityId,
    pub entity_type: String,
    pub publication_type: String,
    /// Contributor entities created for the entry, in document order.
    pub contributors: Vec<EntityId>,
    pub warnings: Vec<NormalizeWarning>,
}

/// Outcome of importing a batch of citations. Indices refer to the input.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<EntityId>,
    pub warnings: Vec<(usize, NormalizeWarning)>,
    pub failures: Vec<(usize, NormalizeError)>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.failures.is_empty()
    }
}

/// A contributor read from a person group, not yet in the graph.
struct PendingContributor {
    entity_type: &'static str,
    properties: Properties,
}

#[derive(Default)]
pub struct Normalizer {
    location: Option<Box<dyn LocationExtractor>>,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("location", &self.location.is_some())
            .finish()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location_extractor(mut self, extractor: impl LocationExtractor + 'static) -> Self {
        self.location = Some(Box::new(extractor));
        self
    }

    pub fn normalize(
        &self,
        graph: &mut EntityGraph,
        tree: &CitationElement,
    ) -> Result<NormalizedCitation, NormalizeError> {
        if tree.tag != CITATION_ROOT {
            return Err(NormalizeError::UnexpectedRoot(tree.tag.clone()));
        }
        let registry = graph.shared_registry();
        let pub_name = tree
            .attr("publication-type")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_PUBLICATION_TYPE);
        let pub_type = registry
            .publication_type(pub_name)
            .map_err(|_| NormalizeError::UnknownPublicationType(pub_name.to_string()))?;
        let entity_type = pub_type.entity_type.as_str();

        let mut warnings = Vec::new();
        let mut properties = Properties::new();
        let mut groups: Vec<(String, Vec<PendingContributor>)> = Vec::new();

        for rule in registry.element_rules() {
            let target = pub_type
                .redirects
                .get(&rule.element)
                .unwrap_or(&rule.property)
                .as_str();
            let mut matches = tree.children.iter().filter(|c| matches_rule(rule, c));
            let first = matches.next();
            if matches.next().is_some() {
                warnings.push(NormalizeWarning::DuplicateElement { element: rule.key() });
            }

            match registry.property(entity_type, target).map(|p| &p.kind) {
                Some(PropertyKind::References { .. }) => {
                    let pending = first.map(read_person_group).unwrap_or_default();
                    match groups.iter_mut().find(|(t, _)| t == target) {
                        Some((_, existing)) if existing.is_empty() => *existing = pending,
                        Some(_) => {}
                        None => groups.push((target.to_string(), pending)),
                    }
                }
                _ => {
                    let text = first.map(|e| e.text.trim()).unwrap_or_default();
                    let text = if registry.is_identifier(target) && !admits(pub_type, target) {
                        if !text.is_empty() {
                            tracing::warn!(kind = target, publication_type = pub_name, "dropping identifier");
                            warnings.push(NormalizeWarning::DisallowedIdentifier {
                                kind: target.to_string(),
                                publication_type: pub_name.to_string(),
                                value: text.to_string(),
                            });
                        }
                        ""
                    } else {
                        text
                    };
                    let slot = properties
                        .entry(target.to_string())
                        .or_insert_with(|| Value::text(""));
                    if slot.is_empty() && !text.is_empty() {
                        *slot = Value::text(text);
                    }
                }
            }
        }

        warnings.extend(unmatched_elements(registry.as_ref(), tree));

        if let Some(extractor) = &self.location {
            for (property, value) in extractor.extract(tree) {
                let declared = registry
                    .property(entity_type, &property)
                    .is_some_and(|p| p.kind == PropertyKind::Text);
                if declared && !value.trim().is_empty() {
                    properties.insert(property, Value::text(value.trim()));
                }
            }
        }

        // Graph mutation starts here; undo contributor creation on failure
        let mut contributors = Vec::new();
        let mut result = Ok(());
        for (target, pending) in groups {
            let mut ids = Vec::new();
            for contributor in pending {
                match graph.create_entity(contributor.entity_type, contributor.properties) {
                    Ok(id) => {
                        ids.push(id);
                        contributors.push(id);
                    }
                    Err(e) => {
                        result = Err(e);
                        break;
                    }
                }
            }
            properties.insert(target, Value::Refs(ids));
            if result.is_err() {
                break;
            }
        }
        let entry = result.and_then(|_| graph.create_entity(entity_type, properties));
        let entry = match entry {
            Ok(id) => id,
            Err(e) => {
                discard(graph, &contributors);
                return Err(e.into());
            }
        };

        tracing::debug!(%entry, entity_type, contributors = contributors.len(), warnings = warnings.len(), "normalized citation");
        Ok(NormalizedCitation {
            entry,
            entity_type: entity_type.to_string(),
            publication_type: pub_name.to_string(),
            contributors,
            warnings,
        })
    }

    /// Normalize each citation and append the entries to the article's
    /// references. A failing citation is reported and skipped.
    pub fn import_references(&self, graph: &mut EntityGraph, trees: &[CitationElement]) -> ImportReport {
        let mut report = ImportReport::default();
        for (index, tree) in trees.iter().enumerate() {
            let normalized = match self.normalize(graph, tree) {
                Ok(n) => n,
                Err(e) => {
                    report.failures.push((index, e));
                    continue;
                }
            };
            if let Err(e) = graph.append_to_collection(CollectionKind::References, normalized.entry) {
                discard(graph, &[normalized.entry]);
                discard(graph, &normalized.contributors);
                report.failures.push((index, e.into()));
                continue;
            }
            report.imported.push(normalized.entry);
            report
                .warnings
                .extend(normalized.warnings.into_iter().map(|w| (index, w)));
        }
        tracing::info!(
            imported = report.imported.len(),
            failed = report.failures.len(),
            "imported references"
        );
        report
    }
}

/// Normalize with the default normalizer (no location extraction).
pub fn normalize(graph: &mut EntityGraph, tree: &CitationElement) -> Result<NormalizedCitation, NormalizeError> {
    Normalizer::new().normalize(graph, tree)
}

pub fn import_references(graph: &mut EntityGraph, trees: &[CitationElement]) -> ImportReport {
    Normalizer::new().import_references(graph, trees)
}

/// Remove entities created for a citation that was not kept.
fn discard(graph: &mut EntityGraph, ids: &[EntityId]) {
    for id in ids {
        if let Err(e) = graph.delete_entity(*id) {
            tracing::warn!(%id, error = %e, "failed to roll back citation entity");
        }
    }
}

fn admits(pub_type: &PublicationTypeSpec, kind: &str) -> bool {
    pub_type.identifier_kinds.iter().any(|k| k == kind)
}

fn matches_rule(rule: &ElementRule, element: &CitationElement) -> bool {
    element.tag == rule.element
        && rule
            .discriminator
            .as_ref()
            .map_or(true, |d| element.attr(&d.attribute) == Some(d.value.as_str()))
}

/// Discriminated elements whose discriminator value no rule covers.
fn unmatched_elements(registry: &SchemaRegistry, tree: &CitationElement) -> Vec<NormalizeWarning> {
    let rules = registry.element_rules();
    let mut found = Vec::new();
    for child in &tree.children {
        let candidates: Vec<&ElementRule> = rules
            .iter()
            .filter(|r| r.element == child.tag && r.discriminator.is_some())
            .collect();
        if candidates.is_empty() || candidates.iter().any(|r| matches_rule(r, child)) {
            continue;
        }
        let attribute = candidates[0]
            .discriminator
            .as_ref()
            .map(|d| d.attribute.as_str())
            .unwrap_or_default();
        let kind = child.attr(attribute).unwrap_or_default().to_string();
        let is_identifier_element = candidates
            .iter()
            .any(|r| registry.is_identifier(&r.property));
        if is_identifier_element {
            found.push(NormalizeWarning::UnknownIdentifier {
                kind,
                value: child.text.trim().to_string(),
            });
        } else {
            found.push(NormalizeWarning::IgnoredElement {
                element: format!("{}[{}={}]", child.tag, attribute, kind),
            });
        }
    }
    found
}

/// Contributors of a person group in document order.
fn read_person_group(group: &CitationElement) -> Vec<PendingContributor> {
    let mut pending = Vec::new();
    for child in &group.children {
        let (entity_type, properties) = match child.tag.as_str() {
            "name" => {
                let mut properties = Properties::new();
                for (element, property) in [
                    ("surname", "name"),
                    ("given-names", "givenNames"),
                    ("prefix", "prefix"),
                    ("suffix", "suffix"),
                ] {
                    if let Some(text) = child.child_text(element) {
                        properties.insert(property.to_string(), Value::text(text));
                    }
                }
                ("ref-contrib", properties)
            }
            "string-name" => ("ref-contrib", text_property("name", child)),
            "collab" => ("group", text_property("name", child)),
            _ => continue,
        };
        pending.push(PendingContributor {
            entity_type,
            properties,
        });
    }
    pending
}

fn text_property(property: &str, element: &CitationElement) -> Properties {
    let mut properties = Properties::new();
    let text = element.text.trim();
    if !text.is_empty() {
        properties.insert(property.to_string(), Value::text(text));
    }
    properties
}
