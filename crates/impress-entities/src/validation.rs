//! Validation of entities against their required-property sets

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::mpsc::Receiver;

use crate::entity::{Entity, EntityId, Value};
use crate::event::{ChangeEvent, ChangeKind};
use crate::graph::EntityGraph;

/// Severity of a validation issue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    MissingRequiredProperty,
}

/// A problem found on one entity. Issues are data, not errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub entity: EntityId,
    pub entity_type: String,
    pub kind: IssueKind,
    pub property: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Entity not found: {0}")]
    NotFound(EntityId),
}

/// Check one entity against the required properties of its type.
///
/// Issues come out in the declaration order of the type's properties.
pub fn validate(graph: &EntityGraph, id: EntityId) -> Result<Vec<Issue>, ValidationError> {
    let entity = graph.get_entity(id).ok_or(ValidationError::NotFound(id))?;
    Ok(check_entity(graph, entity))
}

/// Validate every entity. Entities without issues are left out.
pub fn validate_all(graph: &EntityGraph) -> BTreeMap<EntityId, Vec<Issue>> {
    graph
        .entities()
        .map(|e| (e.id, check_entity(graph, e)))
        .filter(|(_, issues)| !issues.is_empty())
        .collect()
}

pub fn is_complete(graph: &EntityGraph, id: EntityId) -> Result<bool, ValidationError> {
    Ok(validate(graph, id)?.is_empty())
}

fn check_entity(graph: &EntityGraph, entity: &Entity) -> Vec<Issue> {
    let registry = graph.registry();
    let Ok(resolved) = registry.entity_type(entity.type_name()) else {
        // Graph mutations never admit an unregistered type
        return Vec::new();
    };

    resolved
        .properties
        .iter()
        .filter(|p| resolved.required.contains(&p.name))
        .filter(|p| is_missing(graph, entity.get(&p.name)))
        .map(|p| Issue {
            entity: entity.id,
            entity_type: entity.type_name().to_string(),
            kind: IssueKind::MissingRequiredProperty,
            property: p.name.clone(),
            message: format!("{} is missing {}", resolved.spec.label, p.name),
            severity: Severity::Error,
        })
        .collect()
}

fn is_missing(graph: &EntityGraph, value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::Refs(ids)) => !ids.iter().any(|id| graph.contains(*id)),
        Some(v) => v.is_empty(),
    }
}

/// Keeps the issue map of a graph current by revalidating only the entities
/// touched since the last `sync`.
#[derive(Debug)]
pub struct IssueTracker {
    events: Receiver<ChangeEvent>,
    issues: BTreeMap<EntityId, Vec<Issue>>,
}

impl IssueTracker {
    /// Subscribe to `graph` and take a full snapshot.
    pub fn attach(graph: &mut EntityGraph) -> Self {
        let events = graph.subscribe();
        Self {
            events,
            issues: validate_all(graph),
        }
    }

    /// Drain pending change events and revalidate what they touched.
    /// Returns the number of entities revalidated.
    pub fn sync(&mut self, graph: &EntityGraph) -> usize {
        let mut touched = HashSet::new();
        for event in self.events.try_iter() {
            match event.kind {
                ChangeKind::Deleted => {
                    self.issues.remove(&event.id);
                    touched.remove(&event.id);
                }
                ChangeKind::Created | ChangeKind::Updated { .. } => {
                    touched.insert(event.id);
                }
            }
        }

        for id in &touched {
            match graph.get_entity(*id) {
                Some(entity) => {
                    let issues = check_entity(graph, entity);
                    if issues.is_empty() {
                        self.issues.remove(id);
                    } else {
                        self.issues.insert(*id, issues);
                    }
                }
                None => {
                    self.issues.remove(id);
                }
            }
        }
        tracing::debug!(revalidated = touched.len(), open = self.total(), "issue tracker synced");
        touched.len()
    }

    pub fn issues(&self) -> &BTreeMap<EntityId, Vec<Issue>> {
        &self.issues
    }

    pub fn issues_for(&self, id: EntityId) -> &[Issue] {
        self.issues.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of open issues.
    pub fn total(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }
}
