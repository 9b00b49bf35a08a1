//! The entity graph: an arena of typed entities addressed by id.
//!
//! All relations are id lists stored in reference properties. Mutations are
//! checked completely before anything is written, so a failed call leaves
//! the graph untouched. Each applied change is announced to subscribers in
//! order, before the call returns.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::collection::CollectionKind;
use crate::entity::{Entity, EntityId, Properties, PropertyPatch, Value};
use crate::error::GraphError;
use crate::event::{ChangeEvent, ChangeKind};
use crate::kind::EntityKind;
use crate::registry::SchemaRegistry;
use crate::schema::PropertyKind;

pub struct EntityGraph {
    registry: Arc<SchemaRegistry>,
    entities: HashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    article: EntityId,
    seq: u64,
    subscribers: Vec<Sender<ChangeEvent>>,
}

impl std::fmt::Debug for EntityGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityGraph")
            .field("article", &self.article)
            .field("entities", &self.order.len())
            .field("seq", &self.seq)
            .finish()
    }
}

impl EntityGraph {
    /// Create a graph holding only an empty article record.
    pub fn new(registry: Arc<SchemaRegistry>) -> Result<Self, GraphError> {
        let record_type = registry.article_record_type();
        registry.concrete_type(record_type)?;
        let article = Entity::new(EntityKind::ArticleRecord, Properties::new());
        Ok(Self::with_article(registry, article))
    }

    pub(crate) fn with_article(registry: Arc<SchemaRegistry>, article: Entity) -> Self {
        let id = article.id;
        Self {
            registry,
            entities: HashMap::from([(id, article)]),
            order: vec![id],
            article: id,
            seq: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<SchemaRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn article_id(&self) -> EntityId {
        self.article
    }

    pub fn article(&self) -> &Entity {
        &self.entities[&self.article]
    }

    /// Sequence number of the last emitted event.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Subscribe to change notifications. Events are sent during the
    /// mutating call, in the order the changes were applied.
    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, id: EntityId, entity_type: String, kind: ChangeKind) {
        self.seq += 1;
        let event = ChangeEvent {
            seq: self.seq,
            id,
            entity_type,
            kind,
        };
        // Drop subscribers whose receiver is gone
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ===== Read access =====

    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Like `get_entity`, but a missing id is an error.
    pub fn entity(&self, id: EntityId) -> Result<&Entity, GraphError> {
        self.entities.get(&id).ok_or(GraphError::NotFound(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities, the article record included.
    pub fn entity_count(&self) -> usize {
        self.order.len()
    }

    /// All ids in insertion order.
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Ids of all entities of a registered type, in insertion order.
    pub fn query_by_type(&self, type_name: &str) -> Result<Vec<EntityId>, GraphError> {
        self.registry.entity_type(type_name)?;
        Ok(self
            .entities()
            .filter(|e| e.type_name() == type_name)
            .map(|e| e.id)
            .collect())
    }

    /// Entities that reference `id`, with the referencing property, in
    /// insertion order.
    pub fn referrers(&self, id: EntityId) -> Vec<(EntityId, String)> {
        let mut found = Vec::new();
        for entity in self.entities() {
            for (name, value) in &entity.properties {
                if value.as_refs().is_some_and(|ids| ids.contains(&id)) {
                    found.push((entity.id, name.clone()));
                }
            }
        }
        found
    }

    // ===== Mutation =====

    /// Create an entity of a registered, concrete type.
    pub fn create_entity(
        &mut self,
        type_name: &str,
        initial: Properties,
    ) -> Result<EntityId, GraphError> {
        let resolved = self.registry.concrete_type(type_name)?;
        if resolved.kind == EntityKind::ArticleRecord {
            return Err(GraphError::ArticleRecord("created"));
        }
        let kind = resolved.kind.clone();
        self.check_properties(type_name, &initial)?;

        let properties: Properties = initial
            .into_iter()
            .filter(|(_, v)| !matches!(v, Value::Null))
            .collect();
        let entity = Entity::new(kind, properties);
        let id = entity.id;
        self.entities.insert(id, entity);
        self.order.push(id);

        tracing::debug!(%id, entity_type = type_name, "created entity");
        self.emit(id, type_name.to_string(), ChangeKind::Created);
        Ok(id)
    }

    /// Apply a partial update. `Value::Null` removes a property.
    pub fn update_entity(&mut self, id: EntityId, patch: PropertyPatch) -> Result<(), GraphError> {
        let type_name = self.entity(id)?.type_name().to_string();
        self.check_properties(&type_name, &patch)?;
        if patch.is_empty() {
            return Ok(());
        }

        let changed: Vec<String> = patch.keys().cloned().collect();
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(GraphError::NotFound(id))?;
        for (name, value) in patch {
            if matches!(value, Value::Null) {
                entity.properties.remove(&name);
            } else {
                entity.properties.insert(name, value);
            }
        }
        entity.modified = Utc::now();

        tracing::debug!(%id, entity_type = %type_name, properties = ?changed, "updated entity");
        self.emit(id, type_name, ChangeKind::Updated { properties: changed });
        Ok(())
    }

    /// Delete an entity, removing its id from every reference property that
    /// points at it. Returns the ids of the entities that were repaired.
    pub fn delete_entity(&mut self, id: EntityId) -> Result<Vec<EntityId>, GraphError> {
        if id == self.article {
            return Err(GraphError::ArticleRecord("deleted"));
        }
        let entity = self.entities.remove(&id).ok_or(GraphError::NotFound(id))?;
        self.order.retain(|e| *e != id);

        let mut repaired = Vec::new();
        let now = Utc::now();
        for referrer_id in &self.order {
            let Some(referrer) = self.entities.get_mut(referrer_id) else {
                continue;
            };
            let mut changed = Vec::new();
            for (name, value) in referrer.properties.iter_mut() {
                if let Value::Refs(ids) = value {
                    let before = ids.len();
                    ids.retain(|t| *t != id);
                    if ids.len() != before {
                        changed.push(name.clone());
                    }
                }
            }
            if !changed.is_empty() {
                referrer.modified = now;
                repaired.push((*referrer_id, referrer.type_name().to_string(), changed));
            }
        }

        tracing::debug!(%id, entity_type = entity.type_name(), repaired = repaired.len(), "deleted entity");
        self.emit(id, entity.type_name().to_string(), ChangeKind::Deleted);
        let repaired_ids = repaired.iter().map(|(rid, _, _)| *rid).collect();
        for (rid, type_name, properties) in repaired {
            self.emit(rid, type_name, ChangeKind::Updated { properties });
        }
        Ok(repaired_ids)
    }

    /// Check a property map against the schema of `type_name` and the current
    /// graph contents. Nothing is modified.
    pub(crate) fn check_properties(
        &self,
        type_name: &str,
        properties: &Properties,
    ) -> Result<(), GraphError> {
        for (name, value) in properties {
            let def = self.registry.property(type_name, name).ok_or_else(|| {
                GraphError::InvalidProperty {
                    entity_type: type_name.to_string(),
                    property: name.clone(),
                    reason: "not declared by the schema".into(),
                }
            })?;

            match (&def.kind, value) {
                (_, Value::Null) => {}
                (PropertyKind::Text, Value::Text(text)) => {
                    self.check_identifier(type_name, name, text)?;
                }
                (PropertyKind::Integer, Value::Integer(_)) => {}
                (PropertyKind::Boolean, Value::Boolean(_)) => {}
                (PropertyKind::References { targets }, Value::Refs(ids)) => {
                    let mut seen = HashSet::new();
                    for target in ids {
                        if !seen.insert(target) {
                            return Err(GraphError::InvalidProperty {
                                entity_type: type_name.to_string(),
                                property: name.clone(),
                                reason: format!("{} is listed twice", target),
                            });
                        }
                        let target_entity = self.entities.get(target).ok_or_else(|| {
                            GraphError::InvalidReference {
                                entity_type: type_name.to_string(),
                                property: name.clone(),
                                target: *target,
                                reason: "no such entity".into(),
                            }
                        })?;
                        if !self.registry.accepts(targets, target_entity.type_name()) {
                            return Err(GraphError::InvalidReference {
                                entity_type: type_name.to_string(),
                                property: name.clone(),
                                target: *target,
                                reason: format!(
                                    "'{}' is not one of {:?}",
                                    target_entity.type_name(),
                                    targets
                                ),
                            });
                        }
                    }
                }
                (kind, value) => {
                    return Err(GraphError::InvalidProperty {
                        entity_type: type_name.to_string(),
                        property: name.clone(),
                        reason: format!("expected {}, got {}", kind.name(), value.shape()),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_identifier(&self, type_name: &str, property: &str, text: &str) -> Result<(), GraphError> {
        if text.trim().is_empty() || !self.registry.is_identifier(property) {
            return Ok(());
        }
        if let Some(pub_type) = self.registry.publication_type_for_entity(type_name) {
            if !pub_type.identifier_kinds.iter().any(|k| k == property) {
                return Err(GraphError::InvalidProperty {
                    entity_type: type_name.to_string(),
                    property: property.to_string(),
                    reason: format!(
                        "identifier kind '{}' is not allowed for {}",
                        property, pub_type.name
                    ),
                });
            }
        }
        Ok(())
    }

    /// Insert fully formed entities (ids and timestamps kept). Either all are
    /// inserted or none.
    pub(crate) fn insert_entities(&mut self, batch: Vec<Entity>) -> Result<Vec<EntityId>, GraphError> {
        let mut incoming = HashSet::new();
        for entity in &batch {
            if self.entities.contains_key(&entity.id) || !incoming.insert(entity.id) {
                return Err(GraphError::DuplicateId(entity.id));
            }
            let resolved = self.registry.concrete_type(entity.type_name())?;
            if resolved.kind == EntityKind::ArticleRecord {
                return Err(GraphError::ArticleRecord("inserted"));
            }
        }

        let ids: Vec<EntityId> = batch.iter().map(|e| e.id).collect();
        for entity in batch {
            self.order.push(entity.id);
            self.entities.insert(entity.id, entity);
        }

        let checked = ids.iter().try_for_each(|id| {
            let entity = &self.entities[id];
            self.check_properties(entity.type_name(), &entity.properties)
        });
        if let Err(e) = checked {
            for id in &ids {
                self.entities.remove(id);
            }
            self.order.retain(|id| !incoming.contains(id));
            return Err(e);
        }

        for id in &ids {
            let type_name = self.entities[id].type_name().to_string();
            self.emit(*id, type_name, ChangeKind::Created);
        }
        Ok(ids)
    }

    /// Replace the insertion order. `order` must list every entity exactly once.
    pub(crate) fn set_order(&mut self, order: Vec<EntityId>) -> Result<(), GraphError> {
        let mut seen = HashSet::with_capacity(order.len());
        for id in &order {
            if !seen.insert(*id) {
                return Err(GraphError::DuplicateId(*id));
            }
            if !self.entities.contains_key(id) {
                return Err(GraphError::NotFound(*id));
            }
        }
        if seen.len() != self.entities.len() {
            return Err(GraphError::UnsupportedDocument(format!(
                "order lists {} of {} entities",
                seen.len(),
                self.entities.len()
            )));
        }
        self.order = order;
        Ok(())
    }

    // ===== Collections =====

    /// Members of an article collection, in display order.
    pub fn collection(&self, kind: CollectionKind) -> &[EntityId] {
        self.article().refs(kind.property())
    }

    pub fn collection_len(&self, kind: CollectionKind) -> usize {
        self.collection(kind).len()
    }

    pub fn append_to_collection(&mut self, kind: CollectionKind, id: EntityId) -> Result<(), GraphError> {
        let len = self.collection_len(kind);
        self.insert_into_collection(kind, id, len)
    }

    /// Insert at `index` (clamped to the collection length).
    pub fn insert_into_collection(
        &mut self,
        kind: CollectionKind,
        id: EntityId,
        index: usize,
    ) -> Result<(), GraphError> {
        let mut members = self.collection(kind).to_vec();
        let index = index.min(members.len());
        members.insert(index, id);
        self.set_collection(kind, members)
    }

    /// Detach an entity from a collection without deleting it. Returns
    /// whether it was a member.
    pub fn remove_from_collection(&mut self, kind: CollectionKind, id: EntityId) -> Result<bool, GraphError> {
        let mut members = self.collection(kind).to_vec();
        let before = members.len();
        members.retain(|m| *m != id);
        if members.len() == before {
            return Ok(false);
        }
        self.set_collection(kind, members)?;
        Ok(true)
    }

    /// Move a member to `index` (clamped). Member identities are untouched.
    pub fn move_in_collection(
        &mut self,
        kind: CollectionKind,
        id: EntityId,
        index: usize,
    ) -> Result<(), GraphError> {
        let mut members = self.collection(kind).to_vec();
        let from = members
            .iter()
            .position(|m| *m == id)
            .ok_or(GraphError::NotInCollection { collection: kind, id })?;
        let index = index.min(members.len() - 1);
        if from == index {
            return Ok(());
        }
        let member = members.remove(from);
        members.insert(index, member);
        self.set_collection(kind, members)
    }

    /// Create an entity and append it to a collection.
    pub fn create_in_collection(
        &mut self,
        kind: CollectionKind,
        type_name: &str,
        initial: Properties,
    ) -> Result<EntityId, GraphError> {
        let record_type = self.article().type_name().to_string();
        let targets = self
            .registry
            .reference_targets(&record_type, kind.property())
            .ok_or_else(|| GraphError::InvalidProperty {
                entity_type: record_type.clone(),
                property: kind.property().to_string(),
                reason: "not a collection of this schema".into(),
            })?;
        self.registry.concrete_type(type_name)?;
        if !self.registry.accepts(targets, type_name) {
            return Err(GraphError::InvalidProperty {
                entity_type: record_type,
                property: kind.property().to_string(),
                reason: format!("'{}' entities cannot be added to {}", type_name, kind),
            });
        }
        let id = self.create_entity(type_name, initial)?;
        self.append_to_collection(kind, id)?;
        Ok(id)
    }

    fn set_collection(&mut self, kind: CollectionKind, members: Vec<EntityId>) -> Result<(), GraphError> {
        let patch = PropertyPatch::from([(kind.property().to_string(), Value::Refs(members))]);
        self.update_entity(self.article, patch)
    }
}
