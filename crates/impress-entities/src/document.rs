//! Persisted form of an entity graph

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entity::{Entity, EntityId};
use crate::error::GraphError;
use crate::graph::EntityGraph;
use crate::kind::EntityKind;
use crate::registry::SchemaRegistry;

/// Serialized graph: ids, types, properties, timestamps and ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub schema: String,
    pub version: String,
    /// Id of the article record, which is also listed in `entities`.
    pub article: EntityId,
    pub entities: Vec<Entity>,
}

impl Document {
    fn major(version: &str) -> &str {
        version.split('.').next().unwrap_or(version)
    }
}

impl EntityGraph {
    pub fn to_document(&self) -> Document {
        Document {
            schema: self.registry().name().to_string(),
            version: self.registry().version().to_string(),
            article: self.article_id(),
            entities: self.entities().cloned().collect(),
        }
    }

    /// Rebuild a graph, re-checking every structural invariant.
    pub fn from_document(registry: Arc<SchemaRegistry>, doc: Document) -> Result<Self, GraphError> {
        if doc.schema != registry.name() {
            return Err(GraphError::UnsupportedDocument(format!(
                "schema '{}' (expected '{}')",
                doc.schema,
                registry.name()
            )));
        }
        if Document::major(&doc.version) != Document::major(registry.version()) {
            return Err(GraphError::UnsupportedDocument(format!(
                "version {} (expected {})",
                doc.version,
                registry.version()
            )));
        }

        let order: Vec<EntityId> = doc.entities.iter().map(|e| e.id).collect();
        let mut article = None;
        let mut rest = Vec::with_capacity(doc.entities.len());
        for entity in doc.entities {
            if entity.id == doc.article {
                if article.is_some() {
                    return Err(GraphError::DuplicateId(entity.id));
                }
                article = Some(entity);
            } else {
                rest.push(entity);
            }
        }
        let article = article.ok_or_else(|| {
            GraphError::UnsupportedDocument(format!("article record {} is not listed", doc.article))
        })?;
        if article.kind != EntityKind::ArticleRecord {
            return Err(GraphError::UnsupportedDocument(format!(
                "article {} has type '{}'",
                article.id,
                article.type_name()
            )));
        }

        let count = rest.len();
        let mut graph = EntityGraph::with_article(registry, article);
        graph.insert_entities(rest)?;
        let record = graph.article();
        graph.check_properties(record.type_name(), &record.properties)?;
        graph.set_order(order)?;

        tracing::info!(entities = count, "loaded document");
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn from_json(registry: Arc<SchemaRegistry>, json: &str) -> Result<Self, GraphError> {
        let doc: Document = serde_json::from_str(json)?;
        Self::from_document(registry, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionKind;
    use crate::entity::{props, Value};

    fn registry() -> Arc<SchemaRegistry> {
        Arc::new(SchemaRegistry::default())
    }

    fn sample() -> EntityGraph {
        let mut g = EntityGraph::new(registry()).unwrap();
        let org = g
            .create_in_collection(CollectionKind::Organisations, "organisation", props([("name", "CERN")]))
            .unwrap();
        let p = g
            .create_in_collection(
                CollectionKind::Authors,
                "person",
                props([
                    ("surname", Value::text("Curie")),
                    ("affiliations", Value::refs([org])),
                    ("corresp", Value::Boolean(true)),
                ]),
            )
            .unwrap();
        g.create_in_collection(
            CollectionKind::References,
            "journal-article",
            props([("title", Value::text("X")), ("authors", Value::refs([p]))]),
        )
        .unwrap();
        g
    }

    #[test]
    fn document_round_trip() {
        let g = sample();
        let doc = g.to_document();
        assert_eq!(doc.entities[0].id, doc.article);

        let loaded = EntityGraph::from_document(registry(), doc.clone()).unwrap();
        assert_eq!(loaded.to_document(), doc);
        assert_eq!(loaded.collection(CollectionKind::Authors).len(), 1);
    }

    #[test]
    fn json_round_trip() {
        let g = sample();
        let json = g.to_json().unwrap();
        let loaded = EntityGraph::from_json(registry(), &json).unwrap();
        assert_eq!(loaded.to_document(), g.to_document());
    }

    #[test]
    fn rejects_dangling_reference() {
        let mut doc = sample().to_document();
        let person = doc
            .entities
            .iter_mut()
            .find(|e| e.type_name() == "person")
            .unwrap();
        person
            .properties
            .insert("affiliations".into(), Value::refs([uuid::Uuid::new_v4()]));
        assert!(matches!(
            EntityGraph::from_document(registry(), doc),
            Err(GraphError::InvalidReference { .. })
        ));
    }

    #[test]
    fn rejects_unknown_type() {
        let mut doc = sample().to_document();
        doc.entities[1].kind = EntityKind::Custom("poster".into());
        assert!(matches!(
            EntityGraph::from_document(registry(), doc),
            Err(GraphError::UnknownType(_))
        ));
    }

    #[test]
    fn rejects_foreign_schema_and_missing_article() {
        let mut doc = sample().to_document();
        doc.schema = "entities-database".into();
        assert!(matches!(
            EntityGraph::from_document(registry(), doc),
            Err(GraphError::UnsupportedDocument(_))
        ));

        let mut doc = sample().to_document();
        doc.entities.remove(0);
        assert!(EntityGraph::from_document(registry(), doc).is_err());

        let mut doc = sample().to_document();
        doc.version = "2.0.0".into();
        assert!(EntityGraph::from_document(registry(), doc).is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut doc = sample().to_document();
        let copy = doc.entities[1].clone();
        doc.entities.push(copy);
        assert!(matches!(
            EntityGraph::from_document(registry(), doc),
            Err(GraphError::DuplicateId(_))
        ));
    }

    #[test]
    fn rejects_article_record_listed_twice() {
        let mut doc = sample().to_document();
        let article = doc.entities[0].clone();
        assert_eq!(article.id, doc.article);
        doc.entities.push(article);
        assert!(matches!(
            EntityGraph::from_document(registry(), doc),
            Err(GraphError::DuplicateId(_))
        ));
    }

    #[test]
    fn invalid_json_is_a_serialization_error() {
        assert!(matches!(
            EntityGraph::from_json(registry(), "{ not json"),
            Err(GraphError::Serialization(_))
        ));
    }
}
