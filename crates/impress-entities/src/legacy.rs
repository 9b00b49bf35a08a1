//! Standalone entities database
//!
//! Older converters exchanged a bare list of entities without an article
//! record. This adapter exports a graph into that shape and merges such a
//! database back into a graph.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::error::GraphError;
use crate::graph::EntityGraph;

pub const STANDALONE_SCHEMA: &str = "entities-database";
pub const STANDALONE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandaloneDatabase {
    pub schema: String,
    pub version: String,
    pub nodes: Vec<Entity>,
}

impl StandaloneDatabase {
    /// Every entity except the article record, in graph order.
    pub fn from_graph(graph: &EntityGraph) -> Self {
        let article = graph.article_id();
        Self {
            schema: STANDALONE_SCHEMA.to_string(),
            version: STANDALONE_VERSION.to_string(),
            nodes: graph
                .entities()
                .filter(|e| e.id != article)
                .cloned()
                .collect(),
        }
    }

    /// Insert all nodes into `graph`, keeping their ids. An id already in
    /// the graph rejects the whole database.
    pub fn merge_into(self, graph: &mut EntityGraph) -> Result<Vec<EntityId>, GraphError> {
        if self.schema != STANDALONE_SCHEMA {
            return Err(GraphError::UnsupportedDocument(format!(
                "schema '{}' (expected '{}')",
                self.schema, STANDALONE_SCHEMA
            )));
        }
        let ids = graph.insert_entities(self.nodes)?;
        tracing::info!(nodes = ids.len(), "merged standalone database");
        Ok(ids)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }
}
