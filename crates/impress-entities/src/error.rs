use crate::collection::CollectionKind;
use crate::entity::EntityId;
use crate::registry::RegistryError;

/// Errors from entity graph operations.
///
/// Every variant aborts the operation before anything is changed.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    #[error("Invalid reference {entity_type}.{property} -> {target}: {reason}")]
    InvalidReference {
        entity_type: String,
        property: String,
        target: EntityId,
        reason: String,
    },

    #[error("Invalid property {entity_type}.{property}: {reason}")]
    InvalidProperty {
        entity_type: String,
        property: String,
        reason: String,
    },

    #[error("Entity {id} is not in the {collection} collection")]
    NotInCollection {
        collection: CollectionKind,
        id: EntityId,
    },

    #[error("The article record cannot be {0}")]
    ArticleRecord(&'static str),

    #[error("Entity already exists: {0}")]
    DuplicateId(EntityId),

    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RegistryError> for GraphError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownType(name) => GraphError::UnknownType(name),
            RegistryError::Config(e) => GraphError::UnsupportedDocument(e.to_string()),
        }
    }
}
