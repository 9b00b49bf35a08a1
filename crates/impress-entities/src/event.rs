use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// What happened to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    /// Names of the properties that changed.
    Updated { properties: Vec<String> },
    Deleted,
}

/// Notification emitted by the entity graph for every mutation.
///
/// `seq` increases by one per event within a graph, so subscribers can
/// tell whether they missed anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub seq: u64,
    pub id: EntityId,
    pub entity_type: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn is_deletion(&self) -> bool {
        matches!(self.kind, ChangeKind::Deleted)
    }
}
