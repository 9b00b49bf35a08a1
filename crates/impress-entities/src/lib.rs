//! Typed entity graph for scholarly-article metadata.
//!
//! A `SchemaRegistry` describes the entity types, their properties and
//! required sets. An `EntityGraph` holds the entities of one article and
//! announces every change to its subscribers. `validation` reports missing
//! required properties.

pub mod builtin;
pub mod collection;
pub mod config;
pub mod document;
pub mod entity;
pub mod error;
pub mod event;
pub mod graph;
pub mod kind;
pub mod legacy;
pub mod registry;
pub mod schema;
pub mod sections;
pub mod validation;

pub use collection::*;
pub use config::*;
pub use document::*;
pub use entity::*;
pub use error::*;
pub use event::*;
pub use graph::*;
pub use kind::*;
pub use legacy::*;
pub use registry::*;
pub use schema::*;
pub use sections::{table_of_contents, Section, TocEntry, SECTIONS};
pub use validation::{
    is_complete, validate, validate_all, Issue, IssueKind, IssueTracker, Severity,
    ValidationError,
};
