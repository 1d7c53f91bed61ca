//! Schema system - entity definitions, relation kinds and the registry
//!
//! This module answers the two questions the rest of the crate keeps asking:
//! "is this field a relation or a scalar?" and "which side of a relation is
//! persisted first?".

pub mod entity;
pub mod registry;
pub mod relation;

pub use entity::EntityDef;
pub use registry::{global_registry, SchemaRegistry};
pub use relation::{PivotDef, RelationDef, RelationKind, SaveOrder};
