//! # graft: nested-graph data manager
//!
//! Creates and fetches richly nested entity graphs against a relational
//! row store. A single literal describes one root entity and everything
//! hanging off it; the manager classifies nested fields against a relation
//! schema, persists rows in foreign-key dependency order, and returns
//! models whose relations are navigable in memory. The inverse operation
//! fetches a root by filter and eager-loads dotted relation paths back into
//! the same shape.
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use graft::{EntityDef, Manager, MemoryStorage, SchemaRegistry};
//!
//! # async fn demo() -> graft::ModelResult<()> {
//! let registry = SchemaRegistry::new();
//! registry.register(EntityDef::new("color", "colors"))?;
//! registry.register(EntityDef::new("car", "cars").belongs_to("color", "color"))?;
//!
//! let manager = Manager::new(registry, Arc::new(MemoryStorage::new()));
//! let car = manager
//!     .create("car", json!({ "color": { "name": "White" }, "quantity": 1 }))
//!     .await?;
//! assert_eq!(car.related("color")?.model().and_then(|c| c.id()), Some(&json!(1)));
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod error;
pub mod events;
pub mod manager;
pub mod model;
pub mod observers;
pub mod schema;
pub mod storage;

mod loader;
mod materializer;

// Re-export the main types for convenience
pub use collection::Collection;
pub use error::{ModelError, ModelResult};
pub use events::{HookError, Observer};
pub use manager::Manager;
pub use model::{Model, Related};
pub use observers::ObserverRegistry;
pub use schema::{
    global_registry, EntityDef, PivotDef, RelationDef, RelationKind, SaveOrder, SchemaRegistry,
};
pub use storage::{
    MemoryStorage, PostgresConfig, PostgresStorage, Storage, StorageError, StorageResult,
};
