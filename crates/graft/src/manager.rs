//! Manager - the caller-facing surface
//!
//! Bundles a schema registry, a storage backend and the observer registry,
//! and hands the actual work to the materializer (create) and the loader
//! (fetch). Each operation is one sequential logical task; models and
//! collections it returns are plain caller-owned values.

use std::sync::Arc;

use serde_json::Value;

use crate::collection::Collection;
use crate::error::ModelResult;
use crate::events::Observer;
use crate::loader::Loader;
use crate::materializer::Materializer;
use crate::model::Model;
use crate::observers::ObserverRegistry;
use crate::schema::{EntityDef, SchemaRegistry};
use crate::storage::Storage;

#[derive(Clone)]
pub struct Manager {
    registry: SchemaRegistry,
    storage: Arc<dyn Storage>,
    observers: ObserverRegistry,
}

impl Manager {
    pub fn new(registry: SchemaRegistry, storage: Arc<dyn Storage>) -> Self {
        Self {
            registry,
            storage,
            observers: ObserverRegistry::new(),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Definition handle for one entity type, for callers that want to
    /// inspect tables, keys or relations.
    pub fn entity(&self, name: &str) -> ModelResult<EntityDef> {
        self.registry.get(name)
    }

    /// Attach lifecycle hooks to an entity type. Observers fire for every
    /// node of that type the materializer persists, in registration order.
    pub fn observe(&self, entity: &str, observer: Arc<dyn Observer>) {
        self.observers.register(entity, observer);
    }

    /// Create one entity from a (possibly deeply nested) object literal.
    pub async fn create(&self, entity: &str, payload: Value) -> ModelResult<Model> {
        Materializer::new(&self.registry, self.storage.as_ref(), &self.observers)
            .create(entity, payload)
            .await
    }

    /// Create a batch of entities; the collection preserves input order.
    pub async fn create_many(
        &self,
        entity: &str,
        payloads: Vec<Value>,
    ) -> ModelResult<Collection> {
        Materializer::new(&self.registry, self.storage.as_ref(), &self.observers)
            .create_many(entity, payloads)
            .await
    }

    /// Fetch a single entity by equality filter, eager-loading the given
    /// dotted relation paths. Zero matches fails with a not-found error.
    pub async fn fetch(
        &self,
        entity: &str,
        filter: Value,
        paths: &[&str],
    ) -> ModelResult<Model> {
        Loader::new(&self.registry, self.storage.as_ref())
            .fetch(entity, filter, &owned_paths(paths))
            .await
    }

    /// Fetch every entity matching the filter; zero matches yields an empty
    /// collection.
    pub async fn fetch_all(
        &self,
        entity: &str,
        filter: Value,
        paths: &[&str],
    ) -> ModelResult<Collection> {
        Loader::new(&self.registry, self.storage.as_ref())
            .fetch_all(entity, filter, &owned_paths(paths))
            .await
    }
}

fn owned_paths(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|path| path.to_string()).collect()
}
