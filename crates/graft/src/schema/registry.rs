//! Schema registry - runtime storage and lookup for entity definitions

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use super::entity::EntityDef;
use crate::error::{ModelError, ModelResult};

/// Thread-safe registry of entity definitions.
///
/// Populated at process startup and read-only afterwards as far as the rest
/// of the system is concerned; registration replaces any previous definition
/// under the same name. Cloning is cheap and all clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: Arc<DashMap<String, EntityDef>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            entities: Arc::new(DashMap::new()),
        }
    }

    /// Register an entity definition, validating it first.
    pub fn register(&self, def: EntityDef) -> ModelResult<()> {
        def.validate()?;
        self.entities.insert(def.name.clone(), def);
        Ok(())
    }

    /// Fetch a definition by entity name.
    pub fn get(&self, name: &str) -> ModelResult<EntityDef> {
        self.entities
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ModelError::UnknownType(name.to_string()))
    }

    pub fn has_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entities.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&self) {
        self.entities.clear();
    }

    /// Check every registered relation points at a registered entity type.
    pub fn validate_all(&self) -> ModelResult<()> {
        for entry in self.entities.iter() {
            for rel in entry.value().relations.values() {
                if !self.has_entity(&rel.related) {
                    return Err(ModelError::Configuration(format!(
                        "Relation '{}' on '{}' points at unregistered type '{}'",
                        rel.name,
                        entry.key(),
                        rel.related
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Process-wide registry for applications that share one schema.
static GLOBAL_REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

pub fn global_registry() -> &'static SchemaRegistry {
    GLOBAL_REGISTRY.get_or_init(SchemaRegistry::new)
}
