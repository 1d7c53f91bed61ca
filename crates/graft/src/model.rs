//! Model - the runtime representation of one persisted-or-pending record

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::collection::Collection;
use crate::error::{ModelError, ModelResult};
use crate::schema::EntityDef;

/// Relation data attached to a model: a single record or an ordered group.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    One(Model),
    Many(Collection),
}

impl Related {
    pub fn model(&self) -> Option<&Model> {
        match self {
            Related::One(model) => Some(model),
            Related::Many(_) => None,
        }
    }

    pub fn collection(&self) -> Option<&Collection> {
        match self {
            Related::One(_) => None,
            Related::Many(collection) => Some(collection),
        }
    }
}

/// One record of an entity type: a schemaless attribute bag plus any
/// relations that have been attached by a create or fetch.
///
/// A model with a set identity represents a row that exists in storage.
/// Mutating attributes afterwards never re-saves implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    entity: String,
    primary_key: String,
    attributes: Map<String, Value>,
    relations: HashMap<String, Related>,
}

impl Model {
    pub fn new(def: &EntityDef) -> Self {
        Self::with_attributes(def, Map::new())
    }

    pub fn with_attributes(def: &EntityDef, attributes: Map<String, Value>) -> Self {
        Self {
            entity: def.name.clone(),
            primary_key: def.primary_key.clone(),
            attributes,
            relations: HashMap::new(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The identity value, once assigned by storage (or carried in from an
    /// input literal referencing an existing row).
    pub fn id(&self) -> Option<&Value> {
        self.attributes
            .get(&self.primary_key)
            .filter(|value| !value.is_null())
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.attributes.get(attr)
    }

    /// Set an attribute. Unrecognized names are permitted; the bag is
    /// schemaless.
    pub fn set(&mut self, attr: &str, value: Value) {
        self.attributes.insert(attr.to_string(), value);
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Fill in attributes from a stored row without overwriting values that
    /// are already present. Used when an input literal updates an existing
    /// record: provided fields win, everything else comes from the row.
    pub(crate) fn merge_stored(&mut self, stored: Map<String, Value>) {
        for (attr, value) in stored {
            self.attributes.entry(attr).or_insert(value);
        }
    }

    /// Previously attached relation data. This layer is eager-only: a
    /// relation that was never attached is an error, never a lazy load.
    pub fn related(&self, name: &str) -> ModelResult<&Related> {
        self.relations
            .get(name)
            .ok_or_else(|| ModelError::RelationNotLoaded {
                entity: self.entity.clone(),
                relation: name.to_string(),
            })
    }

    pub fn has_related(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn relation_names(&self) -> Vec<&str> {
        self.relations.keys().map(String::as_str).collect()
    }

    pub(crate) fn attach(&mut self, name: String, related: Related) {
        self.relations.insert(name, related);
    }
}
