//! Entity type definitions

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::relation::{PivotDef, RelationDef, RelationKind};
use crate::error::{ModelError, ModelResult};

/// Static description of one entity type: its table, primary key and
/// relations. Any literal field that does not appear in the relation map is
/// treated as a scalar attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity type name, singular (e.g. "car")
    pub name: String,
    /// Backing table name (e.g. "cars")
    pub table: String,
    /// Primary key attribute name
    pub primary_key: String,
    /// Relation name -> definition
    pub relations: HashMap<String, RelationDef>,
}

impl EntityDef {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            primary_key: "id".to_string(),
            relations: HashMap::new(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        self.primary_key = primary_key.to_string();
        self
    }

    /// This entity stores `{name}_id` pointing at the related row.
    pub fn belongs_to(self, name: &str, related: &str) -> Self {
        let foreign_key = format!("{}_id", name);
        self.relation(RelationDef::new(
            RelationKind::BelongsTo,
            name,
            related,
            &foreign_key,
        ))
    }

    /// One related row stores `{entity}_id` pointing back at this entity.
    pub fn has_one(self, name: &str, related: &str) -> Self {
        let foreign_key = format!("{}_id", self.name);
        self.relation(RelationDef::new(
            RelationKind::HasOne,
            name,
            related,
            &foreign_key,
        ))
    }

    /// Many related rows store `{entity}_id` pointing back at this entity.
    pub fn has_many(self, name: &str, related: &str) -> Self {
        let foreign_key = format!("{}_id", self.name);
        self.relation(RelationDef::new(
            RelationKind::HasMany,
            name,
            related,
            &foreign_key,
        ))
    }

    /// Many-to-many through an explicit pivot table.
    pub fn many_to_many(self, name: &str, related: &str, pivot: PivotDef) -> Self {
        let foreign_key = pivot.foreign_key.clone();
        self.relation(
            RelationDef::new(RelationKind::ManyToMany, name, related, &foreign_key)
                .with_pivot(pivot),
        )
    }

    /// Add a fully specified relation (escape hatch for custom keys).
    pub fn relation(mut self, def: RelationDef) -> Self {
        self.relations.insert(def.name.clone(), def);
        self
    }

    /// Look up a relation by field name; `None` means the field is a scalar.
    pub fn relation_def(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    pub fn is_relation(&self, field: &str) -> bool {
        self.relations.contains_key(field)
    }

    pub fn relation_names(&self) -> Vec<String> {
        self.relations.keys().cloned().collect()
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.name.is_empty() || self.table.is_empty() {
            return Err(ModelError::Configuration(
                "Entity name and table cannot be empty".to_string(),
            ));
        }
        if self.primary_key.is_empty() {
            return Err(ModelError::Configuration(format!(
                "Entity '{}' must name a primary key attribute",
                self.name
            )));
        }
        for def in self.relations.values() {
            def.validate()?;
        }
        Ok(())
    }
}
