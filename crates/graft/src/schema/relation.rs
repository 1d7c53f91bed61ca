//! Relation definitions - kinds, keys and pivot configuration

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Defines the kind of relation between two entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// The owner stores a foreign key pointing at the related row (belongsTo)
    BelongsTo,
    /// One related row stores a foreign key pointing back at the owner (hasOne)
    HasOne,
    /// Many related rows store a foreign key pointing back at the owner (hasMany)
    HasMany,
    /// Many-to-many through a pivot table (belongsToMany)
    ManyToMany,
}

/// Which side of a relation must be persisted first.
///
/// Getting this wrong produces a foreign key referencing a row whose
/// identity does not exist yet, so every write the materializer performs
/// is sequenced by this rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOrder {
    /// The owning row is written first; related rows then store its key
    ParentFirst,
    /// The related row is written first so the owner can store its key
    ChildFirst,
}

impl RelationKind {
    /// Returns true if this relation resolves to a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany)
    }

    /// Returns true if this relation requires a pivot table
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::ManyToMany)
    }

    /// Persistence order for this relation kind.
    ///
    /// `BelongsTo` children must exist before the owner row is written;
    /// every other kind stores the owner's key on the related side, so the
    /// owner goes first. `ManyToMany` saves both sides independently and
    /// links them with a pivot row once both identities are known.
    pub fn save_order(self) -> SaveOrder {
        match self {
            Self::BelongsTo => SaveOrder::ChildFirst,
            Self::HasOne | Self::HasMany | Self::ManyToMany => SaveOrder::ParentFirst,
        }
    }
}

/// Pivot table configuration for many-to-many relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotDef {
    /// The pivot table name
    pub table: String,
    /// Column holding the owning side's identity
    pub local_key: String,
    /// Column holding the related side's identity
    pub foreign_key: String,
}

impl PivotDef {
    pub fn new(table: &str, local_key: &str, foreign_key: &str) -> Self {
        Self {
            table: table.to_string(),
            local_key: local_key.to_string(),
            foreign_key: foreign_key.to_string(),
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.table.is_empty() {
            return Err(ModelError::Configuration(
                "Pivot table name cannot be empty".to_string(),
            ));
        }
        if self.local_key.is_empty() || self.foreign_key.is_empty() {
            return Err(ModelError::Configuration(
                "Pivot key columns cannot be empty".to_string(),
            ));
        }
        if self.local_key == self.foreign_key {
            return Err(ModelError::Configuration(
                "Pivot local key and foreign key must be different".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single named relation on an entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Field name the relation appears under in literals and on models
    pub name: String,
    pub kind: RelationKind,
    /// Name of the related entity type
    pub related: String,
    /// Foreign key column; which table holds it depends on `kind`
    pub foreign_key: String,
    /// Pivot configuration, required for `ManyToMany`
    pub pivot: Option<PivotDef>,
}

impl RelationDef {
    pub fn new(kind: RelationKind, name: &str, related: &str, foreign_key: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            related: related.to_string(),
            foreign_key: foreign_key.to_string(),
            pivot: None,
        }
    }

    pub fn with_foreign_key(mut self, foreign_key: &str) -> Self {
        self.foreign_key = foreign_key.to_string();
        self
    }

    pub fn with_pivot(mut self, pivot: PivotDef) -> Self {
        self.pivot = Some(pivot);
        self
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.name.is_empty() || self.related.is_empty() {
            return Err(ModelError::Configuration(
                "Relation name and related type cannot be empty".to_string(),
            ));
        }
        if self.foreign_key.is_empty() {
            return Err(ModelError::Configuration(format!(
                "Relation '{}' must name a foreign key column",
                self.name
            )));
        }
        if self.kind.requires_pivot() && self.pivot.is_none() {
            return Err(ModelError::Configuration(format!(
                "Relation '{}' of kind {:?} requires a pivot configuration",
                self.name, self.kind
            )));
        }
        if !self.kind.requires_pivot() && self.pivot.is_some() {
            return Err(ModelError::Configuration(format!(
                "Relation '{}' of kind {:?} must not carry a pivot configuration",
                self.name, self.kind
            )));
        }
        if let Some(ref pivot) = self.pivot {
            pivot.validate()?;
        }
        Ok(())
    }
}
