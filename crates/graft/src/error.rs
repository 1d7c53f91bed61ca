//! Error types for the data manager
//!
//! Everything surfaces synchronously to the caller of the top-level
//! operation; nothing is retried or swallowed at this layer.

use std::fmt;

use crate::events::HookError;
use crate::storage::StorageError;

/// Result type alias for manager operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for manager operations
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Entity type name was never registered
    UnknownType(String),
    /// Field named in a relation path is not a relation of the entity
    UnknownRelation { entity: String, relation: String },
    /// `related()` accessed before that relation was attached
    RelationNotLoaded { entity: String, relation: String },
    /// A lifecycle hook rejected the node's attributes
    Validation {
        message: String,
        hint: Option<String>,
    },
    /// No row matched (single-row fetch, or a nested identity with no row)
    NotFound { entity: String },
    /// Failure from the underlying storage engine
    Storage(String),
    /// Invalid schema definition
    Configuration(String),
    /// Malformed input literal
    Payload(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownType(name) => write!(f, "Unknown entity type '{}'", name),
            ModelError::UnknownRelation { entity, relation } => {
                write!(f, "Entity '{}' has no relation '{}'", entity, relation)
            }
            ModelError::RelationNotLoaded { entity, relation } => {
                write!(f, "Relation '{}' on '{}' has not been loaded", relation, entity)
            }
            ModelError::Validation { message, hint } => {
                write!(f, "Validation error: {}", message)?;
                if let Some(hint) = hint {
                    write!(f, " (hint: {})", hint)?;
                }
                Ok(())
            }
            ModelError::NotFound { entity } => {
                write!(f, "No matching '{}' record found", entity)
            }
            ModelError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ModelError::Payload(msg) => write!(f, "Payload error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<StorageError> for ModelError {
    fn from(err: StorageError) -> Self {
        ModelError::Storage(err.to_string())
    }
}

impl From<HookError> for ModelError {
    fn from(err: HookError) -> Self {
        match err {
            HookError::Validation { message, hint } => ModelError::Validation { message, hint },
        }
    }
}
