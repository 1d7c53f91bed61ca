//! Lifecycle hooks invoked around row writes

use std::fmt;

use async_trait::async_trait;

use crate::model::Model;

/// Failure raised by a lifecycle hook. Surfaces to the caller as a
/// validation error and aborts the node's persistence.
#[derive(Debug, Clone)]
pub enum HookError {
    Validation {
        message: String,
        hint: Option<String>,
    },
}

impl HookError {
    pub fn validation(message: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
            hint: None,
        }
    }

    pub fn validation_with_hint(message: &str, hint: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::Validation { message, hint } => {
                write!(f, "Validation error: {}", message)?;
                if let Some(hint) = hint {
                    write!(f, " (hint: {})", hint)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for HookError {}

/// Caller-attached lifecycle hooks for one entity type.
///
/// Before-hooks (`saving`, `creating`, `updating`) run after the node's
/// scalar attributes and owning foreign keys are set but before its row is
/// written, and may adjust attributes. After-hooks run once the row exists.
/// Every method defaults to a no-op.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn saving(&self, _model: &mut Model) -> Result<(), HookError> {
        Ok(())
    }

    async fn creating(&self, _model: &mut Model) -> Result<(), HookError> {
        Ok(())
    }

    async fn updating(&self, _model: &mut Model, _original: &Model) -> Result<(), HookError> {
        Ok(())
    }

    async fn created(&self, _model: &Model) -> Result<(), HookError> {
        Ok(())
    }

    async fn updated(&self, _model: &Model, _original: &Model) -> Result<(), HookError> {
        Ok(())
    }

    async fn saved(&self, _model: &Model) -> Result<(), HookError> {
        Ok(())
    }
}
