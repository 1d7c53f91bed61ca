//! Observer registry - lifecycle hooks keyed by entity type name

use std::sync::Arc;

use dashmap::DashMap;

use crate::events::{HookError, Observer};
use crate::model::Model;

/// Ordered observers per entity type. Hooks fire in registration order and
/// the first failure stops the chain.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    observers: Arc<DashMap<String, Vec<Arc<dyn Observer>>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            observers: Arc::new(DashMap::new()),
        }
    }

    pub fn register(&self, entity: &str, observer: Arc<dyn Observer>) {
        self.observers
            .entry(entity.to_string())
            .or_default()
            .push(observer);
    }

    pub fn observer_count(&self, entity: &str) -> usize {
        self.observers
            .get(entity)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    fn observers_for(&self, entity: &str) -> Vec<Arc<dyn Observer>> {
        self.observers
            .get(entity)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub async fn trigger_saving(&self, entity: &str, model: &mut Model) -> Result<(), HookError> {
        for observer in self.observers_for(entity) {
            observer.saving(model).await?;
        }
        Ok(())
    }

    pub async fn trigger_creating(&self, entity: &str, model: &mut Model) -> Result<(), HookError> {
        for observer in self.observers_for(entity) {
            observer.creating(model).await?;
        }
        Ok(())
    }

    pub async fn trigger_updating(
        &self,
        entity: &str,
        model: &mut Model,
        original: &Model,
    ) -> Result<(), HookError> {
        for observer in self.observers_for(entity) {
            observer.updating(model, original).await?;
        }
        Ok(())
    }

    pub async fn trigger_created(&self, entity: &str, model: &Model) -> Result<(), HookError> {
        for observer in self.observers_for(entity) {
            observer.created(model).await?;
        }
        Ok(())
    }

    pub async fn trigger_updated(
        &self,
        entity: &str,
        model: &Model,
        original: &Model,
    ) -> Result<(), HookError> {
        for observer in self.observers_for(entity) {
            observer.updated(model, original).await?;
        }
        Ok(())
    }

    pub async fn trigger_saved(&self, entity: &str, model: &Model) -> Result<(), HookError> {
        for observer in self.observers_for(entity) {
            observer.saved(model).await?;
        }
        Ok(())
    }
}
