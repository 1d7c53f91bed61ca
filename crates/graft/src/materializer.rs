//! Graph materializer - the recursive create engine
//!
//! Walks an input literal depth-first, splitting each node's fields into
//! scalar attributes and relations, persisting rows in the order the
//! relation kinds demand, and stitching the results into navigable models.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use tracing::debug;

use crate::collection::Collection;
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, Related};
use crate::observers::ObserverRegistry;
use crate::schema::{EntityDef, RelationDef, RelationKind, SaveOrder, SchemaRegistry};
use crate::storage::Storage;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub(crate) struct Materializer<'a> {
    registry: &'a SchemaRegistry,
    storage: &'a dyn Storage,
    observers: &'a ObserverRegistry,
}

impl<'a> Materializer<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        storage: &'a dyn Storage,
        observers: &'a ObserverRegistry,
    ) -> Self {
        Self {
            registry,
            storage,
            observers,
        }
    }

    /// Materialize one entity and its nested graph.
    pub async fn create(&self, entity: &str, payload: Value) -> ModelResult<Model> {
        let def = self.registry.get(entity)?;
        debug!(entity, "materializing graph");
        self.materialize(def, into_object(payload)?).await
    }

    /// Materialize a batch; each element is persisted independently and the
    /// returned collection preserves input order.
    pub async fn create_many(
        &self,
        entity: &str,
        payloads: Vec<Value>,
    ) -> ModelResult<Collection> {
        let def = self.registry.get(entity)?;
        let mut collection = Collection::new(entity);
        for payload in payloads {
            collection.push(self.materialize(def.clone(), into_object(payload)?).await?);
        }
        Ok(collection)
    }

    fn materialize<'b>(
        &'b self,
        def: EntityDef,
        literal: Map<String, Value>,
    ) -> BoxFuture<'b, ModelResult<Model>> {
        Box::pin(async move {
            // Partition fields into scalars and relations, and split the
            // relations by which side must be persisted first.
            let mut scalars = Map::new();
            let mut child_first: Vec<(RelationDef, Value)> = Vec::new();
            let mut parent_first: Vec<(RelationDef, Value)> = Vec::new();
            for (field, value) in literal {
                match def.relation_def(&field) {
                    Some(rel) => match rel.kind.save_order() {
                        SaveOrder::ChildFirst => child_first.push((rel.clone(), value)),
                        SaveOrder::ParentFirst => parent_first.push((rel.clone(), value)),
                    },
                    None => {
                        scalars.insert(field, value);
                    }
                }
            }

            let mut model = Model::with_attributes(&def, scalars);
            let mut attached: Vec<(String, Related)> = Vec::new();

            // Owning relations: the related row must exist before this row
            // can store its key.
            for (rel, value) in child_first {
                let related_def = self.registry.get(&rel.related)?;
                let child = self.materialize(related_def, into_object(value)?).await?;
                let child_id = missing_identity(&rel, child.id().cloned())?;
                model.set(&rel.foreign_key, child_id);
                attached.push((rel.name, Related::One(child)));
            }

            self.persist(&def, &mut model).await?;
            let own_id = model
                .id()
                .cloned()
                .ok_or_else(|| ModelError::Storage("storage returned no identity".to_string()))?;

            // Owned relations: related rows store this row's key, so they
            // are written after it.
            for (rel, value) in parent_first {
                let related_def = self.registry.get(&rel.related)?;
                match rel.kind {
                    RelationKind::HasOne => {
                        let mut child_literal = into_object(value)?;
                        child_literal.insert(rel.foreign_key.clone(), own_id.clone());
                        let child = self.materialize(related_def, child_literal).await?;
                        attached.push((rel.name, Related::One(child)));
                    }
                    RelationKind::HasMany => {
                        let mut children = Collection::new(&rel.related);
                        for element in into_array(value)? {
                            let mut child_literal = into_object(element)?;
                            child_literal.insert(rel.foreign_key.clone(), own_id.clone());
                            children
                                .push(self.materialize(related_def.clone(), child_literal).await?);
                        }
                        attached.push((rel.name, Related::Many(children)));
                    }
                    RelationKind::ManyToMany => {
                        let pivot = rel.pivot.as_ref().ok_or_else(|| {
                            ModelError::Configuration(format!(
                                "Relation '{}' has no pivot configuration",
                                rel.name
                            ))
                        })?;
                        let mut children = Collection::new(&rel.related);
                        for element in into_array(value)? {
                            let child = self
                                .materialize(related_def.clone(), into_object(element)?)
                                .await?;
                            let child_id = missing_identity(&rel, child.id().cloned())?;
                            self.storage
                                .insert_pivot(
                                    &pivot.table,
                                    &pivot.local_key,
                                    &own_id,
                                    &pivot.foreign_key,
                                    &child_id,
                                )
                                .await?;
                            children.push(child);
                        }
                        attached.push((rel.name, Related::Many(children)));
                    }
                    RelationKind::BelongsTo => unreachable!("belongs-to is saved child-first"),
                }
            }

            for (name, related) in attached {
                model.attach(name, related);
            }
            Ok(model)
        })
    }

    /// Write one node's own row. A literal carrying an identity references
    /// an existing row: its stored attributes are loaded, the provided
    /// fields overwrite them, and the identity is preserved. Otherwise a
    /// fresh row is inserted. Hooks fire before and after the write; a
    /// failing before-hook leaves the row unwritten.
    async fn persist(&self, def: &EntityDef, model: &mut Model) -> ModelResult<()> {
        match model.id().cloned() {
            Some(id) => {
                let stored = self
                    .storage
                    .find_by_id(&def.table, &def.primary_key, &id)
                    .await?
                    .ok_or_else(|| ModelError::NotFound {
                        entity: def.name.clone(),
                    })?;
                let original = Model::with_attributes(def, stored.clone());

                self.observers.trigger_saving(&def.name, model).await?;
                self.observers
                    .trigger_updating(&def.name, model, &original)
                    .await?;

                let mut changes = model.attributes().clone();
                changes.remove(&def.primary_key);
                self.storage
                    .update(&def.table, &def.primary_key, &id, &changes)
                    .await?;
                model.merge_stored(stored);

                self.observers
                    .trigger_updated(&def.name, model, &original)
                    .await?;
                self.observers.trigger_saved(&def.name, model).await?;
            }
            None => {
                self.observers.trigger_saving(&def.name, model).await?;
                self.observers.trigger_creating(&def.name, model).await?;

                let id = self
                    .storage
                    .insert(&def.table, &def.primary_key, model.attributes())
                    .await?;
                model.set(&def.primary_key, id);

                self.observers.trigger_created(&def.name, model).await?;
                self.observers.trigger_saved(&def.name, model).await?;
            }
        }
        Ok(())
    }
}

fn missing_identity(rel: &RelationDef, id: Option<Value>) -> ModelResult<Value> {
    id.ok_or_else(|| {
        ModelError::Storage(format!(
            "related '{}' has no identity after persistence",
            rel.name
        ))
    })
}

pub(crate) fn into_object(value: Value) -> ModelResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ModelError::Payload(format!(
            "expected an object literal, got {}",
            json_kind(&other)
        ))),
    }
}

pub(crate) fn into_array(value: Value) -> ModelResult<Vec<Value>> {
    match value {
        Value::Array(elements) => Ok(elements),
        other => Err(ModelError::Payload(format!(
            "expected an array literal, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_coercion_reports_shape() {
        assert!(into_object(json!({"a": 1})).is_ok());
        assert!(into_array(json!([1, 2])).is_ok());

        match into_object(json!([1])) {
            Err(ModelError::Payload(msg)) => assert!(msg.contains("an array")),
            other => panic!("expected payload error, got {:?}", other),
        }
        match into_array(json!({"a": 1})) {
            Err(ModelError::Payload(msg)) => assert!(msg.contains("an object")),
            other => panic!("expected payload error, got {:?}", other),
        }
    }
}
