//! Eager fetch loader - reconstructs persisted graphs
//!
//! Loads root models by filter, then walks dotted relation paths, attaching
//! related models level by level. Sibling paths sharing a first segment
//! (e.g. `models.type` and `models.specs`) share one load of that segment.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::collection::Collection;
use crate::error::{ModelError, ModelResult};
use crate::materializer::into_object;
use crate::model::{Model, Related};
use crate::schema::{EntityDef, RelationDef, RelationKind, SchemaRegistry};
use crate::storage::Storage;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub(crate) struct Loader<'a> {
    registry: &'a SchemaRegistry,
    storage: &'a dyn Storage,
}

impl<'a> Loader<'a> {
    pub fn new(registry: &'a SchemaRegistry, storage: &'a dyn Storage) -> Self {
        Self { registry, storage }
    }

    /// Fetch a single entity matching the filter, with the given relation
    /// paths attached. Zero matches is an error for a single-row fetch.
    pub async fn fetch(
        &self,
        entity: &str,
        filter: Value,
        paths: &[String],
    ) -> ModelResult<Model> {
        let collection = self.fetch_all(entity, filter, paths).await?;
        collection
            .into_models()
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::NotFound {
                entity: entity.to_string(),
            })
    }

    /// Fetch every entity matching the filter; zero matches yields an empty
    /// collection.
    pub async fn fetch_all(
        &self,
        entity: &str,
        filter: Value,
        paths: &[String],
    ) -> ModelResult<Collection> {
        let def = self.registry.get(entity)?;
        let filter = into_object(filter)?;

        let rows = self.storage.find_many(&def.table, &filter).await?;
        debug!(entity, count = rows.len(), "loaded root rows");
        let mut models: Vec<Model> = rows
            .into_iter()
            .map(|row| Model::with_attributes(&def, row))
            .collect();

        self.load_paths(def, &mut models, paths.to_vec()).await?;
        Ok(Collection::from_models(entity, models))
    }

    /// Attach one level of relations to every model, then recurse into the
    /// remaining path suffixes against the freshly loaded related models.
    fn load_paths<'b>(
        &'b self,
        def: EntityDef,
        models: &'b mut [Model],
        paths: Vec<String>,
    ) -> BoxFuture<'b, ModelResult<()>> {
        Box::pin(async move {
            for (head, suffixes) in group_paths(&paths) {
                let rel = def
                    .relation_def(&head)
                    .ok_or_else(|| ModelError::UnknownRelation {
                        entity: def.name.clone(),
                        relation: head.clone(),
                    })?
                    .clone();
                let related_def = self.registry.get(&rel.related)?;

                for model in models.iter_mut() {
                    let mut children = self.load_relation(&rel, &related_def, model).await?;
                    if !suffixes.is_empty() {
                        self.load_paths(related_def.clone(), &mut children, suffixes.clone())
                            .await?;
                    }
                    if rel.kind.is_collection() {
                        model.attach(
                            rel.name.clone(),
                            Related::Many(Collection::from_models(&rel.related, children)),
                        );
                    } else if let Some(child) = children.into_iter().next() {
                        model.attach(rel.name.clone(), Related::One(child));
                    }
                }
            }
            Ok(())
        })
    }

    /// Load the rows of one relation for one parent model. Missing or
    /// dangling references load nothing; a read never invents an error out
    /// of inconsistent rows.
    async fn load_relation(
        &self,
        rel: &RelationDef,
        related_def: &EntityDef,
        model: &Model,
    ) -> ModelResult<Vec<Model>> {
        match rel.kind {
            RelationKind::BelongsTo => {
                let Some(fk) = model.get(&rel.foreign_key).filter(|v| !v.is_null()).cloned()
                else {
                    return Ok(Vec::new());
                };
                match self
                    .storage
                    .find_by_id(&related_def.table, &related_def.primary_key, &fk)
                    .await?
                {
                    Some(row) => Ok(vec![Model::with_attributes(related_def, row)]),
                    None => {
                        warn!(
                            entity = %model.entity(),
                            relation = %rel.name,
                            key = %fk,
                            "foreign key references a missing row"
                        );
                        Ok(Vec::new())
                    }
                }
            }
            RelationKind::HasOne | RelationKind::HasMany => {
                let Some(id) = model.id().cloned() else {
                    return Ok(Vec::new());
                };
                let mut filter = Map::new();
                filter.insert(rel.foreign_key.clone(), id);

                let rows = self.storage.find_many(&related_def.table, &filter).await?;
                let mut children: Vec<Model> = rows
                    .into_iter()
                    .map(|row| Model::with_attributes(related_def, row))
                    .collect();
                if rel.kind == RelationKind::HasOne {
                    children.truncate(1);
                }
                Ok(children)
            }
            RelationKind::ManyToMany => {
                let pivot = rel.pivot.as_ref().ok_or_else(|| {
                    ModelError::Configuration(format!(
                        "Relation '{}' has no pivot configuration",
                        rel.name
                    ))
                })?;
                let Some(id) = model.id().cloned() else {
                    return Ok(Vec::new());
                };
                let mut filter = Map::new();
                filter.insert(pivot.local_key.clone(), id);

                let pivot_rows = self.storage.find_many(&pivot.table, &filter).await?;
                let mut children = Vec::new();
                for pivot_row in pivot_rows {
                    let Some(related_id) = pivot_row
                        .get(&pivot.foreign_key)
                        .filter(|v| !v.is_null())
                        .cloned()
                    else {
                        continue;
                    };
                    match self
                        .storage
                        .find_by_id(&related_def.table, &related_def.primary_key, &related_id)
                        .await?
                    {
                        Some(row) => children.push(Model::with_attributes(related_def, row)),
                        None => warn!(
                            table = %pivot.table,
                            key = %related_id,
                            "pivot row references a missing row"
                        ),
                    }
                }
                Ok(children)
            }
        }
    }
}

/// Group dotted paths by first segment, preserving first-seen order, so
/// `["models.type", "models.specs"]` loads `models` once with two suffixes.
fn group_paths(paths: &[String]) -> Vec<(String, Vec<String>)> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();

    for path in paths {
        let (head, suffix) = match path.split_once('.') {
            Some((head, rest)) => (head.to_string(), Some(rest.to_string())),
            None => (path.clone(), None),
        };
        let entry = grouped.entry(head.clone()).or_insert_with(|| {
            order.push(head);
            Vec::new()
        });
        if let Some(suffix) = suffix {
            entry.push(suffix);
        }
    }

    order
        .into_iter()
        .map(|head| {
            let suffixes = grouped.remove(&head).unwrap_or_default();
            (head, suffixes)
        })
        .collect()
}
