//! Shared fixtures: a small vehicle catalog schema over in-memory storage.

use std::sync::Arc;

use graft::{EntityDef, Manager, MemoryStorage, PivotDef, SchemaRegistry};

pub fn registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();

    registry.register(EntityDef::new("color", "colors")).unwrap();
    registry
        .register(EntityDef::new("feature", "features"))
        .unwrap();
    registry.register(EntityDef::new("type", "types")).unwrap();
    registry.register(EntityDef::new("spec", "specs")).unwrap();
    registry
        .register(
            EntityDef::new("model", "models")
                .belongs_to("type", "type")
                .many_to_many(
                    "specs",
                    "spec",
                    PivotDef::new("models_specs", "model_id", "spec_id"),
                ),
        )
        .unwrap();
    registry
        .register(EntityDef::new("make", "makes").has_many("models", "model"))
        .unwrap();
    registry
        .register(
            EntityDef::new("car", "cars")
                .belongs_to("color", "color")
                .belongs_to("make", "make")
                .many_to_many(
                    "features",
                    "feature",
                    PivotDef::new("cars_features", "car_id", "feature_id"),
                ),
        )
        .unwrap();

    registry.validate_all().unwrap();
    registry
}

pub fn manager() -> Manager {
    manager_with_storage().0
}

pub fn manager_with_storage() -> (Manager, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    (Manager::new(registry(), storage.clone()), storage)
}
