//! Create-path coverage: scalar creates, batches, nested graphs in every
//! relation kind, insert-vs-update resolution and lifecycle hooks.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use graft::{HookError, Model, ModelError, Observer};

#[tokio::test]
async fn creates_a_new_model() {
    let manager = common::manager();
    let car = manager.create("car", json!({})).await.unwrap();

    assert_eq!(car.entity(), "car");
    assert_eq!(car.id(), Some(&json!(1)));
}

#[tokio::test]
async fn creates_a_new_collection() {
    let manager = common::manager();
    let cars = manager.create_many("car", Vec::new()).await.unwrap();

    assert_eq!(cars.entity(), "car");
    assert!(cars.is_empty());
}

#[tokio::test]
async fn creates_a_populated_model() {
    let manager = common::manager();
    let car = manager.create("car", json!({ "quantity": 1 })).await.unwrap();

    assert_eq!(car.id(), Some(&json!(1)));
    assert_eq!(car.get("quantity"), Some(&json!(1)));
}

#[tokio::test]
async fn creates_a_populated_collection() {
    let manager = common::manager();
    let mut cars = manager
        .create_many("car", vec![json!({ "quantity": 1 }), json!({ "quantity": 2 })])
        .await
        .unwrap();

    cars.sort_by("quantity");

    assert_eq!(cars.len(), 2);
    assert_eq!(cars.pluck("quantity"), vec![json!(1), json!(2)]);
    assert_ne!(cars.at(0).unwrap().id(), cars.at(1).unwrap().id());
}

#[tokio::test]
async fn creates_a_model_within_a_new_model() {
    let manager = common::manager();
    let car = manager
        .create(
            "car",
            json!({
                "color": { "name": "White", "hex_value": "#fff" },
                "quantity": 1
            }),
        )
        .await
        .unwrap();

    assert_eq!(car.id(), Some(&json!(1)));
    assert_eq!(car.get("quantity"), Some(&json!(1)));

    let color = car.related("color").unwrap().model().unwrap();
    assert_eq!(color.id(), Some(&json!(1)));
    assert_eq!(color.get("name"), Some(&json!("White")));
    assert_eq!(color.get("hex_value"), Some(&json!("#fff")));

    // the owning row stores the related identity as its foreign key
    assert_eq!(car.get("color_id"), color.id());
    assert_eq!(car.get("color_id"), Some(&json!(1)));
}

#[tokio::test]
async fn modifies_an_existing_nested_model() {
    let (manager, storage) = common::manager_with_storage();

    let color = manager
        .create("color", json!({ "name": "White", "hex_value": "#fff" }))
        .await
        .unwrap();

    let car = manager
        .create(
            "car",
            json!({
                "color": { "id": color.id(), "name": "Grey", "hex_value": "#666" },
                "quantity": 2
            }),
        )
        .await
        .unwrap();

    let updated = car.related("color").unwrap().model().unwrap();
    assert_eq!(updated.id(), color.id());
    assert_eq!(updated.get("name"), Some(&json!("Grey")));
    assert_eq!(updated.get("hex_value"), Some(&json!("#666")));

    // updated in place, not inserted again
    assert_eq!(storage.row_count("colors"), 1);
}

#[tokio::test]
async fn merges_stored_attributes_into_a_nested_update() {
    let manager = common::manager();

    let color = manager
        .create("color", json!({ "name": "White", "hex_value": "#fff" }))
        .await
        .unwrap();

    let car = manager
        .create(
            "car",
            json!({ "color": { "id": color.id(), "name": "Grey" }, "quantity": 1 }),
        )
        .await
        .unwrap();

    let updated = car.related("color").unwrap().model().unwrap();
    assert_eq!(updated.get("name"), Some(&json!("Grey")));
    // the untouched column is carried over from the stored row
    assert_eq!(updated.get("hex_value"), Some(&json!("#fff")));
}

#[tokio::test]
async fn rejects_a_nested_identity_with_no_row() {
    let (manager, storage) = common::manager_with_storage();

    let result = manager
        .create(
            "car",
            json!({ "color": { "id": 42, "name": "Grey" }, "quantity": 1 }),
        )
        .await;

    match result {
        Err(ModelError::NotFound { entity }) => assert_eq!(entity, "color"),
        other => panic!("expected not-found, got {:?}", other),
    }
    assert_eq!(storage.row_count("cars"), 0);
}

#[tokio::test]
async fn creates_models_within_a_nested_collection_through_a_pivot() {
    let (manager, storage) = common::manager_with_storage();
    let car = manager
        .create(
            "car",
            json!({
                "features": [
                    { "name": "ABS", "cost": 1250 },
                    { "name": "GPS", "cost": 500 },
                ],
                "quantity": 1
            }),
        )
        .await
        .unwrap();

    assert_eq!(car.id(), Some(&json!(1)));

    let features = car.related("features").unwrap().collection().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features.pluck("name").len(), 2);
    assert!(features.at(0).unwrap().id().is_some());
    assert!(features.at(1).unwrap().id().is_some());
    assert_ne!(features.at(0).unwrap().id(), features.at(1).unwrap().id());

    // one pivot row per nested element
    assert_eq!(storage.row_count("cars_features"), 2);
}

#[tokio::test]
async fn creates_models_within_a_nested_collection() {
    let manager = common::manager();
    let make = manager
        .create(
            "make",
            json!({ "models": [ { "name": "X3" }, { "name": "X5" } ] }),
        )
        .await
        .unwrap();

    assert_eq!(make.id(), Some(&json!(1)));

    let models = make.related("models").unwrap().collection().unwrap();
    assert_eq!(models.len(), 2);
    assert!(models.at(0).unwrap().id().is_some());
    assert!(models.at(1).unwrap().id().is_some());
    assert_ne!(models.at(0).unwrap().id(), models.at(1).unwrap().id());
    assert_eq!(models.at(0).unwrap().get("name"), Some(&json!("X3")));
    assert_eq!(models.at(1).unwrap().get("name"), Some(&json!("X5")));

    // children store the parent's identity
    assert_eq!(models.at(0).unwrap().get("make_id"), make.id());
}

#[tokio::test]
async fn creates_a_deep_object() {
    let manager = common::manager();
    let result = manager
        .create(
            "make",
            json!({
                "name": "BMW",
                "models": [{
                    "name": "X5",
                    "cost": 50000,
                    "type": { "name": "Crossover" },
                    "specs": [ { "name": "4 door" }, { "name": "v6" } ]
                }]
            }),
        )
        .await
        .unwrap();

    let actual = manager
        .fetch(
            "make",
            json!({ "name": "BMW" }),
            &["models.type", "models.specs"],
        )
        .await
        .unwrap();

    let result_models = result.related("models").unwrap().collection().unwrap();
    let actual_models = actual.related("models").unwrap().collection().unwrap();
    assert_eq!(actual_models.len(), result_models.len());

    let result_x5 = result_models.at(0).unwrap();
    let actual_x5 = actual_models.at(0).unwrap();
    assert_eq!(
        actual_x5.related("specs").unwrap().collection().unwrap().len(),
        result_x5.related("specs").unwrap().collection().unwrap().len()
    );
    assert_eq!(
        actual_x5.related("type").unwrap().model().unwrap().id(),
        result_x5.related("type").unwrap().model().unwrap().id()
    );
    assert_eq!(
        actual_x5.related("type").unwrap().model().unwrap().get("name"),
        Some(&json!("Crossover"))
    );
}

#[tokio::test]
async fn rejects_an_array_payload_for_a_single_create() {
    let manager = common::manager();
    let result = manager.create("car", json!([{ "quantity": 1 }])).await;
    assert!(matches!(result, Err(ModelError::Payload(_))));
}

struct RequireStringName;

#[async_trait]
impl Observer for RequireStringName {
    async fn saving(&self, model: &mut Model) -> Result<(), HookError> {
        match model.get("name") {
            Some(Value::String(_)) => Ok(()),
            _ => Err(HookError::validation("model name must be a string")),
        }
    }
}

#[tokio::test]
async fn sets_scalar_attributes_before_saving_new_models() {
    let manager = common::manager();
    manager.observe("model", Arc::new(RequireStringName));

    let model = manager
        .create("model", json!({ "name": "test" }))
        .await
        .unwrap();
    assert_eq!(model.get("name"), Some(&json!("test")));
}

#[tokio::test]
async fn a_failing_hook_aborts_the_node() {
    let (manager, storage) = common::manager_with_storage();
    manager.observe("model", Arc::new(RequireStringName));

    let result = manager.create("model", json!({ "cost": 100 })).await;

    assert!(matches!(result, Err(ModelError::Validation { .. })));
    assert_eq!(storage.row_count("models"), 0);
}

#[tokio::test]
async fn earlier_siblings_survive_a_later_hook_failure() {
    let (manager, storage) = common::manager_with_storage();

    struct RejectBadNames;

    #[async_trait]
    impl Observer for RejectBadNames {
        async fn saving(&self, model: &mut Model) -> Result<(), HookError> {
            if model.get("name") == Some(&json!("bad")) {
                return Err(HookError::validation("bad name"));
            }
            Ok(())
        }
    }

    manager.observe("model", Arc::new(RejectBadNames));

    let result = manager
        .create(
            "make",
            json!({ "models": [ { "name": "ok" }, { "name": "bad" } ] }),
        )
        .await;

    assert!(matches!(result, Err(ModelError::Validation { .. })));
    // the parent row and the first sibling were already written and stay
    assert_eq!(storage.row_count("makes"), 1);
    assert_eq!(storage.row_count("models"), 1);
}

#[tokio::test]
async fn hooks_may_adjust_attributes_before_the_write() {
    let manager = common::manager();

    struct NormalizeNames;

    #[async_trait]
    impl Observer for NormalizeNames {
        async fn saving(&self, model: &mut Model) -> Result<(), HookError> {
            if let Some(Value::String(name)) = model.get("name").cloned() {
                model.set("name", json!(name.to_uppercase()));
            }
            Ok(())
        }
    }

    manager.observe("color", Arc::new(NormalizeNames));

    let car = manager
        .create("car", json!({ "color": { "name": "white" } }))
        .await
        .unwrap();

    let color = car.related("color").unwrap().model().unwrap();
    assert_eq!(color.get("name"), Some(&json!("WHITE")));

    // the adjusted value is what storage received
    let stored = manager.fetch("color", json!({}), &[]).await.unwrap();
    assert_eq!(stored.get("name"), Some(&json!("WHITE")));
}

#[tokio::test]
async fn unknown_root_type_errors() {
    let manager = common::manager();
    let result = manager.create("boat", json!({})).await;
    assert!(matches!(result, Err(ModelError::UnknownType(_))));
}
