//! Collection - an ordered group of models of one entity type

use std::cmp::Ordering;

use serde_json::Value;

use crate::model::Model;

/// Ordered sequence of [`Model`]s sharing one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    entity: String,
    models: Vec<Model>,
}

impl Collection {
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            models: Vec::new(),
        }
    }

    pub fn from_models(entity: &str, models: Vec<Model>) -> Self {
        Self {
            entity: entity.to_string(),
            models,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Model> {
        self.models.iter()
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn push(&mut self, model: Model) {
        self.models.push(model);
    }

    pub fn into_models(self) -> Vec<Model> {
        self.models
    }

    /// Values of one attribute across all members, in member order. Members
    /// missing the attribute contribute `Null` so positions stay aligned.
    pub fn pluck(&self, attr: &str) -> Vec<Value> {
        self.models
            .iter()
            .map(|model| model.get(attr).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Stable ascending in-place sort by the named attribute's natural JSON
    /// ordering.
    pub fn sort_by(&mut self, attr: &str) {
        self.models.sort_by(|a, b| {
            compare_values(
                a.get(attr).unwrap_or(&Value::Null),
                b.get(attr).unwrap_or(&Value::Null),
            )
        });
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Model;
    type IntoIter = std::slice::Iter<'a, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

/// Natural ordering across JSON value types: null, then booleans, numbers,
/// strings; composites compare equal among themselves.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
