//! In-memory storage backend
//!
//! Table-per-name row store with monotonically increasing integer
//! identities. Backs the test suite and any caller that wants the manager
//! without a database.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::debug;

use super::{Storage, StorageError, StorageResult};

#[derive(Debug, Default)]
struct MemTable {
    next_id: i64,
    rows: Vec<Map<String, Value>>,
}

/// Thread-safe in-memory row store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: DashMap<String, MemTable>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .get(table)
            .map(|entry| entry.rows.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert(
        &self,
        table: &str,
        key: &str,
        attributes: &Map<String, Value>,
    ) -> StorageResult<Value> {
        let mut entry = self.tables.entry(table.to_string()).or_default();
        entry.next_id += 1;
        let id = Value::from(entry.next_id);

        let mut row = attributes.clone();
        row.insert(key.to_string(), id.clone());
        entry.rows.push(row);

        debug!(table, id = %id, "inserted row");
        Ok(id)
    }

    async fn update(
        &self,
        table: &str,
        key: &str,
        id: &Value,
        attributes: &Map<String, Value>,
    ) -> StorageResult<()> {
        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StorageError::Query(format!("no such table `{}`", table)))?;

        let row = entry
            .rows
            .iter_mut()
            .find(|row| row.get(key) == Some(id))
            .ok_or_else(|| {
                StorageError::Query(format!("no row in `{}` with {} = {}", table, key, id))
            })?;

        for (attr, value) in attributes {
            row.insert(attr.clone(), value.clone());
        }

        debug!(table, id = %id, "updated row");
        Ok(())
    }

    async fn find_by_id(
        &self,
        table: &str,
        key: &str,
        id: &Value,
    ) -> StorageResult<Option<Map<String, Value>>> {
        Ok(self.tables.get(table).and_then(|entry| {
            entry
                .rows
                .iter()
                .find(|row| row.get(key) == Some(id))
                .cloned()
        }))
    }

    async fn find_many(
        &self,
        table: &str,
        filter: &Map<String, Value>,
    ) -> StorageResult<Vec<Map<String, Value>>> {
        Ok(self
            .tables
            .get(table)
            .map(|entry| {
                entry
                    .rows
                    .iter()
                    .filter(|row| {
                        filter
                            .iter()
                            .all(|(attr, value)| row.get(attr) == Some(value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_pivot(
        &self,
        table: &str,
        left_key: &str,
        left_id: &Value,
        right_key: &str,
        right_id: &Value,
    ) -> StorageResult<()> {
        let mut entry = self.tables.entry(table.to_string()).or_default();

        let mut row = Map::new();
        row.insert(left_key.to_string(), left_id.clone());
        row.insert(right_key.to_string(), right_id.clone());
        entry.rows.push(row);

        debug!(table, left = %left_id, right = %right_id, "inserted pivot row");
        Ok(())
    }
}
