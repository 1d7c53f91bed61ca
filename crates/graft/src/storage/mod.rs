//! Storage engine abstraction
//!
//! The manager consumes storage through this trait and never looks behind
//! it. Row data crosses the boundary as JSON maps; identities are JSON
//! values so integer and string keys both work. Transaction and connection
//! scoping stay inside backend construction - the core sequences writes but
//! does not manage transactions.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use memory::MemoryStorage;
pub use postgres::{PostgresConfig, PostgresStorage};

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures from the underlying storage engine
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Query(err.to_string())
    }
}

/// The row-store surface the manager is written against.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a row and return its freshly assigned identity. The stored
    /// row also carries the identity under the `key` column.
    async fn insert(
        &self,
        table: &str,
        key: &str,
        attributes: &Map<String, Value>,
    ) -> StorageResult<Value>;

    /// Overwrite the given columns of the row identified by `id`.
    async fn update(
        &self,
        table: &str,
        key: &str,
        id: &Value,
        attributes: &Map<String, Value>,
    ) -> StorageResult<()>;

    /// Load one row by identity.
    async fn find_by_id(
        &self,
        table: &str,
        key: &str,
        id: &Value,
    ) -> StorageResult<Option<Map<String, Value>>>;

    /// Load every row matching the equality filter; an empty filter matches
    /// all rows. Order follows the store's natural order.
    async fn find_many(
        &self,
        table: &str,
        filter: &Map<String, Value>,
    ) -> StorageResult<Vec<Map<String, Value>>>;

    /// Write a join-table row linking two identities.
    async fn insert_pivot(
        &self,
        table: &str,
        left_key: &str,
        left_id: &Value,
        right_key: &str,
        right_id: &Value,
    ) -> StorageResult<()>;
}

/// Reject names that cannot be safely interpolated into SQL.
pub(crate) fn validate_identifier(name: &str) -> StorageResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(name.to_string()))
    }
}
