//! Repository Layer - Core Traits
//!
//! `PersistenceService` is the row-level contract every backend implements.
//! `Repository<T>` layers typed entity access on top of it.

use async_trait::async_trait;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::query::{Filter, Order, Row};
use crate::domain::Entity;
use crate::error::{PersistenceError, PersistenceResult};

/// Row store with create/read/update by column filters
///
/// All operations are async to support remote and local backends.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Rows of `table` matching `filter`, optionally sorted
    async fn query(&self, table: &str, filter: &Filter, order: Option<&Order>) -> PersistenceResult<Vec<Row>>;

    /// Store a new row; returns it with server-assigned `id` and timestamps
    async fn insert(&self, table: &str, row: Row) -> PersistenceResult<Row>;

    /// Merge `patch` into the row with primary key `id`; returns the stored row
    async fn update(&self, table: &str, id: &str, patch: Row) -> PersistenceResult<Row>;

    /// Act as the signed-in user (`None` falls back to anonymous access).
    /// Backends without authentication ignore it.
    fn set_access_token(&self, _token: Option<String>) {}
}

/// Typed access to one entity's table
pub struct Repository<T: Entity> {
    service: Arc<dyn PersistenceService>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::new(self.service.clone())
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(service: Arc<dyn PersistenceService>) -> Self {
        Self {
            service,
            _entity: PhantomData,
        }
    }

    /// List entities matching `filter`
    pub async fn list(&self, filter: &Filter, order: Option<&Order>) -> PersistenceResult<Vec<T>> {
        let rows = self.service.query(T::TABLE, filter, order).await?;
        rows.into_iter().map(from_row).collect()
    }

    /// Find entity by ID
    pub async fn find_by_id(&self, id: &str) -> PersistenceResult<Option<T>> {
        let filter = Filter::new().eq("id", id);
        let mut rows = self.service.query(T::TABLE, &filter, None).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        from_row(rows.swap_remove(0)).map(Some)
    }

    /// Insert a new entity; returns the stored copy
    pub async fn create(&self, entity: &T) -> PersistenceResult<T> {
        let row = to_row(entity)?;
        from_row(self.service.insert(T::TABLE, row).await?)
    }

    /// Apply `patch` to the stored entity; returns the stored copy
    pub async fn update(&self, id: &str, patch: Row) -> PersistenceResult<T> {
        from_row(self.service.update(T::TABLE, id, patch).await?)
    }
}

/// Encode an entity as a row
pub fn to_row<T: serde::Serialize>(entity: &T) -> PersistenceResult<Row> {
    match serde_json::to_value(entity)? {
        Value::Object(row) => Ok(row),
        other => Err(PersistenceError::InvalidRow(format!("expected an object, got {}", other))),
    }
}

/// Decode a row into an entity
pub fn from_row<T: Entity>(row: Row) -> PersistenceResult<T> {
    let mut entity: T = serde_json::from_value(Value::Object(row))?;
    entity.after_load();
    Ok(entity)
}
