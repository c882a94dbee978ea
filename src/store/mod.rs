//! Product persistence.
//!
//! Handlers talk to the catalog through [`ProductStore`] so the SQL backend
//! stays behind one seam.

mod sqlite;

pub use sqlite::SqliteProductStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::Product;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("product not found")]
    NotFound,
    #[error("a product with this id already exists")]
    Conflict,
    /// Any other persistence failure. The message is for logs only.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation()
                    || db_err.message().contains("UNIQUE constraint failed") =>
            {
                StoreError::Conflict
            }
            _ => StoreError::Storage(err.to_string()),
        }
    }
}

impl From<rust_decimal::Error> for StoreError {
    fn from(err: rust_decimal::Error) -> Self {
        StoreError::Storage(format!("corrupt price column: {}", err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products ordered by id
    async fn list_all(&self) -> StoreResult<Vec<Product>>;

    async fn get_by_id(&self, id: i64) -> StoreResult<Product>;

    /// Persist a new product. A non-positive `id` lets the store assign one.
    async fn create(&self, product: &Product) -> StoreResult<Product>;

    /// Overwrite name, description, price and stock of an existing row.
    /// `product.id` is ignored; the row keeps `id`.
    async fn update(&self, id: i64, product: &Product) -> StoreResult<()>;

    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Cheap connectivity check used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}
