use async_trait::async_trait;

use super::{ProductStore, StoreError, StoreResult};
use crate::db::{Product, ProductRow};
use crate::DbPool;

const SELECT_COLUMNS: &str = "SELECT id, name, description, price, stock FROM products";

pub struct SqliteProductStore {
    db: DbPool,
}

impl SqliteProductStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .fetch_all(&self.db)
            .await?;

        rows.into_iter()
            .map(|row| Product::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(Product::try_from(row)?)
    }

    async fn create(&self, product: &Product) -> StoreResult<Product> {
        // NULL id lets SQLite pick the next rowid
        let id = (product.id > 0).then_some(product.id);

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (id, name, description, price, stock)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, description, price, stock
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(product.stock)
        .fetch_one(&self.db)
        .await?;

        Ok(Product::try_from(row)?)
    }

    async fn update(&self, id: i64, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?,
                description = ?,
                price = ?,
                stock = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(product.stock)
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
