use std::str::FromStr;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use storefront_core::domain::product::{CategoryId, Product, ProductAttributes, ProductId};
use storefront_core::recommendations::{CatalogAccess, DataAccessError};

use super::{decode_err, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, name, category_id, price, stock_quantity, active,
                               color, material, usage_area, mounting_type";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE category_id = ? ORDER BY id"
        ))
        .bind(category_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    /// `IS` keeps NULL attributes matching NULL.
    pub async fn find_by_attributes(
        &self,
        attributes: &ProductAttributes,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             WHERE color IS ?1 AND material IS ?2 AND usage_area IS ?3 AND mounting_type IS ?4
             ORDER BY id"
        ))
        .bind(&attributes.color)
        .bind(&attributes.material)
        .bind(&attributes.usage_area)
        .bind(&attributes.mounting_type)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE active = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    pub async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        sqlx::query(
            "INSERT INTO product (id, name, category_id, price, stock_quantity, active,
                                  color, material, usage_area, mounting_type, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 category_id = excluded.category_id,
                 price = excluded.price,
                 stock_quantity = excluded.stock_quantity,
                 active = excluded.active,
                 color = excluded.color,
                 material = excluded.material,
                 usage_area = excluded.usage_area,
                 mounting_type = excluded.mounting_type,
                 updated_at = excluded.updated_at",
        )
        .bind(product.id.0)
        .bind(&product.name)
        .bind(product.category_id.map(|category| category.0))
        .bind(product.price.to_string())
        .bind(product.stock_quantity)
        .bind(product.active)
        .bind(&product.attributes.color)
        .bind(&product.attributes.material)
        .bind(&product.attributes.usage_area)
        .bind(&product.attributes.mounting_type)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_err)?;
    let name: String = row.try_get("name").map_err(decode_err)?;
    let category_id: Option<i64> = row.try_get("category_id").map_err(decode_err)?;
    let price_str: String = row.try_get("price").map_err(decode_err)?;
    let stock_quantity: i32 = row.try_get("stock_quantity").map_err(decode_err)?;
    let active: bool = row.try_get("active").map_err(decode_err)?;

    let price = Decimal::from_str(&price_str).map_err(|error| {
        RepositoryError::Decode(format!("invalid price `{price_str}` for product {id}: {error}"))
    })?;

    Ok(Product {
        id: ProductId(id),
        name,
        category_id: category_id.map(CategoryId),
        price,
        stock_quantity,
        active,
        attributes: ProductAttributes {
            color: row.try_get("color").map_err(decode_err)?,
            material: row.try_get("material").map_err(decode_err)?,
            usage_area: row.try_get("usage_area").map_err(decode_err)?,
            mounting_type: row.try_get("mounting_type").map_err(decode_err)?,
        },
    })
}

#[async_trait]
impl CatalogAccess for SqlCatalogRepository {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, DataAccessError> {
        Ok(self.find_by_id(id).await?)
    }

    async fn get_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, DataAccessError> {
        Ok(self.find_by_category(category_id).await?)
    }

    async fn get_products_by_attributes(
        &self,
        attributes: &ProductAttributes,
    ) -> Result<Vec<Product>, DataAccessError> {
        Ok(self.find_by_attributes(attributes).await?)
    }

    async fn list_active_products(&self) -> Result<Vec<Product>, DataAccessError> {
        Ok(self.list_active().await?)
    }
}
