use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::common::Pagination;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub price: f64,
    pub stock_quantity: i32,
    pub supplier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub price: f64,
    #[serde(alias = "stockQuantity", alias = "stock")]
    pub stock_quantity: i32,
    #[serde(default, alias = "supplierId")]
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
}

impl ProductListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, sku, category, price, stock_quantity, supplier_id, created_at, updated_at";

impl Product {
    pub async fn list(
        pool: &PgPool,
        pagination: Pagination,
        category: Option<&str>,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM products");
        if let Some(category) = category {
            query.push(" WHERE category = ").push_bind(category);
            count.push(" WHERE category = ").push_bind(category);
        }
        query
            .push(" ORDER BY name LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let items = query.build_query_as::<Product>().fetch_all(pool).await?;
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;
        Ok((items, total))
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY category, name");
        sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn search(pool: &PgPool, term: &str, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE name ILIKE $1 OR sku ILIKE $1 OR category ILIKE $1 \
             ORDER BY name LIMIT $2"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(format!("%{}%", term.trim()))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn low_stock(pool: &PgPool, threshold: i32) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock_quantity < $1 \
             ORDER BY stock_quantity, name"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &PgPool, req: &ProductRequest) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO products (id, name, sku, category, price, stock_quantity, supplier_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.name.trim())
            .bind(req.sku.trim())
            .bind(req.category.trim())
            .bind(req.price)
            .bind(req.stock_quantity)
            .bind(req.supplier_id)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &ProductRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE products
            SET name = $2, sku = $3, category = $4, price = $5, stock_quantity = $6,
                supplier_id = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(req.name.trim())
            .bind(req.sku.trim())
            .bind(req.category.trim())
            .bind(req.price)
            .bind(req.stock_quantity)
            .bind(req.supplier_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
