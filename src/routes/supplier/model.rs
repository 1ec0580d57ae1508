use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::common::Pagination;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRequest {
    pub name: String,
    #[serde(default, alias = "contactName")]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

const SUPPLIER_COLUMNS: &str =
    "id, name, contact_name, phone, email, address, created_at, updated_at";

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Supplier {
    pub async fn list(
        pool: &PgPool,
        pagination: Pagination,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name LIMIT $1 OFFSET $2");
        let items = sqlx::query_as::<_, Supplier>(&sql)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(pool)
            .await?;
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM suppliers")
            .fetch_one(pool)
            .await?;
        Ok((items, total))
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1");
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn search(pool: &PgPool, term: &str, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers \
             WHERE name ILIKE $1 OR contact_name ILIKE $1 OR email ILIKE $1 \
             ORDER BY name LIMIT $2"
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(format!("%{}%", term.trim()))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &PgPool, req: &SupplierRequest) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO suppliers (id, name, contact_name, phone, email, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.name.trim())
            .bind(trimmed(&req.contact_name))
            .bind(trimmed(&req.phone))
            .bind(trimmed(&req.email))
            .bind(trimmed(&req.address))
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &SupplierRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE suppliers
            SET name = $2, contact_name = $3, phone = $4, email = $5, address = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SUPPLIER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .bind(req.name.trim())
            .bind(trimmed(&req.contact_name))
            .bind(trimmed(&req.phone))
            .bind(trimmed(&req.email))
            .bind(trimmed(&req.address))
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
