use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::common::ReportFormat;
use crate::routes::product::Product;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
    pub threshold: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct InventoryLine {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub stock_quantity: i32,
    pub price: f64,
    pub value: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub products: usize,
    pub units: i64,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    pub total_products: usize,
    pub total_units: i64,
    pub total_value: f64,
    pub categories: Vec<CategorySummary>,
    pub items: Vec<InventoryLine>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct LowStockLine {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub stock_quantity: i32,
    pub supplier_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LowStockReport {
    pub generated_at: DateTime<Utc>,
    pub threshold: i32,
    pub items: Vec<LowStockLine>,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl InventoryReport {
    pub fn build(products: Vec<Product>, generated_at: DateTime<Utc>) -> Self {
        let mut categories: BTreeMap<String, CategorySummary> = BTreeMap::new();
        let mut items = Vec::with_capacity(products.len());

        for product in products {
            let value = round_cents(product.price * f64::from(product.stock_quantity));
            let summary = categories
                .entry(product.category.clone())
                .or_insert_with(|| CategorySummary {
                    category: product.category.clone(),
                    products: 0,
                    units: 0,
                    value: 0.0,
                });
            summary.products += 1;
            summary.units += i64::from(product.stock_quantity);
            summary.value = round_cents(summary.value + value);

            items.push(InventoryLine {
                sku: product.sku,
                name: product.name,
                category: product.category,
                stock_quantity: product.stock_quantity,
                price: product.price,
                value,
            });
        }

        let categories: Vec<CategorySummary> = categories.into_values().collect();
        Self {
            generated_at,
            total_products: items.len(),
            total_units: categories.iter().map(|c| c.units).sum(),
            total_value: round_cents(categories.iter().map(|c| c.value).sum()),
            categories,
            items,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Products: {}   Units: {}   Value: {:.2}",
                self.total_products, self.total_units, self.total_value
            ),
            String::new(),
            "By category".to_string(),
        ];
        for c in &self.categories {
            lines.push(format!(
                "  {:<24} {:>6} items {:>8} units {:>12.2}",
                c.category, c.products, c.units, c.value
            ));
        }
        lines.push(String::new());
        lines.push(format!(
            "{:<12} {:<28} {:>8} {:>10} {:>12}",
            "SKU", "Product", "Stock", "Price", "Value"
        ));
        for item in &self.items {
            lines.push(format!(
                "{:<12} {:<28} {:>8} {:>10.2} {:>12.2}",
                item.sku, item.name, item.stock_quantity, item.price, item.value
            ));
        }
        lines
    }
}

impl LowStockReport {
    pub async fn load(pool: &PgPool, threshold: i32) -> Result<Self, sqlx::Error> {
        let items = sqlx::query_as::<_, LowStockLine>(
            r#"
            SELECT p.id AS product_id, p.sku, p.name, p.stock_quantity, s.name AS supplier_name
            FROM products p
            LEFT JOIN suppliers s ON s.id = p.supplier_id
            WHERE p.stock_quantity < $1
            ORDER BY p.stock_quantity, p.name
            "#,
        )
        .bind(threshold)
        .fetch_all(pool)
        .await?;

        Ok(Self {
            generated_at: Utc::now(),
            threshold,
            items,
        })
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Products below {} units: {}", self.threshold, self.items.len()),
            String::new(),
            format!(
                "{:<12} {:<28} {:>8}  {}",
                "SKU", "Product", "Stock", "Supplier"
            ),
        ];
        for item in &self.items {
            lines.push(format!(
                "{:<12} {:<28} {:>8}  {}",
                item.sku,
                item.name,
                item.stock_quantity,
                item.supplier_name.as_deref().unwrap_or("-")
            ));
        }
        lines
    }
}
