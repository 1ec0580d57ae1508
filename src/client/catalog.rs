use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use super::error::ClientError;
use super::http::{ApiClient, RequestConfig};
use crate::common::Page;
use crate::routes::product::{Product, ProductRequest};
use crate::routes::supplier::{Supplier, SupplierRequest};

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, ClientError> {
    serde_json::to_value(value).map_err(|e| ClientError::InvalidRequest(e.to_string()))
}

fn page_query(page: Option<i64>, limit: Option<i64>) -> RequestConfig {
    let mut config = RequestConfig::new();
    if let Some(page) = page {
        config = config.query("page", page);
    }
    if let Some(limit) = limit {
        config = config.query("limit", limit);
    }
    config
}

pub async fn list_products(
    api: &ApiClient,
    page: Option<i64>,
    limit: Option<i64>,
    category: Option<&str>,
) -> Result<Page<Product>, ClientError> {
    let mut config = page_query(page, limit);
    if let Some(category) = category {
        config = config.query("category", category);
    }
    api.request_data(Method::GET, "/products", None, Some(config))
        .await
}

pub async fn get_product(api: &ApiClient, id: Uuid) -> Result<Product, ClientError> {
    api.request_data(Method::GET, &format!("/products/{}", id), None, None)
        .await
}

/// `id` 为空时新建，否则更新
pub async fn save_product(
    api: &ApiClient,
    id: Option<Uuid>,
    product: &ProductRequest,
) -> Result<Product, ClientError> {
    let body = to_body(product)?;
    match id {
        Some(id) => {
            api.request_data(Method::PUT, &format!("/products/{}", id), Some(&body), None)
                .await
        }
        None => {
            api.request_data(Method::POST, "/products", Some(&body), None)
                .await
        }
    }
}

pub async fn delete_product(api: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    api.request(Method::DELETE, &format!("/products/{}", id), None, None)
        .await
        .map(|_| ())
}

pub async fn list_suppliers(
    api: &ApiClient,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Page<Supplier>, ClientError> {
    api.request_data(Method::GET, "/suppliers", None, Some(page_query(page, limit)))
        .await
}

pub async fn get_supplier(api: &ApiClient, id: Uuid) -> Result<Supplier, ClientError> {
    api.request_data(Method::GET, &format!("/suppliers/{}", id), None, None)
        .await
}

pub async fn save_supplier(
    api: &ApiClient,
    id: Option<Uuid>,
    supplier: &SupplierRequest,
) -> Result<Supplier, ClientError> {
    let body = to_body(supplier)?;
    match id {
        Some(id) => {
            api.request_data(Method::PUT, &format!("/suppliers/{}", id), Some(&body), None)
                .await
        }
        None => {
            api.request_data(Method::POST, "/suppliers", Some(&body), None)
                .await
        }
    }
}

pub async fn delete_supplier(api: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    api.request(Method::DELETE, &format!("/suppliers/{}", id), None, None)
        .await
        .map(|_| ())
}

pub async fn search_products(api: &ApiClient, term: &str) -> Result<Vec<Product>, ClientError> {
    let config = RequestConfig::new().query("q", term);
    api.request_data(Method::GET, "/search/products", None, Some(config))
        .await
}

pub async fn search_suppliers(api: &ApiClient, term: &str) -> Result<Vec<Supplier>, ClientError> {
    let config = RequestConfig::new().query("q", term);
    api.request_data(Method::GET, "/search/suppliers", None, Some(config))
        .await
}
