use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    common::Page,
    error::AppError,
    notify::Notification,
    routes::invalidate_catalog,
    utils::{Claims, message_to_api_response, success_to_api_response, validation::Validator},
};

use super::model::{Product, ProductListQuery, ProductRequest};

fn ensure_catalog_role(claims: &Claims) -> Result<(), AppError> {
    if claims.role.can_manage_catalog() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn validate(req: &ProductRequest) -> Result<(), AppError> {
    Validator::new()
        .require("name", &req.name, "Product name")
        .length("name", &req.name, 2, 120)
        .require("sku", &req.sku, "SKU")
        .require("category", &req.category, "Category")
        .non_negative("price", req.price)
        .check(
            "stock_quantity",
            req.stock_quantity >= 0,
            "Stock cannot be negative",
        )
        .finish()
}

/// 库存低于阈值时发布提醒
fn notify_stock_level(state: &AppState, product: &Product) {
    let threshold = state.config.low_stock_threshold;
    if product.stock_quantity < threshold {
        state.notifier.publish(Notification::LowStock {
            product_id: product.id,
            name: product.name.clone(),
            stock_quantity: product.stock_quantity,
            threshold,
        });
    }
}

#[axum::debug_handler]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = query.pagination();
    let category = query.category.as_deref().filter(|c| !c.trim().is_empty());
    let (items, total) = Product::list(&state.pool, pagination, category).await?;

    Ok(success_to_api_response(Page {
        items,
        page: pagination.page.unwrap_or(1).max(1),
        limit: pagination.limit(),
        total,
    }))
}

#[axum::debug_handler]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = Product::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;
    Ok(success_to_api_response(product))
}

#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_catalog_role(&claims)?;
    validate(&req)?;

    let product = match Product::create(&state.pool, &req).await {
        Ok(product) => product,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict(format!("SKU {} already exists", req.sku.trim())));
        }
        Err(e) => return Err(e.into()),
    };

    invalidate_catalog(&state, &["products", "search/products", "reports"]).await;
    state.notifier.publish(Notification::ProductCreated {
        product_id: product.id,
        name: product.name.clone(),
    });
    notify_stock_level(&state, &product);

    Ok((StatusCode::CREATED, success_to_api_response(product)))
}

#[axum::debug_handler]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_catalog_role(&claims)?;
    validate(&req)?;

    let product = Product::update(&state.pool, id, &req)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    invalidate_catalog(&state, &["products", "search/products", "reports"]).await;
    state.notifier.publish(Notification::ProductUpdated {
        product_id: product.id,
        name: product.name.clone(),
    });
    notify_stock_level(&state, &product);

    Ok(success_to_api_response(product))
}

#[axum::debug_handler]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ensure_catalog_role(&claims)?;

    if !Product::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Product"));
    }

    invalidate_catalog(&state, &["products", "search/products", "reports"]).await;
    state
        .notifier
        .publish(Notification::ProductDeleted { product_id: id });

    Ok(message_to_api_response("Product deleted"))
}
