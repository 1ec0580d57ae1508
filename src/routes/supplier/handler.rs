use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    common::{Page, Pagination},
    error::AppError,
    notify::Notification,
    routes::invalidate_catalog,
    utils::{Claims, message_to_api_response, success_to_api_response, validation::Validator},
};

use super::model::{Supplier, SupplierRequest};

const AFFECTED: &[&str] = &["suppliers", "search/suppliers", "reports"];

fn validate(req: &SupplierRequest) -> Result<(), AppError> {
    let mut validator = Validator::new();
    validator
        .require("name", &req.name, "Supplier name")
        .length("name", &req.name, 2, 120);
    if let Some(email) = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        validator.email("email", email);
    }
    if let Some(phone) = req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        validator.check(
            "phone",
            phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-')),
            "Enter a valid phone number",
        );
    }
    validator.finish()
}

#[axum::debug_handler]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (items, total) = Supplier::list(&state.pool, pagination).await?;
    Ok(success_to_api_response(Page {
        items,
        page: pagination.page.unwrap_or(1).max(1),
        limit: pagination.limit(),
        total,
    }))
}

#[axum::debug_handler]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let supplier = Supplier::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("Supplier"))?;
    Ok(success_to_api_response(supplier))
}

#[axum::debug_handler]
pub async fn create_supplier(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SupplierRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.role.can_manage_catalog() {
        return Err(AppError::Forbidden);
    }
    validate(&req)?;

    let supplier = Supplier::create(&state.pool, &req).await?;
    invalidate_catalog(&state, AFFECTED).await;
    state.notifier.publish(Notification::SupplierUpdated {
        supplier_id: supplier.id,
        name: supplier.name.clone(),
    });

    Ok((StatusCode::CREATED, success_to_api_response(supplier)))
}

#[axum::debug_handler]
pub async fn update_supplier(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<SupplierRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.role.can_manage_catalog() {
        return Err(AppError::Forbidden);
    }
    validate(&req)?;

    let supplier = Supplier::update(&state.pool, id, &req)
        .await?
        .ok_or(AppError::NotFound("Supplier"))?;
    invalidate_catalog(&state, AFFECTED).await;
    state.notifier.publish(Notification::SupplierUpdated {
        supplier_id: supplier.id,
        name: supplier.name.clone(),
    });

    Ok(success_to_api_response(supplier))
}

#[axum::debug_handler]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.role.can_manage_catalog() {
        return Err(AppError::Forbidden);
    }
    if !Supplier::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Supplier"));
    }

    // 商品上的供应商外键会被置空，商品相关缓存一并失效
    invalidate_catalog(&state, AFFECTED).await;
    invalidate_catalog(&state, &["products"]).await;

    Ok(message_to_api_response("Supplier deleted"))
}
