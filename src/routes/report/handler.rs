use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    AppState,
    common::{ReportFormat, report_filename},
    error::AppError,
    routes::product::Product,
    utils::success_to_api_response,
};

use super::model::{InventoryReport, LowStockReport, ReportQuery};
use super::pdf;

fn pdf_response(kind: &str, title: &str, lines: &[String]) -> Result<Response, AppError> {
    let today = Utc::now().date_naive();
    let bytes = pdf::render(title, &format!("Generated {}", today), lines)?;
    let disposition = format!("attachment; filename=\"{}\"", report_filename(kind, today));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn inventory_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let products = Product::list_all(&state.pool).await?;
    let report = InventoryReport::build(products, Utc::now());

    match query.format {
        ReportFormat::Json => Ok(success_to_api_response(report).into_response()),
        ReportFormat::Pdf => pdf_response("inventory", "Sathira Sweet - Inventory", &report.lines()),
    }
}

#[axum::debug_handler]
pub async fn low_stock_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let threshold = query
        .threshold
        .filter(|t| *t > 0)
        .unwrap_or(state.config.low_stock_threshold);
    let report = LowStockReport::load(&state.pool, threshold).await?;

    match query.format {
        ReportFormat::Json => Ok(success_to_api_response(report).into_response()),
        ReportFormat::Pdf => pdf_response("low-stock", "Sathira Sweet - Low stock", &report.lines()),
    }
}
