use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppError,
    routes::{product::Product, supplier::Supplier},
    utils::{success_to_api_response, validation::Validator},
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

impl SearchQuery {
    fn validated(&self) -> Result<(&str, i64), AppError> {
        Validator::new()
            .require("q", &self.q, "Search term")
            .length("q", &self.q, 1, 100)
            .finish()?;
        Ok((self.q.trim(), self.limit.unwrap_or(20).clamp(1, 50)))
    }
}

#[axum::debug_handler]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (term, limit) = query.validated()?;
    let products = Product::search(&state.pool, term, limit).await?;
    Ok(success_to_api_response(products))
}

#[axum::debug_handler]
pub async fn search_suppliers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (term, limit) = query.validated()?;
    let suppliers = Supplier::search(&state.pool, term, limit).await?;
    Ok(success_to_api_response(suppliers))
}
