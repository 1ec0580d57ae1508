use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{
    AppState,
    middleware::{auth_middleware, cache_response, log_errors},
};

pub mod auth;
pub mod product;
pub mod report;
pub mod search;
pub mod supplier;
pub mod ws;

/// 组装全部路由
pub fn create_router(state: AppState) -> Router {
    // 公开路由
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/ws", get(ws::notifications));

    // 读取接口经过响应缓存
    let catalog_routes = Router::new()
        .route(
            "/products",
            get(product::list_products).post(product::create_product),
        )
        .route(
            "/products/{id}",
            get(product::get_product)
                .put(product::update_product)
                .delete(product::delete_product),
        )
        .route(
            "/suppliers",
            get(supplier::list_suppliers).post(supplier::create_supplier),
        )
        .route(
            "/suppliers/{id}",
            get(supplier::get_supplier)
                .put(supplier::update_supplier)
                .delete(supplier::delete_supplier),
        )
        .route("/search/products", get(search::search_products))
        .route("/search/suppliers", get(search::search_suppliers))
        .route("/reports/inventory", get(report::inventory_report))
        .route("/reports/low-stock", get(report::low_stock_report))
        .route_layer(axum::middleware::from_fn_with_state(
            state.cache.clone(),
            cache_response,
        ));

    // 认证中间件包在缓存外层，未认证的请求读不到缓存
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/update-password", put(auth::update_password))
        .route("/notifications/announce", post(ws::announce))
        .merge(catalog_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest(
            &state.config.api_base_uri,
            Router::new().merge(public_routes).merge(protected_routes),
        )
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}

/// 数据变更后删除受影响的接口缓存
///
/// `segments` 是相对 API 根路径的前缀，例如 `products`、`search/products`。
pub async fn invalidate_catalog(state: &AppState, segments: &[&str]) {
    let base = state.config.api_base_uri.trim_end_matches('/');
    for segment in segments {
        let prefix = format!("{}/{}", base, segment);
        let removed = state.cache.invalidate_prefix(&prefix).await;
        tracing::debug!(%prefix, removed, "invalidated cached responses");
    }
}
