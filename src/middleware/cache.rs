use axum::{
    body::{Body, HttpBody, to_bytes},
    extract::{OriginalUri, State},
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument, warn};

use crate::cache::{ResponseCache, keys::api_cache_key};
use crate::error::AppError;

pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// 接口响应缓存中间件
///
/// 只处理 GET 请求：命中时直接返回缓存内容，不再调用后续处理器；
/// 未命中时执行处理器，并且只缓存状态码为 200 的 JSON 响应。
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn cache_response(
    State(cache): State<ResponseCache>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // POST/PUT/DELETE 等非幂等请求不读也不写缓存
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    // 嵌套路由会去掉前缀，缓存键使用原始 URI
    let key = match request.extensions().get::<OriginalUri>() {
        Some(OriginalUri(uri)) => api_cache_key(uri),
        None => api_cache_key(request.uri()),
    };

    if let Some(body) = cache.lookup(&key).await {
        debug!(cache = "api", outcome = "hit", %key);
        return cached_response(body);
    }

    debug!(cache = "api", outcome = "miss", %key);
    let response = next.run(request).await;

    if response.status() != StatusCode::OK || !is_json(&response) {
        return response;
    }

    // 过大或长度未知的响应直接透传
    let fits = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|len| len as usize <= cache.max_body_bytes());
    if !fits {
        debug!(cache = "api", %key, "response too large to cache");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, cache.max_body_bytes()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // 响应体已被消费，只能按普通服务端错误返回
            warn!(cache = "api", %key, "failed to buffer response body: {}", e);
            return AppError::Internal(format!("failed to buffer response body: {}", e))
                .into_response();
        }
    };

    match std::str::from_utf8(&bytes) {
        Ok(text) => cache.put(&key, text).await,
        Err(_) => warn!(cache = "api", %key, "response body is not valid UTF-8, skipping cache"),
    }

    parts
        .headers
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(bytes))
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn cached_response(body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::HeaderName::from_static(CACHE_STATUS_HEADER), "HIT"),
        ],
        body,
    )
        .into_response()
}
