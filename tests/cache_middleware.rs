use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::{Body, Bytes, to_bytes},
    extract::Query,
    http::{Method, Request, StatusCode, header},
    middleware,
    response::Response,
    routing::get,
};
use sathira::cache::{CacheError, CacheStore, MemoryCacheStore, ResponseCache};
use sathira::middleware::{CACHE_STATUS_HEADER, cache_response};
use serde_json::json;
use tower::ServiceExt;

/// 每次调用计数的测试路由
fn app(cache: ResponseCache, calls: Arc<AtomicUsize>) -> Router {
    let list_calls = Arc::clone(&calls);
    let create_calls = Arc::clone(&calls);
    let missing_calls = Arc::clone(&calls);
    let text_calls = Arc::clone(&calls);

    Router::new()
        .route(
            "/products",
            get(move |Query(query): Query<HashMap<String, String>>| {
                let calls = Arc::clone(&list_calls);
                async move {
                    let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Json(json!({
                        "code": 0,
                        "msg": "Success",
                        "resp_data": { "page": query.get("page"), "call": call }
                    }))
                }
            })
            .post(move || {
                let calls = Arc::clone(&create_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::OK, Json(json!({"code": 0, "msg": "Created"})))
                }
            }),
        )
        .route(
            "/missing",
            get(move || {
                let calls = Arc::clone(&missing_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::NOT_FOUND, Json(json!({"code": 1004, "msg": "Product not found"})))
                }
            }),
        )
        .route(
            "/health",
            get(move || {
                let calls = Arc::clone(&text_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "ok"
                }
            }),
        )
        .route_layer(middleware::from_fn_with_state(cache, cache_response))
}

async fn send(app: &Router, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

async fn body_of(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should buffer")
        .to_vec()
}

fn cache_status(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(CACHE_STATUS_HEADER)
        .and_then(|v| v.to_str().ok())
}

struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn scan_match(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn repeated_get_is_served_from_cache() {
    let store = Arc::new(MemoryCacheStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(ResponseCache::new(store.clone()), Arc::clone(&calls));

    let first = send(&app, Method::GET, "/products?page=1").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(cache_status(&first), Some("MISS"));
    let first_body = body_of(first).await;

    let second = send(&app, Method::GET, "/products?page=1").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(cache_status(&second), Some("HIT"));
    assert_eq!(
        second.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(body_of(second).await, first_body);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(
        store
            .get("api:/products?page=1")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn query_string_is_part_of_the_key() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        ResponseCache::new(Arc::new(MemoryCacheStore::new())),
        Arc::clone(&calls),
    );

    send(&app, Method::GET, "/products?page=1").await;
    send(&app, Method::GET, "/products?page=2").await;
    send(&app, Method::GET, "/products?page=1").await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn mutations_bypass_the_cache() {
    let store = Arc::new(MemoryCacheStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(ResponseCache::new(store.clone()), Arc::clone(&calls));

    for _ in 0..2 {
        let response = send(&app, Method::POST, "/products").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(cache_status(&response), None);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn non_200_and_non_json_responses_are_not_cached() {
    let store = Arc::new(MemoryCacheStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(ResponseCache::new(store.clone()), Arc::clone(&calls));

    for _ in 0..2 {
        let response = send(&app, Method::GET, "/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    for _ in 0..2 {
        let response = send(&app, Method::GET, "/health").await;
        assert_eq!(body_of(response).await, b"ok");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(store.is_empty());
}

#[tokio::test]
async fn unreachable_store_fails_open() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = ResponseCache::new(Arc::new(FailingStore));
    let app = app(cache.clone(), Arc::clone(&calls));

    for expected_call in 1..=2 {
        let response = send(&app, Method::GET, "/products?page=1").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body["resp_data"]["call"], expected_call);
        assert_eq!(body["resp_data"]["page"], "1");
    }

    assert_eq!(cache.invalidate_prefix("/products").await, 0);
    assert_eq!(cache.invalidate_paths(&["/products?page=1"]).await, 0);
}

#[tokio::test(start_paused = true)]
async fn entries_live_for_the_configured_ttl() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = ResponseCache::new(Arc::new(MemoryCacheStore::new())).with_ttl(Duration::from_secs(60));
    let app = app(cache, Arc::clone(&calls));

    send(&app, Method::GET, "/products?page=1").await;
    tokio::time::advance(Duration::from_secs(9)).await;
    send(&app, Method::GET, "/products?page=1").await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(52)).await;
    let response = send(&app, Method::GET, "/products?page=1").await;
    assert_eq!(cache_status(&response), Some("MISS"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidation_forces_a_fresh_read() {
    let store = Arc::new(MemoryCacheStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = ResponseCache::new(store.clone());
    let app = app(cache.clone(), Arc::clone(&calls));

    send(&app, Method::GET, "/products?page=1").await;
    send(&app, Method::GET, "/products?page=2").await;
    assert_eq!(store.len(), 2);

    assert_eq!(cache.invalidate_paths(&["/products?page=2"]).await, 1);
    assert_eq!(store.len(), 1);

    assert_eq!(cache.invalidate_prefix("/products").await, 1);
    assert!(store.is_empty());

    let response = send(&app, Method::GET, "/products?page=1").await;
    assert_eq!(cache_status(&response), Some("MISS"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// 声明了长度但读取时出错的响应体
struct BrokenBody;

impl http_body::Body for BrokenBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Bytes>, Self::Error>>> {
        Poll::Ready(Some(Err(std::io::Error::other("upstream reset"))))
    }

    fn size_hint(&self) -> http_body::SizeHint {
        http_body::SizeHint::with_exact(16)
    }
}

#[tokio::test]
async fn unreadable_body_becomes_a_standard_server_error() {
    let store = Arc::new(MemoryCacheStore::new());
    let app = Router::new()
        .route(
            "/broken",
            get(|| async {
                Response::builder()
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::new(BrokenBody))
                    .unwrap()
            }),
        )
        .route_layer(middleware::from_fn_with_state(
            ResponseCache::new(store.clone()),
            cache_response,
        ));

    let response = send(&app, Method::GET, "/broken").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(cache_status(&response), None);
    let body: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
    assert_eq!(body["msg"], "Internal server error");
    assert!(body["code"].is_number());
    assert!(store.is_empty());
}
