//! Test helper utilities for webserver integration tests

use std::net::SocketAddr;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use reconciler::{ContactStore, IdentityResolver, InMemoryContactStore};
use serde_json::Value;
use tower::ServiceExt;
use webserver::WebServer;

pub struct TestHelpers;

impl TestHelpers {
    pub fn test_address() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    /// Webserver over an empty in-memory store
    pub fn memory_server() -> WebServer<InMemoryContactStore> {
        Self::server(InMemoryContactStore::new())
    }

    pub fn server<S>(store: S) -> WebServer<S>
    where
        S: ContactStore + Send + Sync + 'static,
    {
        WebServer::new(Self::test_address(), IdentityResolver::new(store))
    }

    /// POST a raw JSON body to `/identify`
    pub async fn post_identify(router: &Router, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/identify")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        Self::send(router, request).await
    }

    pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        Self::send(router, request).await
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, json)
    }
}
