#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use stuff_tracker::{build_router, AppConfig, AppState, MemoryStore, Store};
use tower::ServiceExt;

pub fn test_config() -> AppConfig {
    AppConfig {
        bcrypt_cost: 4,
        ..AppConfig::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub memory: Option<Arc<MemoryStore>>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let router = build_router(AppState::new(store.clone(), test_config()));
        TestApp {
            router,
            memory: Some(store),
        }
    }

    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self::with_store_and_config(store, test_config())
    }

    pub fn with_store_and_config(store: Arc<dyn Store>, config: AppConfig) -> Self {
        TestApp {
            router: build_router(AppState::new(store, config)),
            memory: None,
        }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let raw = body.map(|b| b.to_string());
        self.send_raw(method, uri, token, raw.as_deref()).await
    }

    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let req = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Register and return (userId, token).
    pub async fn register(&self, username: &str, password: &str) -> (i64, String) {
        let (status, body) = self
            .send(
                "POST",
                "/api/account/register",
                None,
                Some(json!({"username": username, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        (
            body["userId"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Create an item and return its id.
    pub async fn create_item(&self, token: &str, body: Value) -> i64 {
        let (status, resp) = self.send("POST", "/api/stuff", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", resp);
        resp["item"]["itemId"].as_i64().unwrap()
    }

    pub async fn item_count(&self) -> usize {
        self.memory.as_ref().expect("memory store").item_count().await
    }
}

pub fn hammer() -> Value {
    json!({
        "itemName": "Hammer",
        "quantity": 2,
        "itemType": "tool",
        "itemValue": 9.99,
        "location": "garage"
    })
}
