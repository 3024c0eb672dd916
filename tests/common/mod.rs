#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use stockroom_api::{
    config::{AppConfig, BootstrapAdmin},
    db, events,
    services::operators::{CreateOperatorRequest, LoginRequest},
    AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str =
    "q8Zr2mN4vX7tL1pK9sD3fG6hJ0wE5yU8iO2aB4cV7nM1xZ3lQ9kR6tY0uP5oI8eW";
pub const ADMIN_EMAIL: &str = "admin@stockroom.test";
pub const ADMIN_PASSWORD: &str = "admin-pass-123";
pub const OPERATOR_EMAIL: &str = "operator@stockroom.test";
pub const OPERATOR_PASSWORD: &str = "operator-pass-123";

/// Helper harness for spinning up the full router over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin_token: String,
    pub operator_token: String,
    pub operator_id: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with a fresh database, one admin
    /// and one operator.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // One connection keeps every query on the same in-memory database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.cors_allow_any_origin = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, Arc::new(event_sender));
        let operators = state.services.operators.clone();

        operators
            .ensure_admin(BootstrapAdmin {
                name: "Head Admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                phone: "0700000001".to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .expect("seed admin");

        let operator = operators
            .create_operator(CreateOperatorRequest {
                name: "Floor Operator".to_string(),
                email: OPERATOR_EMAIL.to_string(),
                phone: "0700000002".to_string(),
                password: Some(OPERATOR_PASSWORD.to_string()),
            })
            .await
            .expect("seed operator");

        let admin_token = operators
            .login(LoginRequest {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .expect("admin login")
            .token;
        let operator_token = operators
            .login(LoginRequest {
                email: OPERATOR_EMAIL.to_string(),
                password: OPERATOR_PASSWORD.to_string(),
            })
            .await
            .expect("operator login")
            .token;

        let router = stockroom_api::app_router(state.clone());

        Self {
            router,
            state,
            admin_token,
            operator_token,
            operator_id: operator.id,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request as the seeded operator, returning status and parsed body.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self
            .request(method, uri, body, Some(&self.operator_token))
            .await;
        read_json(response).await
    }

    /// Request as the seeded admin, returning status and parsed body.
    pub async fn call_as_admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = self.admin_token.clone();
        let response = self.request(method, uri, body, Some(&token)).await;
        read_json(response).await
    }

    /// Creates a product through the API and returns its `data` object.
    pub async fn create_product(&self, name: &str, price: &str, quantity: i32) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/products",
                Some(json!({
                    "name": name,
                    "description": format!("{} for tests", name),
                    "price": price,
                    "quantity": quantity,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create product failed: {body}");
        body["data"].clone()
    }

    /// Issues products to a fixed customer; `lines` are (product id, quantity).
    pub async fn issue(&self, lines: &[(&str, i32)]) -> (StatusCode, Value) {
        let items: Vec<Value> = lines
            .iter()
            .map(|(id, qty)| json!({ "product_id": id, "quantity": qty }))
            .collect();
        self.call(
            Method::POST,
            "/api/v1/issues",
            Some(json!({
                "customer": { "name": "Jane Buyer", "phone": "0711222333", "location": "Nairobi" },
                "items": items,
            })),
        )
        .await
    }

    pub async fn product_quantity(&self, id: &str) -> i64 {
        let (status, body) = self
            .call(Method::GET, &format!("/api/v1/products/{}", id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["quantity"].as_i64().expect("quantity")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read response body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

/// Decimal fields serialize as strings; compare them numerically.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}
