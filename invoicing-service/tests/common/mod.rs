//! Common test utilities for invoicing-service integration tests.

use axum::body::Body;
use axum::http::{self, Method, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use invoicing_service::services::memory::seeded_store;
use invoicing_service::services::{Database, MemoryStore};
use invoicing_service::startup::{router, AppState};
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use std::time::Duration;
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,invoicing_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Router under test plus a handle on the store behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

#[allow(dead_code)]
impl TestApp {
    /// Router over a store seeded with customers 1-3 and items 1-4.
    pub async fn spawn() -> Self {
        Self::spawn_with_timeout(Duration::from_secs(5)).await
    }

    pub async fn spawn_with_timeout(request_timeout: Duration) -> Self {
        init_tracing();

        let store = seeded_store().await;
        let router = router(AppState::from_store(Arc::new(store.clone())), request_timeout);

        Self { router, store }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(&self.router, method, uri, body).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Creates an invoice and returns its code.
    pub async fn create_invoice(&self, body: Value) -> String {
        let (status, body) = self.post("/v1/invoices", body).await;
        assert_eq!(status, StatusCode::OK, "create failed: {body}");
        body["data"]["invoiceId"]
            .as_str()
            .expect("Missing invoiceId")
            .to_string()
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = http::Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, body)
}

/// A valid create payload for `customer_id` with one line per `(item_id, quantity)`.
#[allow(dead_code)]
pub fn invoice_body(customer_id: i64, subject: &str, items: &[(i64, i64)]) -> Value {
    let lines: Vec<Value> = items
        .iter()
        .map(|(item_id, quantity)| {
            json!({
                "itemId": item_id,
                "quantity": quantity,
                "unitPrice": 100,
                "amount": quantity * 100
            })
        })
        .collect();
    let subtotal: i64 = items.iter().map(|(_, quantity)| quantity * 100).sum();

    json!({
        "issueDate": "2024-03-01",
        "dueDate": "2024-03-31",
        "subject": subject,
        "customerId": customer_id,
        "invoiceItems": lines,
        "invoiceSummary": {
            "totalItems": items.len(),
            "subTotal": subtotal,
            "tax": 0,
            "grandTotal": subtotal
        }
    })
}

/// Router over PostgreSQL at `TEST_DATABASE_URL`, migrated and reset to the
/// seed catalog.
#[allow(dead_code)]
pub async fn spawn_postgres() -> (Router, Database) {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run PostgreSQL tests");
    let db = Database::new(&database_url, 4, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");

    sqlx::query(
        "TRUNCATE invoice_items, invoice_summary, invoices, items, customers RESTART IDENTITY CASCADE",
    )
    .execute(db.pool())
    .await
    .expect("Failed to reset tables");

    sqlx::query(
        r#"
        INSERT INTO customers (name, address, city, postcode, country) VALUES
            ('Acme Widgets', '1 Main Street', 'Jakarta', '00001', 'Indonesia'),
            ('Globex Corporation', '2 Main Street', 'Bandung', '00002', 'Indonesia'),
            ('Initech', '3 Main Street', 'Surabaya', '00003', 'Indonesia')
        "#,
    )
    .execute(db.pool())
    .await
    .expect("Failed to seed customers");

    sqlx::query(
        r#"
        INSERT INTO items (name, item_type) VALUES
            ('Design Consultation', 'service'),
            ('Landing Page', 'service'),
            ('Printed Brochure', 'product'),
            ('Hosting (monthly)', 'service')
        "#,
    )
    .execute(db.pool())
    .await
    .expect("Failed to seed items");

    let router = router(
        AppState::from_store(Arc::new(db.clone())),
        Duration::from_secs(10),
    );
    (router, db)
}
