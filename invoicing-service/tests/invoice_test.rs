//! Invoice lifecycle integration tests for invoicing-service.

mod common;

use axum::http::StatusCode;
use common::{invoice_body, TestApp};
use invoicing_service::services::repository::InvoiceRepository;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn create_invoice_returns_sequential_codes() {
    let app = TestApp::spawn().await;

    let first = app
        .create_invoice(invoice_body(1, "Spring campaign", &[(1, 2), (3, 10)]))
        .await;
    let second = app
        .create_invoice(invoice_body(2, "Landing page", &[(2, 1)]))
        .await;

    assert_eq!(first, "0001");
    assert_eq!(second, "0002");
}

#[tokio::test]
async fn create_invoice_envelope_shape() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/v1/invoices", invoice_body(1, "Spring campaign", &[(1, 1)]))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "200");
    assert_eq!(body["message"], "success");
    assert_eq!(body["data"], json!({"invoiceId": "0001"}));
    assert_eq!(body["errors"], json!([]));
}

#[tokio::test]
async fn create_with_unknown_customer_persists_nothing() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/v1/invoices", invoice_body(404, "Nobody", &[(1, 1)]))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "data customers not found");
    assert_eq!(body["data"], json!({}));
    assert_eq!(app.store.invoice_rows().await, 0);
    assert_eq!(app.store.summary_rows().await, 0);
    assert_eq!(app.store.line_item_rows().await, 0);
}

#[tokio::test]
async fn create_with_unknown_item_persists_nothing() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/v1/invoices", invoice_body(1, "Mystery", &[(1, 1), (99, 1)]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "there is invalid items");
    assert_eq!(app.store.invoice_rows().await, 0);
}

#[tokio::test]
async fn create_with_duplicate_items_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/v1/invoices", invoice_body(1, "Twice", &[(2, 1), (2, 3)]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "there is invalid items");
}

#[tokio::test]
async fn create_with_malformed_date_is_rejected() {
    let app = TestApp::spawn().await;
    let mut body = invoice_body(1, "Bad date", &[(1, 1)]);
    body["issueDate"] = json!("01-03-2024");

    let (status, body) = app.post("/v1/invoices", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid issueDate, expected YYYY-MM-DD");
}

#[tokio::test]
async fn create_without_items_fails_validation() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/v1/invoices", invoice_body(1, "Empty", &[]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid request format");
    assert!(body["errors"][0]
        .as_str()
        .unwrap()
        .contains("at least one invoice item is required"));
}

#[tokio::test]
async fn create_with_blank_subject_fails_validation() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/v1/invoices", invoice_body(1, "   ", &[(1, 1)]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"][0].as_str().unwrap().contains("subject is required"));
    assert_eq!(app.store.invoice_rows().await, 0);
}

#[tokio::test]
async fn create_cut_off_by_timeout_persists_nothing() {
    let app = TestApp::spawn_with_timeout(Duration::from_millis(100)).await;

    // Hold the store so the create cannot finish before its deadline.
    let held = app.store.begin().await.unwrap();
    let (status, _) = app
        .post("/v1/invoices", invoice_body(1, "Too slow", &[(1, 1)]))
        .await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    held.rollback().await.unwrap();

    assert_eq!(app.store.invoice_rows().await, 0);
    let code = app
        .create_invoice(invoice_body(1, "On time", &[(1, 1)]))
        .await;
    assert_eq!(code, "0001");
}

#[tokio::test]
async fn create_with_malformed_json_is_bad_request() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/v1/invoices", json!({"subject": "missing everything"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid request format");
}

#[tokio::test]
async fn get_invoice_returns_denormalized_detail() {
    let app = TestApp::spawn().await;
    let code = app
        .create_invoice(invoice_body(1, "Spring campaign", &[(1, 2), (3, 10)]))
        .await;

    let (status, body) = app.get(&format!("/v1/invoices/{}", code)).await;

    assert_eq!(status, StatusCode::OK);
    let detail = &body["data"];
    assert_eq!(detail["invoiceId"], "0001");
    assert_eq!(detail["subject"], "Spring campaign");
    assert_eq!(detail["issueDate"], "2024-03-01");
    assert_eq!(detail["customer"]["name"], "Acme Widgets");
    assert_eq!(detail["customer"]["city"], "Jakarta");
    assert_eq!(detail["items"][0]["name"], "Design Consultation");
    assert_eq!(detail["items"][0]["quantity"], 2.0);
    assert_eq!(detail["items"][1]["name"], "Printed Brochure");
    assert_eq!(detail["summary"]["status"], "unpaid");
    assert_eq!(detail["summary"]["totalItems"], 2);
    assert_eq!(detail["summary"]["grandTotal"], 1200.0);
}

#[tokio::test]
async fn get_unknown_invoice_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/v1/invoices/0042").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "data invoice not found");
    assert_eq!(body["data"], json!({}));
}

#[tokio::test]
async fn edit_invoice_reconciles_items_and_summary() {
    let app = TestApp::spawn().await;
    let code = app
        .create_invoice(invoice_body(1, "Spring campaign", &[(1, 1), (2, 1), (3, 1)]))
        .await;

    let mut edit = invoice_body(2, "Spring campaign (revised)", &[(2, 4), (3, 1), (4, 12)]);
    edit["invoiceId"] = json!(code);
    edit["invoiceSummary"]["isPaid"] = json!(true);

    let (status, body) = app.patch("/v1/invoices", edit).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["invoiceId"], code);

    let (_, body) = app.get(&format!("/v1/invoices/{}", code)).await;
    let detail = &body["data"];
    assert_eq!(detail["subject"], "Spring campaign (revised)");
    assert_eq!(detail["customer"]["name"], "Globex Corporation");
    assert_eq!(detail["summary"]["status"], "paid");
    assert_eq!(detail["summary"]["totalItems"], 3);

    let names: Vec<&str> = detail["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Landing Page", "Printed Brochure", "Hosting (monthly)"]
    );

    // The dropped line survives as a soft-deleted row.
    let stored = app.store.stored_invoice(&code).await.unwrap();
    assert_eq!(stored.line_items.len(), 4);
    assert_eq!(
        stored
            .line_items
            .iter()
            .filter(|l| l.deleted_utc.is_some())
            .count(),
        1
    );
}

#[tokio::test]
async fn edit_unknown_invoice_is_not_found() {
    let app = TestApp::spawn().await;
    let mut edit = invoice_body(1, "Ghost", &[(1, 1)]);
    edit["invoiceId"] = json!("0099");

    let (status, body) = app.patch("/v1/invoices", edit).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "data invoice not found");
}

#[tokio::test]
async fn edit_with_unknown_item_leaves_invoice_untouched() {
    let app = TestApp::spawn().await;
    let code = app
        .create_invoice(invoice_body(1, "Spring campaign", &[(1, 1)]))
        .await;

    let mut edit = invoice_body(1, "Changed", &[(77, 1)]);
    edit["invoiceId"] = json!(code);
    let (status, _) = app.patch("/v1/invoices", edit).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/v1/invoices/{}", code)).await;
    assert_eq!(body["data"]["subject"], "Spring campaign");
}

#[tokio::test]
async fn delete_invoice_then_detail_is_not_found() {
    let app = TestApp::spawn().await;
    let code = app
        .create_invoice(invoice_body(1, "Spring campaign", &[(1, 1)]))
        .await;

    let (status, body) = app.delete(&format!("/v1/invoices/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "success delete invoice data with id 0001");

    let (status, body) = app.get(&format!("/v1/invoices/{}", code)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "data invoice not found");

    let (status, _) = app.delete(&format!("/v1/invoices/{}", code)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::spawn().await;

    let response = {
        use axum::body::Body;
        use axum::http;
        use tower::ServiceExt;

        app.router
            .clone()
            .oneshot(
                http::Request::builder()
                    .uri("/health")
                    .header("x-request-id", "inv-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    };

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-request-id").unwrap(), "inv-123");
}
