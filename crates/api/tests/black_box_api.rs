use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use ampere_core::{ClientId, ProjectId, VendorId};
use ampere_infra::Ledger;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = ampere_api::app::build_app(Arc::new(Ledger::in_memory()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_invoice(
    client: &reqwest::Client,
    base_url: &str,
    amount: &str,
    status: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/invoices", base_url))
        .json(&json!({
            "client_id": ClientId::new().to_string(),
            "amount": amount,
            "status": status,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn pay_invoice(
    client: &reqwest::Client,
    base_url: &str,
    invoice_id: &str,
    amount: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/invoices/{}/payments", base_url, invoice_id))
        .json(&json!({ "amount": amount, "method": "cash" }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn invoice_creation_returns_the_gst_breakdown() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/invoices", srv.base_url))
        .json(&json!({
            "client_id": ClientId::new().to_string(),
            "amount": "1000.00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["invoice_number"].as_str().unwrap().starts_with("AMP-INV-"));
    assert_eq!(body["amount"], "1000.00");
    assert_eq!(body["gst_amount"], "70.00");
    assert_eq!(body["total_amount"], "1070.00");
    assert_eq!(body["status"], "draft");
    assert!(body["due_date"].is_string());
}

#[tokio::test]
async fn invoice_numbers_advance_within_the_month() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let first = create_invoice(&client, &srv.base_url, "100.00", "draft").await;
    let second = create_invoice(&client, &srv.base_url, "100.00", "draft").await;

    assert!(first["invoice_number"].as_str().unwrap().ends_with("-001"));
    assert!(second["invoice_number"].as_str().unwrap().ends_with("-002"));
}

#[tokio::test]
async fn full_payment_marks_the_invoice_paid() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let invoice = create_invoice(&client, &srv.base_url, "1000.00", "sent").await;
    let id = invoice["id"].as_str().unwrap();

    let res = pay_invoice(&client, &srv.base_url, id, "1070.00").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let payment: serde_json::Value = res.json().await.unwrap();
    assert_eq!(payment["payer"], "client");
    assert_eq!(payment["invoice_id"], invoice["id"]);
    assert_eq!(payment["method"], "cash");

    let res = client
        .get(format!("{}/invoices/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "paid");
    assert!(body["paid_date"].is_string());
    assert_eq!(body["payment_method"], "cash");
}

#[tokio::test]
async fn overpayment_is_rejected_and_leaves_state_unchanged() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let invoice = create_invoice(&client, &srv.base_url, "1000.00", "sent").await;
    let id = invoice["id"].as_str().unwrap();

    let res = pay_invoice(&client, &srv.base_url, id, "2000.00").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");

    let res = client
        .get(format!("{}/invoices/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "sent");

    let res = client
        .get(format!("{}/invoices/{}/payments", srv.base_url, id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn payments_on_closed_invoices_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let invoice = create_invoice(&client, &srv.base_url, "1000.00", "cancelled").await;
    let id = invoice["id"].as_str().unwrap();

    let res = pay_invoice(&client, &srv.base_url, id, "100.00").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invariant_violation");
}

#[tokio::test]
async fn unknown_ids_return_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let missing = ClientId::new().to_string();
    let res = client
        .get(format!("{}/invoices/{}", srv.base_url, missing))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "not_found");

    let res = client
        .delete(format!("{}/payments/{}", srv.base_url, missing))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_return_invalid_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/invoices/not-a-uuid", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_id");

    let res = client
        .post(format!("{}/invoices", srv.base_url))
        .json(&json!({ "client_id": "not-a-uuid", "amount": "100.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_id");
}

#[tokio::test]
async fn status_filter_narrows_the_invoice_list() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create_invoice(&client, &srv.base_url, "100.00", "draft").await;
    create_invoice(&client, &srv.base_url, "200.00", "sent").await;

    let res = client
        .get(format!("{}/invoices?status=sent", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["amount"], "200.00");

    let res = client
        .get(format!("{}/invoices?status=bogus", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_status");
}

#[tokio::test]
async fn invoice_summary_tracks_payments() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let first = create_invoice(&client, &srv.base_url, "1000.00", "sent").await;
    create_invoice(&client, &srv.base_url, "1000.00", "sent").await;

    let res = pay_invoice(&client, &srv.base_url, first["id"].as_str().unwrap(), "1070.00").await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/invoices/summary", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total_outstanding"], "1070.00");
    assert_eq!(body["total_paid"], "1070.00");
}

#[tokio::test]
async fn vendor_invoice_settles_and_reverts_when_the_payment_is_deleted() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/vendor-invoices", srv.base_url))
        .json(&json!({
            "vendor_id": VendorId::new().to_string(),
            "amount": "500.00",
            "status": "approved",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let invoice: serde_json::Value = res.json().await.unwrap();
    assert!(invoice["invoice_number"].as_str().unwrap().starts_with("AMP-VI-"));
    assert_eq!(invoice["total_amount"], "535.00");
    let id = invoice["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/vendor-invoices/{}/payments", srv.base_url, id))
        .json(&json!({
            "amount": "535.00",
            "method": "cheque",
            "reference": "CHQ-0042",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let payment: serde_json::Value = res.json().await.unwrap();
    assert_eq!(payment["payer"], "vendor");
    let payment_id = payment["id"].as_str().unwrap();

    let res = client
        .get(format!("{}/vendor-invoices/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "paid");

    let res = client
        .delete(format!("{}/payments/{}", srv.base_url, payment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/vendor-invoices/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "approved");
    assert!(body["paid_date"].is_null());
}

#[tokio::test]
async fn purchase_order_flow_commits_and_releases_budget() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let project_id = ProjectId::new().to_string();
    let vendor_id = VendorId::new().to_string();

    let res = client
        .post(format!("{}/assignments", srv.base_url))
        .json(&json!({
            "project_id": &project_id,
            "vendor_id": &vendor_id,
            "budget_allocated": "10000.00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/purchase-orders", srv.base_url))
        .json(&json!({
            "vendor_id": &vendor_id,
            "project_id": &project_id,
            "items": [
                { "description": "Rebar", "quantity": 2, "unit_price": "250.00" },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = res.json().await.unwrap();
    assert!(order["po_number"].as_str().unwrap().starts_with("AMP-PO-"));
    assert_eq!(order["subtotal"], "500.00");
    assert_eq!(order["gst_amount"], "35.00");
    assert_eq!(order["total_amount"], "535.00");
    let order_id = order["id"].as_str().unwrap();

    let res = client
        .get(format!("{}/assignments?project_id={}", srv.base_url, project_id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["budget_used"], "535.00");
    assert_eq!(items[0]["budget_remaining"], "9465.00");

    let res = client
        .delete(format!("{}/purchase-orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/assignments?project_id={}", srv.base_url, project_id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"][0]["budget_used"], "0.00");
}

#[tokio::test]
async fn line_item_mutations_update_the_order_totals() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/purchase-orders", srv.base_url))
        .json(&json!({
            "vendor_id": VendorId::new().to_string(),
            "project_id": ProjectId::new().to_string(),
            "items": [
                { "description": "Cement", "quantity": 1, "unit_price": "100.00" },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap();
    assert_eq!(order["total_amount"], "107.00");

    let res = client
        .post(format!("{}/purchase-orders/{}/items", srv.base_url, order_id))
        .json(&json!({ "description": "Sand", "quantity": 1, "unit_price": "50.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let added: serde_json::Value = res.json().await.unwrap();
    let added_id = added["id"].as_str().unwrap();
    assert_eq!(added["total"], "50.00");

    let res = client
        .get(format!("{}/purchase-orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["subtotal"], "150.00");
    assert_eq!(body["total_amount"], "160.50");
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let res = client
        .put(format!("{}/purchase-orders/{}/items/{}", srv.base_url, order_id, added_id))
        .json(&json!({ "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["total"], "150.00");

    let res = client
        .delete(format!("{}/purchase-orders/{}/items/{}", srv.base_url, order_id, added_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/purchase-orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["subtotal"], "100.00");
    assert_eq!(body["total_amount"], "107.00");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn updating_a_payment_re_reconciles_the_invoice() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let invoice = create_invoice(&client, &srv.base_url, "1000.00", "sent").await;
    let id = invoice["id"].as_str().unwrap();

    let res = pay_invoice(&client, &srv.base_url, id, "1070.00").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let payment: serde_json::Value = res.json().await.unwrap();
    let payment_id = payment["id"].as_str().unwrap();

    let res = client
        .put(format!("{}/payments/{}", srv.base_url, payment_id))
        .json(&json!({ "amount": "500.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/invoices/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "sent");
    assert!(body["paid_date"].is_null());

    let res = client
        .put(format!("{}/payments/{}", srv.base_url, payment_id))
        .json(&json!({ "amount": "1070.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/invoices/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "paid");
}
