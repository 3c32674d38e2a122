use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use ampere_finance::VendorInvoiceId;
use ampere_infra::Ledger;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(add_vendor_invoice).get(list_vendor_invoices))
        .route("/summary", get(vendor_invoice_summary))
        .route(
            "/:id",
            get(get_vendor_invoice).put(update_vendor_invoice).delete(delete_vendor_invoice),
        )
        .route(
            "/:id/payments",
            get(list_vendor_invoice_payments).post(add_vendor_invoice_payment),
        )
}

pub async fn add_vendor_invoice(
    Extension(ledger): Extension<Arc<Ledger>>,
    Json(body): Json<dto::AddVendorInvoiceRequest>,
) -> axum::response::Response {
    let draft = match dto::to_vendor_invoice_draft(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match ledger.add_vendor_invoice(draft) {
        Ok(invoice) => {
            (StatusCode::CREATED, Json(dto::vendor_invoice_to_json(&invoice))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Filters are applied one at a time: `overdue` wins over `status`, which
/// wins over `vendor_id`, which wins over `project_id`.
pub async fn list_vendor_invoices(
    Extension(ledger): Extension<Arc<Ledger>>,
    Query(query): Query<dto::VendorInvoiceListQuery>,
) -> axum::response::Response {
    let listed = if query.overdue.unwrap_or(false) {
        ledger.overdue_vendor_invoices()
    } else if let Some(raw) = query.status.as_deref() {
        let status = match errors::parse_vendor_invoice_status(raw) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        ledger.vendor_invoices_by_status(status)
    } else if let Some(raw) = query.vendor_id.as_deref() {
        let vendor_id = match dto::parse_id(raw, "invalid vendor_id") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        ledger.vendor_invoices_by_vendor(vendor_id)
    } else if let Some(raw) = query.project_id.as_deref() {
        let project_id = match dto::parse_id(raw, "invalid project_id") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        ledger.vendor_invoices_by_project(project_id)
    } else {
        ledger.vendor_invoices()
    };

    match listed {
        Ok(invoices) => {
            let items = invoices.iter().map(dto::vendor_invoice_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn vendor_invoice_summary(
    Extension(ledger): Extension<Arc<Ledger>>,
) -> axum::response::Response {
    let outstanding = match ledger.vendor_total_outstanding() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let paid = match ledger.vendor_total_paid() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "total_outstanding": outstanding,
            "total_paid": paid,
        })),
    )
        .into_response()
}

pub async fn get_vendor_invoice(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id: VendorInvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor invoice id")
        }
    };

    match ledger.vendor_invoice(invoice_id) {
        Ok(Some(invoice)) => {
            (StatusCode::OK, Json(dto::vendor_invoice_to_json(&invoice))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "vendor invoice not found"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_vendor_invoice(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateVendorInvoiceRequest>,
) -> axum::response::Response {
    let invoice_id: VendorInvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor invoice id")
        }
    };
    let patch = match dto::to_vendor_invoice_patch(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match ledger.update_vendor_invoice(invoice_id, patch) {
        Ok(invoice) => (StatusCode::OK, Json(dto::vendor_invoice_to_json(&invoice))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_vendor_invoice(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id: VendorInvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor invoice id")
        }
    };

    match ledger.delete_vendor_invoice(invoice_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_vendor_invoice_payments(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id: VendorInvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor invoice id")
        }
    };

    match ledger.vendor_invoice(invoice_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "vendor invoice not found")
        }
        Err(e) => return errors::domain_error_to_response(e),
    }

    match ledger.payments_for_vendor_invoice(invoice_id) {
        Ok(payments) => {
            let items = payments.iter().map(dto::payment_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn add_vendor_invoice_payment(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddPaymentRequest>,
) -> axum::response::Response {
    let invoice_id: VendorInvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor invoice id")
        }
    };
    let draft = match dto::to_payment_draft(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match ledger.add_vendor_payment(invoice_id, draft) {
        Ok(payment) => (StatusCode::CREATED, Json(dto::payment_to_json(&payment))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
