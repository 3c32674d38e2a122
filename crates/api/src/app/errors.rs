use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use ampere_core::DomainError;
use ampere_finance::{InvoiceStatus, PaymentMethod, VendorInvoiceStatus};
use ampere_purchasing::PurchaseOrderStatus;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_invoice_status(s: &str) -> Result<InvoiceStatus, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "draft" => Ok(InvoiceStatus::Draft),
        "sent" => Ok(InvoiceStatus::Sent),
        "overdue" => Ok(InvoiceStatus::Overdue),
        "paid" => Ok(InvoiceStatus::Paid),
        "cancelled" => Ok(InvoiceStatus::Cancelled),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_status",
            "status must be one of: draft, sent, overdue, paid, cancelled",
        )),
    }
}

pub fn parse_vendor_invoice_status(s: &str) -> Result<VendorInvoiceStatus, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "draft" => Ok(VendorInvoiceStatus::Draft),
        "received" => Ok(VendorInvoiceStatus::Received),
        "processing" => Ok(VendorInvoiceStatus::Processing),
        "processed" => Ok(VendorInvoiceStatus::Processed),
        "approved" => Ok(VendorInvoiceStatus::Approved),
        "paid" => Ok(VendorInvoiceStatus::Paid),
        "overdue" => Ok(VendorInvoiceStatus::Overdue),
        "cancelled" => Ok(VendorInvoiceStatus::Cancelled),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_status",
            "status must be one of: draft, received, processing, processed, approved, paid, overdue, cancelled",
        )),
    }
}

pub fn parse_purchase_order_status(s: &str) -> Result<PurchaseOrderStatus, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "draft" => Ok(PurchaseOrderStatus::Draft),
        "pending_approval" => Ok(PurchaseOrderStatus::PendingApproval),
        "approved" => Ok(PurchaseOrderStatus::Approved),
        "sent" => Ok(PurchaseOrderStatus::Sent),
        "partially_received" => Ok(PurchaseOrderStatus::PartiallyReceived),
        "received" => Ok(PurchaseOrderStatus::Received),
        "cancelled" => Ok(PurchaseOrderStatus::Cancelled),
        "closed" => Ok(PurchaseOrderStatus::Closed),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_status",
            "status must be one of: draft, pending_approval, approved, sent, partially_received, received, cancelled, closed",
        )),
    }
}

pub fn parse_payment_method(s: &str) -> Result<PaymentMethod, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "cash" => Ok(PaymentMethod::Cash),
        "cheque" => Ok(PaymentMethod::Cheque),
        "bank_transfer" => Ok(PaymentMethod::BankTransfer),
        "credit_card" => Ok(PaymentMethod::CreditCard),
        "paynow" => Ok(PaymentMethod::Paynow),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_payment_method",
            "method must be one of: cash, cheque, bank_transfer, credit_card, paynow",
        )),
    }
}
