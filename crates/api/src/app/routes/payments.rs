use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use ampere_finance::PaymentId;
use ampere_infra::Ledger;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_payments))
        .route("/:id", get(get_payment).put(update_payment).delete(delete_payment))
}

pub async fn list_payments(Extension(ledger): Extension<Arc<Ledger>>) -> axum::response::Response {
    match ledger.payments() {
        Ok(payments) => {
            let items = payments.iter().map(dto::payment_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_payment(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let payment_id: PaymentId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid payment id"),
    };

    match ledger.payment(payment_id) {
        Ok(Some(payment)) => (StatusCode::OK, Json(dto::payment_to_json(&payment))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "payment not found"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_payment(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdatePaymentRequest>,
) -> axum::response::Response {
    let payment_id: PaymentId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid payment id"),
    };
    let patch = match dto::to_payment_patch(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match ledger.update_payment(payment_id, patch) {
        Ok(payment) => (StatusCode::OK, Json(dto::payment_to_json(&payment))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_payment(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let payment_id: PaymentId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid payment id"),
    };

    match ledger.delete_payment(payment_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
