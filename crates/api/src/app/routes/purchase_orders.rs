use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use ampere_infra::Ledger;
use ampere_purchasing::{LineItemId, PurchaseOrderId};

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(add_purchase_order).get(list_purchase_orders))
        .route(
            "/:id",
            get(get_purchase_order).put(update_purchase_order).delete(delete_purchase_order),
        )
        .route("/:id/items", post(add_item))
        .route("/:id/items/:item_id", put(update_item).delete(remove_item))
}

pub async fn add_purchase_order(
    Extension(ledger): Extension<Arc<Ledger>>,
    Json(body): Json<dto::AddPurchaseOrderRequest>,
) -> axum::response::Response {
    let draft = match dto::to_purchase_order_draft(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match ledger.add_purchase_order(draft) {
        Ok(order) => {
            (StatusCode::CREATED, Json(dto::purchase_order_to_json(&order))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Filters are applied one at a time: `status` wins over `vendor_id`, which
/// wins over `project_id`.
pub async fn list_purchase_orders(
    Extension(ledger): Extension<Arc<Ledger>>,
    Query(query): Query<dto::PurchaseOrderListQuery>,
) -> axum::response::Response {
    let listed = if let Some(raw) = query.status.as_deref() {
        let status = match errors::parse_purchase_order_status(raw) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        ledger.purchase_orders_by_status(status)
    } else if let Some(raw) = query.vendor_id.as_deref() {
        let vendor_id = match dto::parse_id(raw, "invalid vendor_id") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        ledger.purchase_orders_by_vendor(vendor_id)
    } else if let Some(raw) = query.project_id.as_deref() {
        let project_id = match dto::parse_id(raw, "invalid project_id") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        ledger.purchase_orders_by_project(project_id)
    } else {
        ledger.purchase_orders()
    };

    match listed {
        Ok(orders) => {
            let items = orders.iter().map(dto::purchase_order_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_purchase_order(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: PurchaseOrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid purchase order id")
        }
    };

    match ledger.purchase_order(order_id) {
        Ok(Some(order)) => (StatusCode::OK, Json(dto::purchase_order_to_json(&order))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "purchase order not found"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_purchase_order(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdatePurchaseOrderRequest>,
) -> axum::response::Response {
    let order_id: PurchaseOrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid purchase order id")
        }
    };
    let patch = match dto::to_purchase_order_patch(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match ledger.update_purchase_order(order_id, patch) {
        Ok(order) => (StatusCode::OK, Json(dto::purchase_order_to_json(&order))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_purchase_order(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: PurchaseOrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid purchase order id")
        }
    };

    match ledger.delete_purchase_order(order_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn add_item(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path(id): Path<String>,
    Json(body): Json<dto::LineItemRequest>,
) -> axum::response::Response {
    let order_id: PurchaseOrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid purchase order id")
        }
    };

    match ledger.add_po_item(order_id, dto::to_line_item_draft(body)) {
        Ok(item) => (StatusCode::CREATED, Json(dto::line_item_to_json(&item))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(body): Json<dto::UpdateLineItemRequest>,
) -> axum::response::Response {
    let order_id: PurchaseOrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid purchase order id")
        }
    };
    let item_id: LineItemId = match item_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid line item id"),
    };

    match ledger.update_po_item(order_id, item_id, dto::to_line_item_patch(body)) {
        Ok(item) => (StatusCode::OK, Json(dto::line_item_to_json(&item))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_item(
    Extension(ledger): Extension<Arc<Ledger>>,
    Path((id, item_id)): Path<(String, String)>,
) -> axum::response::Response {
    let order_id: PurchaseOrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid purchase order id")
        }
    };
    let item_id: LineItemId = match item_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid line item id"),
    };

    match ledger.remove_po_item(order_id, item_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
