use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use ampere_core::{ProjectId, VendorId};
use ampere_infra::Ledger;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(assign_vendor).get(list_assignments))
}

/// Upserts the (project, vendor) assignment; reassigning keeps accumulated
/// budget usage.
pub async fn assign_vendor(
    Extension(ledger): Extension<Arc<Ledger>>,
    Json(body): Json<dto::AssignVendorRequest>,
) -> axum::response::Response {
    let project_id: ProjectId = match dto::parse_id(&body.project_id, "invalid project_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let vendor_id: VendorId = match dto::parse_id(&body.vendor_id, "invalid vendor_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match ledger.assign_vendor(project_id, vendor_id, body.budget_allocated) {
        Ok(assignment) => {
            (StatusCode::CREATED, Json(dto::assignment_to_json(&assignment))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_assignments(
    Extension(ledger): Extension<Arc<Ledger>>,
    Query(query): Query<dto::AssignmentListQuery>,
) -> axum::response::Response {
    let listed = if let Some(raw) = query.project_id.as_deref() {
        let project_id = match dto::parse_id(raw, "invalid project_id") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        ledger.assignments_by_project(project_id)
    } else {
        ledger.assignments()
    };

    match listed {
        Ok(assignments) => {
            let items = assignments.iter().map(dto::assignment_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
