use axum::Router;

pub mod assignments;
pub mod invoices;
pub mod payments;
pub mod purchase_orders;
pub mod system;
pub mod vendor_invoices;

/// Router for all ledger endpoints (health is mounted separately).
pub fn router() -> Router {
    Router::new()
        .nest("/invoices", invoices::router())
        .nest("/vendor-invoices", vendor_invoices::router())
        .nest("/payments", payments::router())
        .nest("/purchase-orders", purchase_orders::router())
        .nest("/assignments", assignments::router())
}
