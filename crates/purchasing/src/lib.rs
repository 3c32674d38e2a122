//! Purchasing domain module (purchase orders, vendor budget assignments).
//!
//! This crate contains business rules for purchase orders, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod assignment;
pub mod order;

pub use assignment::VendorAssignment;
pub use order::{
    LineItem, LineItemDraft, LineItemId, LineItemPatch, PurchaseOrder, PurchaseOrderDraft,
    PurchaseOrderId, PurchaseOrderPatch, PurchaseOrderStatus,
};
