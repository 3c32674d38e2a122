//! Finance domain module (invoices, vendor invoices, payments).
//!
//! This crate contains the billing records and their pricing/validation
//! rules, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage). Reconciliation across records lives in the ledger service.

pub mod invoice;
pub mod payment;
pub mod vendor_invoice;

pub use invoice::{Invoice, InvoiceDraft, InvoiceId, InvoicePatch, InvoiceStatus};
pub use payment::{
    Payment, PaymentDraft, PaymentId, PaymentMethod, PaymentPatch, PaymentTarget,
};
pub use vendor_invoice::{
    SourceDocument, VendorInvoice, VendorInvoiceDraft, VendorInvoiceId, VendorInvoicePatch,
    VendorInvoiceStatus,
};
