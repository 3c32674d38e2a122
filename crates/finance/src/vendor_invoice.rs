use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ampere_core::{
    DomainError, DomainResult, Entity, Money, ProjectId, VendorId, gst_breakdown,
    impl_uuid_newtype,
};
use ampere_purchasing::PurchaseOrderId;

use crate::payment::PaymentMethod;

const DEFAULT_TERM_DAYS: u64 = 30;

/// Vendor invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorInvoiceId(Uuid);

impl_uuid_newtype!(VendorInvoiceId, "VendorInvoiceId");

/// Vendor invoice status lifecycle (intake through settlement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorInvoiceStatus {
    Draft,
    Received,
    Processing,
    Processed,
    Approved,
    Paid,
    Overdue,
    Cancelled,
}

impl VendorInvoiceStatus {
    /// Statuses that close a vendor invoice to further payments.
    pub fn is_closed(self) -> bool {
        matches!(self, VendorInvoiceStatus::Paid | VendorInvoiceStatus::Cancelled)
    }
}

/// Uploaded document the invoice was captured from, carried verbatim.
///
/// `extracted` is whatever the capture pipeline produced; nothing in this
/// workspace interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub file_name: String,
    pub extracted: serde_json::Value,
}

/// Vendor invoice fields supplied on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorInvoiceDraft {
    pub vendor_id: VendorId,
    pub project_id: Option<ProjectId>,
    pub purchase_order_id: Option<PurchaseOrderId>,
    pub amount: Money,
    /// Explicit GST override; derived at 7% when absent.
    pub gst_amount: Option<Money>,
    pub status: Option<VendorInvoiceStatus>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub source_document: Option<SourceDocument>,
}

/// Partial vendor invoice update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorInvoicePatch {
    pub vendor_id: Option<VendorId>,
    pub project_id: Option<ProjectId>,
    pub purchase_order_id: Option<PurchaseOrderId>,
    pub amount: Option<Money>,
    pub gst_amount: Option<Money>,
    pub status: Option<VendorInvoiceStatus>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub source_document: Option<SourceDocument>,
}

/// Aggregate root: VendorInvoice (money owed to a vendor).
///
/// Invariant: `total_amount` equals `amount + gst_amount` after every
/// mutation that touches either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorInvoice {
    id: VendorInvoiceId,
    invoice_number: String,
    vendor_id: VendorId,
    project_id: Option<ProjectId>,
    purchase_order_id: Option<PurchaseOrderId>,
    amount: Money,
    gst_amount: Money,
    total_amount: Money,
    status: VendorInvoiceStatus,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    paid_date: Option<NaiveDate>,
    payment_method: Option<PaymentMethod>,
    source_document: Option<SourceDocument>,
    created_at: DateTime<Utc>,
}

impl VendorInvoice {
    /// Build a vendor invoice from draft input, deriving GST and the gross
    /// total.
    pub fn from_draft(
        draft: VendorInvoiceDraft,
        invoice_number: String,
        today: NaiveDate,
    ) -> DomainResult<Self> {
        let issue_date = draft.issue_date.unwrap_or(today);
        let due_date = match draft.due_date {
            Some(date) => date,
            None => issue_date
                .checked_add_days(Days::new(DEFAULT_TERM_DAYS))
                .ok_or_else(|| DomainError::invariant("due date out of range"))?,
        };

        let mut invoice = Self {
            id: VendorInvoiceId::new(),
            invoice_number,
            vendor_id: draft.vendor_id,
            project_id: draft.project_id,
            purchase_order_id: draft.purchase_order_id,
            amount: draft.amount,
            gst_amount: Money::ZERO,
            total_amount: Money::ZERO,
            status: draft.status.unwrap_or(VendorInvoiceStatus::Received),
            issue_date,
            due_date,
            paid_date: None,
            payment_method: None,
            source_document: draft.source_document,
            created_at: Utc::now(),
        };
        invoice.reprice(draft.gst_amount)?;
        invoice.validate_dates()?;
        Ok(invoice)
    }

    /// Merge a partial update; same GST re-derivation rules as the client
    /// invoice.
    pub fn apply_patch(&mut self, patch: VendorInvoicePatch) -> DomainResult<()> {
        if let Some(vendor_id) = patch.vendor_id {
            self.vendor_id = vendor_id;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(purchase_order_id) = patch.purchase_order_id {
            self.purchase_order_id = Some(purchase_order_id);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(issue_date) = patch.issue_date {
            self.issue_date = issue_date;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(paid_date) = patch.paid_date {
            self.paid_date = Some(paid_date);
        }
        if let Some(payment_method) = patch.payment_method {
            self.payment_method = Some(payment_method);
        }
        if let Some(source_document) = patch.source_document {
            self.source_document = Some(source_document);
        }

        let gst_override = match (patch.amount, patch.gst_amount) {
            (_, Some(gst)) => Some(gst),
            (Some(_), None) => None,
            (None, None) => Some(self.gst_amount),
        };
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        self.reprice(gst_override)?;
        self.validate_dates()
    }

    /// Mark paid, recording when and how the balance was settled.
    pub fn settle(&mut self, paid_date: NaiveDate, method: PaymentMethod) {
        self.status = VendorInvoiceStatus::Paid;
        self.paid_date = Some(paid_date);
        self.payment_method = Some(method);
    }

    /// Revert a settled vendor invoice to `approved`, clearing the
    /// settlement fields.
    pub fn reopen(&mut self) {
        self.status = VendorInvoiceStatus::Approved;
        self.paid_date = None;
        self.payment_method = None;
    }

    /// Invariant: cannot pay a paid or cancelled vendor invoice.
    pub fn is_payable(&self) -> bool {
        !self.status.is_closed()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_closed() && self.due_date < today
    }

    fn reprice(&mut self, gst_override: Option<Money>) -> DomainResult<()> {
        if !self.amount.is_positive() {
            return Err(DomainError::validation(
                "vendor invoice amount must be positive",
            ));
        }
        let gst_amount = match gst_override {
            Some(gst) => {
                if gst.is_negative() {
                    return Err(DomainError::validation("gst amount cannot be negative"));
                }
                gst
            }
            None => gst_breakdown(self.amount)?.gst_amount,
        };
        self.gst_amount = gst_amount;
        self.total_amount = self
            .amount
            .checked_add(gst_amount)
            .ok_or_else(|| DomainError::invariant("vendor invoice total overflows"))?;
        Ok(())
    }

    fn validate_dates(&self) -> DomainResult<()> {
        if self.due_date <= self.issue_date {
            return Err(DomainError::validation(
                "due date must be after the issue date",
            ));
        }
        Ok(())
    }

    pub fn id_typed(&self) -> VendorInvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn purchase_order_id(&self) -> Option<PurchaseOrderId> {
        self.purchase_order_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn gst_amount(&self) -> Money {
        self.gst_amount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> VendorInvoiceStatus {
        self.status
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn paid_date(&self) -> Option<NaiveDate> {
        self.paid_date
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn source_document(&self) -> Option<&SourceDocument> {
        self.source_document.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for VendorInvoice {
    type Id = VendorInvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
