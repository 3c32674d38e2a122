use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ampere_core::{
    ClientId, DomainError, DomainResult, Entity, Money, ProjectId, QuotationId, gst_breakdown,
    impl_uuid_newtype,
};

use crate::payment::PaymentMethod;

const DEFAULT_TERM_DAYS: u64 = 30;

/// Client invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(Uuid);

impl_uuid_newtype!(InvoiceId, "InvoiceId");

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Overdue,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    /// Statuses that close an invoice to further payments.
    pub fn is_closed(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

/// Invoice fields supplied on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub client_id: ClientId,
    pub project_id: Option<ProjectId>,
    pub quotation_id: Option<QuotationId>,
    pub amount: Money,
    /// Explicit GST override; derived at 7% when absent.
    pub gst_amount: Option<Money>,
    pub status: Option<InvoiceStatus>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// Partial invoice update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePatch {
    pub client_id: Option<ClientId>,
    pub project_id: Option<ProjectId>,
    pub quotation_id: Option<QuotationId>,
    pub amount: Option<Money>,
    pub gst_amount: Option<Money>,
    pub status: Option<InvoiceStatus>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
}

/// Aggregate root: client Invoice.
///
/// Invariant: `total_amount` equals `amount + gst_amount` after every
/// mutation that touches either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    invoice_number: String,
    client_id: ClientId,
    project_id: Option<ProjectId>,
    quotation_id: Option<QuotationId>,
    amount: Money,
    gst_amount: Money,
    total_amount: Money,
    status: InvoiceStatus,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    paid_date: Option<NaiveDate>,
    payment_method: Option<PaymentMethod>,
    created_at: DateTime<Utc>,
}

impl Invoice {
    /// Build an invoice from draft input, deriving GST and the gross total.
    pub fn from_draft(
        draft: InvoiceDraft,
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
            id: InvoiceId::new(),
            invoice_number,
            client_id: draft.client_id,
            project_id: draft.project_id,
            quotation_id: draft.quotation_id,
            amount: draft.amount,
            gst_amount: Money::ZERO,
            total_amount: Money::ZERO,
            status: draft.status.unwrap_or(InvoiceStatus::Draft),
            issue_date,
            due_date,
            paid_date: None,
            payment_method: None,
            created_at: Utc::now(),
        };
        invoice.reprice(draft.gst_amount)?;
        invoice.validate_dates()?;
        Ok(invoice)
    }

    /// Merge a partial update.
    ///
    /// Changing `amount` without an explicit `gst_amount` in the same patch
    /// re-derives GST; the gross total is re-derived unconditionally.
    pub fn apply_patch(&mut self, patch: InvoicePatch) -> DomainResult<()> {
        if let Some(client_id) = patch.client_id {
            self.client_id = client_id;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(quotation_id) = patch.quotation_id {
            self.quotation_id = Some(quotation_id);
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
        self.status = InvoiceStatus::Paid;
        self.paid_date = Some(paid_date);
        self.payment_method = Some(method);
    }

    /// Revert a settled invoice to `sent`, clearing the settlement fields.
    pub fn reopen(&mut self) {
        self.status = InvoiceStatus::Sent;
        self.paid_date = None;
        self.payment_method = None;
    }

    /// Invariant: cannot pay a paid or cancelled invoice.
    pub fn is_payable(&self) -> bool {
        !self.status.is_closed()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_closed() && self.due_date < today
    }

    fn reprice(&mut self, gst_override: Option<Money>) -> DomainResult<()> {
        if !self.amount.is_positive() {
            return Err(DomainError::validation("invoice amount must be positive"));
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
            .ok_or_else(|| DomainError::invariant("invoice total overflows"))?;
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

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn quotation_id(&self) -> Option<QuotationId> {
        self.quotation_id
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

    pub fn status(&self) -> InvoiceStatus {
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

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn test_draft(amount_cents: i64) -> InvoiceDraft {
        InvoiceDraft {
            client_id: ClientId::new(),
            project_id: None,
            quotation_id: None,
            amount: Money::from_cents(amount_cents),
            gst_amount: None,
            status: None,
            issue_date: None,
            due_date: None,
        }
    }

    fn test_invoice(amount_cents: i64) -> Invoice {
        Invoice::from_draft(
            test_draft(amount_cents),
            "AMP-INV-202403-001".to_string(),
            test_today(),
        )
        .unwrap()
    }

    #[test]
    fn derives_gst_and_total_from_amount() {
        let invoice = test_invoice(100_000);
        assert_eq!(invoice.amount(), Money::from_cents(100_000));
        assert_eq!(invoice.gst_amount(), Money::from_cents(7_000));
        assert_eq!(invoice.total_amount(), Money::from_cents(107_000));
    }

    #[test]
    fn honors_explicit_gst_override() {
        let mut draft = test_draft(100_000);
        draft.gst_amount = Some(Money::ZERO);
        let invoice =
            Invoice::from_draft(draft, "AMP-INV-202403-001".to_string(), test_today()).unwrap();

        assert_eq!(invoice.gst_amount(), Money::ZERO);
        assert_eq!(invoice.total_amount(), Money::from_cents(100_000));
    }

    #[test]
    fn creation_applies_defaults() {
        let invoice = test_invoice(100_000);
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
        assert_eq!(invoice.issue_date(), test_today());
        assert_eq!(
            invoice.due_date(),
            NaiveDate::from_ymd_opt(2024, 4, 14).unwrap()
        );
        assert_eq!(invoice.paid_date(), None);
        assert_eq!(invoice.payment_method(), None);
    }

    #[test]
    fn rejects_non_positive_amount() {
        assert!(matches!(
            Invoice::from_draft(test_draft(0), "AMP-INV-202403-001".to_string(), test_today()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Invoice::from_draft(
                test_draft(-100),
                "AMP-INV-202403-001".to_string(),
                test_today()
            ),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn due_date_must_follow_issue_date() {
        let mut draft = test_draft(100_000);
        draft.issue_date = Some(test_today());
        draft.due_date = Some(test_today());
        assert!(matches!(
            Invoice::from_draft(draft, "AMP-INV-202403-001".to_string(), test_today()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn patching_amount_rederives_gst_and_total() {
        let mut invoice = test_invoice(100_000);
        invoice
            .apply_patch(InvoicePatch {
                amount: Some(Money::from_cents(200_000)),
                ..InvoicePatch::default()
            })
            .unwrap();

        assert_eq!(invoice.gst_amount(), Money::from_cents(14_000));
        assert_eq!(invoice.total_amount(), Money::from_cents(214_000));
    }

    #[test]
    fn patching_amount_with_explicit_gst_keeps_the_override() {
        let mut invoice = test_invoice(100_000);
        invoice
            .apply_patch(InvoicePatch {
                amount: Some(Money::from_cents(200_000)),
                gst_amount: Some(Money::from_cents(1)),
                ..InvoicePatch::default()
            })
            .unwrap();

        assert_eq!(invoice.gst_amount(), Money::from_cents(1));
        assert_eq!(invoice.total_amount(), Money::from_cents(200_001));
    }

    #[test]
    fn patching_gst_alone_rederives_the_total() {
        let mut invoice = test_invoice(100_000);
        invoice
            .apply_patch(InvoicePatch {
                gst_amount: Some(Money::from_cents(8_000)),
                ..InvoicePatch::default()
            })
            .unwrap();

        assert_eq!(invoice.amount(), Money::from_cents(100_000));
        assert_eq!(invoice.total_amount(), Money::from_cents(108_000));
    }

    #[test]
    fn settle_and_reopen_round_trip() {
        let mut invoice = test_invoice(100_000);
        invoice.settle(test_today(), PaymentMethod::Cheque);
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.paid_date(), Some(test_today()));
        assert_eq!(invoice.payment_method(), Some(PaymentMethod::Cheque));
        assert!(!invoice.is_payable());

        invoice.reopen();
        assert_eq!(invoice.status(), InvoiceStatus::Sent);
        assert_eq!(invoice.paid_date(), None);
        assert_eq!(invoice.payment_method(), None);
        assert!(invoice.is_payable());
    }

    #[test]
    fn overdue_requires_an_open_status_and_past_due_date() {
        let mut draft = test_draft(100_000);
        draft.issue_date = Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        draft.due_date = Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let mut invoice =
            Invoice::from_draft(draft, "AMP-INV-202401-001".to_string(), test_today()).unwrap();

        assert!(invoice.is_overdue(test_today()));
        assert!(!invoice.is_overdue(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));

        invoice.settle(test_today(), PaymentMethod::Cash);
        assert!(!invoice.is_overdue(test_today()));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(InvoiceStatus::Draft).unwrap(),
            serde_json::json!("draft")
        );
        assert_eq!(
            serde_json::to_value(InvoiceStatus::Cancelled).unwrap(),
            serde_json::json!("cancelled")
        );
    }
}
