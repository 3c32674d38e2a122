use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ampere_core::{DomainError, DomainResult, Entity, Money, impl_uuid_newtype};

use crate::invoice::InvoiceId;
use crate::vendor_invoice::VendorInvoiceId;

/// Payment identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl_uuid_newtype!(PaymentId, "PaymentId");

/// How the money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Cheque,
    BankTransfer,
    CreditCard,
    Paynow,
}

impl PaymentMethod {
    /// Cheques and bank transfers must carry a traceable reference.
    pub fn requires_reference(self) -> bool {
        matches!(self, PaymentMethod::Cheque | PaymentMethod::BankTransfer)
    }
}

/// Which invoice store a payment settles against.
///
/// Client and vendor invoices live in separate id spaces; the discriminant
/// makes a payment unambiguous about which one it references.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "payer", content = "invoice_id", rename_all = "lowercase")]
pub enum PaymentTarget {
    Client(InvoiceId),
    Vendor(VendorInvoiceId),
}

impl PaymentTarget {
    pub fn is_client(self) -> bool {
        matches!(self, PaymentTarget::Client(_))
    }

    pub fn is_vendor(self) -> bool {
        matches!(self, PaymentTarget::Vendor(_))
    }
}

/// Payment fields supplied on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub amount: Money,
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub received_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Partial payment update; the target invoice is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPatch {
    pub amount: Option<Money>,
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub received_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A received payment settling part of one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    #[serde(flatten)]
    target: PaymentTarget,
    amount: Money,
    method: PaymentMethod,
    reference: Option<String>,
    received_date: NaiveDate,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl Payment {
    /// Build a payment from draft input.
    ///
    /// Defaults: method `bank_transfer`, received date today. The balance
    /// and date checks against the referenced invoice are the ledger's job;
    /// this validates only the payment's own fields.
    pub fn from_draft(
        target: PaymentTarget,
        draft: PaymentDraft,
        today: NaiveDate,
    ) -> DomainResult<Self> {
        let payment = Self {
            id: PaymentId::new(),
            target,
            amount: draft.amount,
            method: draft.method.unwrap_or(PaymentMethod::BankTransfer),
            reference: normalize_reference(draft.reference),
            received_date: draft.received_date.unwrap_or(today),
            notes: draft.notes,
            created_at: Utc::now(),
        };
        payment.validate()?;
        Ok(payment)
    }

    /// Merge a partial update, rechecking the reference requirement against
    /// the resulting method.
    pub fn apply_patch(&mut self, patch: PaymentPatch) -> DomainResult<()> {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(method) = patch.method {
            self.method = method;
        }
        if let Some(reference) = patch.reference {
            self.reference = normalize_reference(Some(reference));
        }
        if let Some(received_date) = patch.received_date {
            self.received_date = received_date;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        self.validate()
    }

    fn validate(&self) -> DomainResult<()> {
        if !self.amount.is_positive() {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        if self.method.requires_reference() && self.reference.is_none() {
            return Err(DomainError::validation(
                "payment reference is required for cheque and bank transfer payments",
            ));
        }
        Ok(())
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn target(&self) -> PaymentTarget {
        self.target
    }

    pub fn is_for_client_invoice(&self, invoice_id: InvoiceId) -> bool {
        self.target == PaymentTarget::Client(invoice_id)
    }

    pub fn is_for_vendor_invoice(&self, invoice_id: VendorInvoiceId) -> bool {
        self.target == PaymentTarget::Vendor(invoice_id)
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn received_date(&self) -> NaiveDate {
        self.received_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn normalize_reference(reference: Option<String>) -> Option<String> {
    reference
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn test_draft(amount_cents: i64) -> PaymentDraft {
        PaymentDraft {
            amount: Money::from_cents(amount_cents),
            method: None,
            reference: Some("TXN-77".to_string()),
            received_date: None,
            notes: None,
        }
    }

    fn test_target() -> PaymentTarget {
        PaymentTarget::Client(InvoiceId::new())
    }

    #[test]
    fn defaults_method_and_received_date() {
        let payment = Payment::from_draft(test_target(), test_draft(50_000), test_today()).unwrap();
        assert_eq!(payment.method(), PaymentMethod::BankTransfer);
        assert_eq!(payment.received_date(), test_today());
        assert_eq!(payment.reference(), Some("TXN-77"));
    }

    #[test]
    fn rejects_non_positive_amount() {
        assert!(matches!(
            Payment::from_draft(test_target(), test_draft(0), test_today()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Payment::from_draft(test_target(), test_draft(-500), test_today()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn reference_requirement_follows_the_method() {
        assert!(PaymentMethod::Cheque.requires_reference());
        assert!(PaymentMethod::BankTransfer.requires_reference());
        assert!(!PaymentMethod::Cash.requires_reference());
        assert!(!PaymentMethod::CreditCard.requires_reference());
        assert!(!PaymentMethod::Paynow.requires_reference());
    }

    #[test]
    fn cheque_without_reference_is_rejected() {
        let mut draft = test_draft(50_000);
        draft.method = Some(PaymentMethod::Cheque);
        draft.reference = None;
        assert!(matches!(
            Payment::from_draft(test_target(), draft, test_today()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn blank_reference_counts_as_missing() {
        let mut draft = test_draft(50_000);
        draft.reference = Some("   ".to_string());
        assert!(matches!(
            Payment::from_draft(test_target(), draft, test_today()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn cash_needs_no_reference() {
        let mut draft = test_draft(50_000);
        draft.method = Some(PaymentMethod::Cash);
        draft.reference = None;
        let payment = Payment::from_draft(test_target(), draft, test_today()).unwrap();
        assert_eq!(payment.reference(), None);
    }

    #[test]
    fn patch_rechecks_reference_against_the_new_method() {
        let mut draft = test_draft(50_000);
        draft.method = Some(PaymentMethod::Cash);
        draft.reference = None;
        let mut payment = Payment::from_draft(test_target(), draft, test_today()).unwrap();

        let result = payment.apply_patch(PaymentPatch {
            method: Some(PaymentMethod::Cheque),
            ..PaymentPatch::default()
        });
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn target_matching_is_kind_aware() {
        let invoice_id = InvoiceId::new();
        let payment = Payment::from_draft(
            PaymentTarget::Client(invoice_id),
            test_draft(50_000),
            test_today(),
        )
        .unwrap();

        assert!(payment.is_for_client_invoice(invoice_id));
        assert!(!payment.is_for_vendor_invoice(VendorInvoiceId::from_uuid(*invoice_id.as_uuid())));
    }

    #[test]
    fn json_carries_the_payer_discriminant() {
        let invoice_id = InvoiceId::new();
        let payment = Payment::from_draft(
            PaymentTarget::Client(invoice_id),
            test_draft(50_000),
            test_today(),
        )
        .unwrap();

        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["payer"], "client");
        assert_eq!(json["invoice_id"], invoice_id.to_string());
        assert_eq!(json["method"], "bank_transfer");
        assert_eq!(json["amount"], "500.00");
    }
}
