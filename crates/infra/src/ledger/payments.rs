//! Payment operations and reconciliation.
//!
//! Every payment mutation re-derives the referenced invoice's settlement
//! state from the payment sum: reaching the gross total settles the
//! invoice, dropping below it reverts a settled invoice to its open status.

use chrono::NaiveDate;

use ampere_core::{DomainError, DomainResult, Money};
use ampere_finance::{
    InvoiceId, InvoiceStatus, Payment, PaymentDraft, PaymentId, PaymentPatch, PaymentTarget,
    VendorInvoiceId, VendorInvoiceStatus,
};

use super::{Ledger, client_paid_sum, vendor_paid_sum};
use crate::snapshot::LedgerSnapshot;

impl Ledger {
    /// Record a payment against a client invoice.
    ///
    /// Rejected when the invoice is closed, the received date falls outside
    /// the issue-date-to-today window, or the amount exceeds the remaining
    /// balance. Reaching the gross total settles the invoice with this
    /// payment's date and method.
    pub fn add_payment(&self, invoice_id: InvoiceId, draft: PaymentDraft) -> DomainResult<Payment> {
        let mut state = self.write()?;
        let today = Self::today();
        let index = state
            .invoices
            .iter()
            .position(|i| i.id_typed() == invoice_id)
            .ok_or_else(DomainError::not_found)?;

        let payment = Payment::from_draft(PaymentTarget::Client(invoice_id), draft, today)?;
        let invoice = &state.invoices[index];
        if !invoice.is_payable() {
            return Err(DomainError::invariant(
                "cannot pay a paid or cancelled invoice",
            ));
        }
        let total = invoice.total_amount();
        let issue_date = invoice.issue_date();
        let already_paid = client_paid_sum(&state, invoice_id)?;
        validate_payment_window(&payment, total, already_paid, issue_date, today)?;

        state.payments.push(payment.clone());
        reconcile_client(&mut state, index, Some(&payment))?;
        self.persist(&state);
        Ok(payment)
    }

    /// Record a payment against a vendor invoice.
    ///
    /// Same rules as [`Ledger::add_payment`], applied to the vendor side.
    pub fn add_vendor_payment(
        &self,
        invoice_id: VendorInvoiceId,
        draft: PaymentDraft,
    ) -> DomainResult<Payment> {
        let mut state = self.write()?;
        let today = Self::today();
        let index = state
            .vendor_invoices
            .iter()
            .position(|i| i.id_typed() == invoice_id)
            .ok_or_else(DomainError::not_found)?;

        let payment = Payment::from_draft(PaymentTarget::Vendor(invoice_id), draft, today)?;
        let invoice = &state.vendor_invoices[index];
        if !invoice.is_payable() {
            return Err(DomainError::invariant(
                "cannot pay a paid or cancelled vendor invoice",
            ));
        }
        let total = invoice.total_amount();
        let issue_date = invoice.issue_date();
        let already_paid = vendor_paid_sum(&state, invoice_id)?;
        validate_payment_window(&payment, total, already_paid, issue_date, today)?;

        state.payments.push(payment.clone());
        reconcile_vendor(&mut state, index, Some(&payment))?;
        self.persist(&state);
        Ok(payment)
    }

    /// Merge a partial update into a payment, then re-reconcile its invoice
    /// in both directions.
    ///
    /// Shrinking the amount below the invoice total reverts a settled
    /// invoice to its open status; growing it to the total settles. The
    /// remaining-balance check excludes this payment's own previous amount.
    pub fn update_payment(
        &self,
        payment_id: PaymentId,
        patch: PaymentPatch,
    ) -> DomainResult<Payment> {
        let mut state = self.write()?;
        let today = Self::today();
        let payment_index = state
            .payments
            .iter()
            .position(|p| p.id_typed() == payment_id)
            .ok_or_else(DomainError::not_found)?;

        let mut updated = state.payments[payment_index].clone();
        updated.apply_patch(patch)?;

        match updated.target() {
            PaymentTarget::Client(invoice_id) => {
                let invoice_index = state
                    .invoices
                    .iter()
                    .position(|i| i.id_typed() == invoice_id)
                    .ok_or_else(DomainError::not_found)?;
                let invoice = &state.invoices[invoice_index];
                let total = invoice.total_amount();
                let issue_date = invoice.issue_date();
                let others = client_paid_sum_excluding(&state, invoice_id, payment_id)?;
                validate_payment_window(&updated, total, others, issue_date, today)?;

                state.payments[payment_index] = updated.clone();
                reconcile_client(&mut state, invoice_index, Some(&updated))?;
            }
            PaymentTarget::Vendor(invoice_id) => {
                let invoice_index = state
                    .vendor_invoices
                    .iter()
                    .position(|i| i.id_typed() == invoice_id)
                    .ok_or_else(DomainError::not_found)?;
                let invoice = &state.vendor_invoices[invoice_index];
                let total = invoice.total_amount();
                let issue_date = invoice.issue_date();
                let others = vendor_paid_sum_excluding(&state, invoice_id, payment_id)?;
                validate_payment_window(&updated, total, others, issue_date, today)?;

                state.payments[payment_index] = updated.clone();
                reconcile_vendor(&mut state, invoice_index, Some(&updated))?;
            }
        }
        self.persist(&state);
        Ok(updated)
    }

    /// Delete a payment, reverting its invoice to an open status when the
    /// remaining payments no longer cover the total.
    pub fn delete_payment(&self, payment_id: PaymentId) -> DomainResult<()> {
        let mut state = self.write()?;
        let index = state
            .payments
            .iter()
            .position(|p| p.id_typed() == payment_id)
            .ok_or_else(DomainError::not_found)?;

        let removed = state.payments.remove(index);
        match removed.target() {
            PaymentTarget::Client(invoice_id) => {
                if let Some(invoice_index) = state
                    .invoices
                    .iter()
                    .position(|i| i.id_typed() == invoice_id)
                {
                    reconcile_client(&mut state, invoice_index, None)?;
                }
            }
            PaymentTarget::Vendor(invoice_id) => {
                if let Some(invoice_index) = state
                    .vendor_invoices
                    .iter()
                    .position(|i| i.id_typed() == invoice_id)
                {
                    reconcile_vendor(&mut state, invoice_index, None)?;
                }
            }
        }
        self.persist(&state);
        Ok(())
    }

    pub fn payment(&self, payment_id: PaymentId) -> DomainResult<Option<Payment>> {
        let state = self.read()?;
        Ok(state
            .payments
            .iter()
            .find(|p| p.id_typed() == payment_id)
            .cloned())
    }

    pub fn payments(&self) -> DomainResult<Vec<Payment>> {
        Ok(self.read()?.payments.clone())
    }

    pub fn payments_for_invoice(&self, invoice_id: InvoiceId) -> DomainResult<Vec<Payment>> {
        let state = self.read()?;
        Ok(state
            .payments
            .iter()
            .filter(|p| p.is_for_client_invoice(invoice_id))
            .cloned()
            .collect())
    }

    pub fn payments_for_vendor_invoice(
        &self,
        invoice_id: VendorInvoiceId,
    ) -> DomainResult<Vec<Payment>> {
        let state = self.read()?;
        Ok(state
            .payments
            .iter()
            .filter(|p| p.is_for_vendor_invoice(invoice_id))
            .cloned()
            .collect())
    }
}

/// Checks the received-date window and the remaining balance.
fn validate_payment_window(
    payment: &Payment,
    invoice_total: Money,
    already_paid: Money,
    issue_date: NaiveDate,
    today: NaiveDate,
) -> DomainResult<()> {
    if payment.received_date() < issue_date {
        return Err(DomainError::validation(
            "received date cannot precede the invoice issue date",
        ));
    }
    if payment.received_date() > today {
        return Err(DomainError::validation(
            "received date cannot be in the future",
        ));
    }
    let remaining = invoice_total
        .checked_sub(already_paid)
        .ok_or_else(|| DomainError::invariant("remaining balance overflows"))?;
    if payment.amount() > remaining {
        return Err(DomainError::validation(format!(
            "payment of {} exceeds the remaining balance of {}",
            payment.amount(),
            remaining
        )));
    }
    Ok(())
}

/// Re-derive one client invoice's settlement state from its payment sum.
///
/// `settled_by` supplies the paid date and method when the sum reaches the
/// total; it is `None` on deletion, where only the revert direction can
/// fire.
fn reconcile_client(
    state: &mut LedgerSnapshot,
    invoice_index: usize,
    settled_by: Option<&Payment>,
) -> DomainResult<()> {
    let invoice_id = state.invoices[invoice_index].id_typed();
    let paid = client_paid_sum(state, invoice_id)?;
    let invoice = &mut state.invoices[invoice_index];

    let covered = paid >= invoice.total_amount();
    if covered && invoice.status() != InvoiceStatus::Paid {
        if let Some(payment) = settled_by {
            invoice.settle(payment.received_date(), payment.method());
        }
    } else if !covered && invoice.status() == InvoiceStatus::Paid {
        invoice.reopen();
    }
    Ok(())
}

/// Vendor-side counterpart of [`reconcile_client`].
fn reconcile_vendor(
    state: &mut LedgerSnapshot,
    invoice_index: usize,
    settled_by: Option<&Payment>,
) -> DomainResult<()> {
    let invoice_id = state.vendor_invoices[invoice_index].id_typed();
    let paid = vendor_paid_sum(state, invoice_id)?;
    let invoice = &mut state.vendor_invoices[invoice_index];

    let covered = paid >= invoice.total_amount();
    if covered && invoice.status() != VendorInvoiceStatus::Paid {
        if let Some(payment) = settled_by {
            invoice.settle(payment.received_date(), payment.method());
        }
    } else if !covered && invoice.status() == VendorInvoiceStatus::Paid {
        invoice.reopen();
    }
    Ok(())
}

fn client_paid_sum_excluding(
    state: &LedgerSnapshot,
    invoice_id: InvoiceId,
    excluded: PaymentId,
) -> DomainResult<Money> {
    let mut sum = Money::ZERO;
    for payment in state
        .payments
        .iter()
        .filter(|p| p.is_for_client_invoice(invoice_id) && p.id_typed() != excluded)
    {
        sum = sum
            .checked_add(payment.amount())
            .ok_or_else(|| DomainError::invariant("payment sum overflows"))?;
    }
    Ok(sum)
}

fn vendor_paid_sum_excluding(
    state: &LedgerSnapshot,
    invoice_id: VendorInvoiceId,
    excluded: PaymentId,
) -> DomainResult<Money> {
    let mut sum = Money::ZERO;
    for payment in state
        .payments
        .iter()
        .filter(|p| p.is_for_vendor_invoice(invoice_id) && p.id_typed() != excluded)
    {
        sum = sum
            .checked_add(payment.amount())
            .ok_or_else(|| DomainError::invariant("payment sum overflows"))?;
    }
    Ok(sum)
}
