//! Vendor invoice operations.

use ampere_core::{DomainError, DomainResult, Money, ProjectId, VendorId, docnum};
use ampere_finance::{
    VendorInvoice, VendorInvoiceDraft, VendorInvoiceId, VendorInvoicePatch, VendorInvoiceStatus,
};

use super::{Ledger, vendor_paid_sum};

impl Ledger {
    /// Record a vendor invoice, assigning the next `AMP-VI` number for the
    /// current month.
    pub fn add_vendor_invoice(&self, draft: VendorInvoiceDraft) -> DomainResult<VendorInvoice> {
        let mut state = self.write()?;
        let today = Self::today();
        let number = docnum::next_in_series(
            docnum::VENDOR_INVOICE_PREFIX,
            today,
            state.vendor_invoices.iter().map(|i| i.invoice_number()),
        );
        let invoice = VendorInvoice::from_draft(draft, number, today)?;
        state.vendor_invoices.push(invoice.clone());
        self.persist(&state);
        Ok(invoice)
    }

    pub fn vendor_invoice(
        &self,
        invoice_id: VendorInvoiceId,
    ) -> DomainResult<Option<VendorInvoice>> {
        let state = self.read()?;
        Ok(state
            .vendor_invoices
            .iter()
            .find(|i| i.id_typed() == invoice_id)
            .cloned())
    }

    pub fn vendor_invoices(&self) -> DomainResult<Vec<VendorInvoice>> {
        Ok(self.read()?.vendor_invoices.clone())
    }

    /// Merge a partial update into an existing vendor invoice.
    ///
    /// The stored invoice is untouched when the patch fails validation.
    pub fn update_vendor_invoice(
        &self,
        invoice_id: VendorInvoiceId,
        patch: VendorInvoicePatch,
    ) -> DomainResult<VendorInvoice> {
        let mut state = self.write()?;
        let index = state
            .vendor_invoices
            .iter()
            .position(|i| i.id_typed() == invoice_id)
            .ok_or_else(DomainError::not_found)?;

        let mut updated = state.vendor_invoices[index].clone();
        updated.apply_patch(patch)?;
        state.vendor_invoices[index] = updated.clone();
        self.persist(&state);
        Ok(updated)
    }

    /// Delete a vendor invoice, cascading to the payments that reference it.
    pub fn delete_vendor_invoice(&self, invoice_id: VendorInvoiceId) -> DomainResult<()> {
        let mut state = self.write()?;
        let index = state
            .vendor_invoices
            .iter()
            .position(|i| i.id_typed() == invoice_id)
            .ok_or_else(DomainError::not_found)?;

        state.vendor_invoices.remove(index);
        state
            .payments
            .retain(|p| !p.is_for_vendor_invoice(invoice_id));
        self.persist(&state);
        Ok(())
    }

    pub fn vendor_invoices_by_vendor(
        &self,
        vendor_id: VendorId,
    ) -> DomainResult<Vec<VendorInvoice>> {
        let state = self.read()?;
        Ok(state
            .vendor_invoices
            .iter()
            .filter(|i| i.vendor_id() == vendor_id)
            .cloned()
            .collect())
    }

    pub fn vendor_invoices_by_project(
        &self,
        project_id: ProjectId,
    ) -> DomainResult<Vec<VendorInvoice>> {
        let state = self.read()?;
        Ok(state
            .vendor_invoices
            .iter()
            .filter(|i| i.project_id() == Some(project_id))
            .cloned()
            .collect())
    }

    pub fn vendor_invoices_by_status(
        &self,
        status: VendorInvoiceStatus,
    ) -> DomainResult<Vec<VendorInvoice>> {
        let state = self.read()?;
        Ok(state
            .vendor_invoices
            .iter()
            .filter(|i| i.status() == status)
            .cloned()
            .collect())
    }

    /// Vendor invoices past their due date that are still open.
    pub fn overdue_vendor_invoices(&self) -> DomainResult<Vec<VendorInvoice>> {
        let state = self.read()?;
        let today = Self::today();
        Ok(state
            .vendor_invoices
            .iter()
            .filter(|i| i.is_overdue(today))
            .cloned()
            .collect())
    }

    /// Vendor invoices that can still accept a payment: open status and an
    /// outstanding balance above zero.
    pub fn open_vendor_invoices(&self) -> DomainResult<Vec<VendorInvoice>> {
        let state = self.read()?;
        let mut open = Vec::new();
        for invoice in state.vendor_invoices.iter().filter(|i| i.is_payable()) {
            let paid = vendor_paid_sum(&state, invoice.id_typed())?;
            if paid < invoice.total_amount() {
                open.push(invoice.clone());
            }
        }
        Ok(open)
    }

    /// Gross total of all vendor invoices that are neither paid nor
    /// cancelled.
    pub fn vendor_total_outstanding(&self) -> DomainResult<Money> {
        let state = self.read()?;
        let mut sum = Money::ZERO;
        for invoice in state
            .vendor_invoices
            .iter()
            .filter(|i| !i.status().is_closed())
        {
            sum = sum
                .checked_add(invoice.total_amount())
                .ok_or_else(|| DomainError::invariant("outstanding total overflows"))?;
        }
        Ok(sum)
    }

    /// Sum of all payments made to vendors.
    pub fn vendor_total_paid(&self) -> DomainResult<Money> {
        let state = self.read()?;
        let mut sum = Money::ZERO;
        for payment in state.payments.iter().filter(|p| p.target().is_vendor()) {
            sum = sum
                .checked_add(payment.amount())
                .ok_or_else(|| DomainError::invariant("payment sum overflows"))?;
        }
        Ok(sum)
    }
}
