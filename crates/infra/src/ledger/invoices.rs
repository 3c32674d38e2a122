//! Client invoice operations.

use ampere_core::{ClientId, DomainError, DomainResult, Money, ProjectId, docnum};
use ampere_finance::{Invoice, InvoiceDraft, InvoiceId, InvoicePatch, InvoiceStatus};

use super::{Ledger, client_paid_sum};

impl Ledger {
    /// Create a client invoice, assigning the next `AMP-INV` number for the
    /// current month.
    pub fn add_invoice(&self, draft: InvoiceDraft) -> DomainResult<Invoice> {
        let mut state = self.write()?;
        let today = Self::today();
        let number = docnum::next_in_series(
            docnum::INVOICE_PREFIX,
            today,
            state.invoices.iter().map(|i| i.invoice_number()),
        );
        let invoice = Invoice::from_draft(draft, number, today)?;
        state.invoices.push(invoice.clone());
        self.persist(&state);
        Ok(invoice)
    }

    pub fn invoice(&self, invoice_id: InvoiceId) -> DomainResult<Option<Invoice>> {
        let state = self.read()?;
        Ok(state
            .invoices
            .iter()
            .find(|i| i.id_typed() == invoice_id)
            .cloned())
    }

    pub fn invoices(&self) -> DomainResult<Vec<Invoice>> {
        Ok(self.read()?.invoices.clone())
    }

    /// Merge a partial update into an existing invoice.
    ///
    /// The stored invoice is untouched when the patch fails validation.
    pub fn update_invoice(
        &self,
        invoice_id: InvoiceId,
        patch: InvoicePatch,
    ) -> DomainResult<Invoice> {
        let mut state = self.write()?;
        let index = state
            .invoices
            .iter()
            .position(|i| i.id_typed() == invoice_id)
            .ok_or_else(DomainError::not_found)?;

        let mut updated = state.invoices[index].clone();
        updated.apply_patch(patch)?;
        state.invoices[index] = updated.clone();
        self.persist(&state);
        Ok(updated)
    }

    /// Delete an invoice, cascading to the payments that reference it.
    pub fn delete_invoice(&self, invoice_id: InvoiceId) -> DomainResult<()> {
        let mut state = self.write()?;
        let index = state
            .invoices
            .iter()
            .position(|i| i.id_typed() == invoice_id)
            .ok_or_else(DomainError::not_found)?;

        state.invoices.remove(index);
        state.payments.retain(|p| !p.is_for_client_invoice(invoice_id));
        self.persist(&state);
        Ok(())
    }

    pub fn invoices_by_client(&self, client_id: ClientId) -> DomainResult<Vec<Invoice>> {
        let state = self.read()?;
        Ok(state
            .invoices
            .iter()
            .filter(|i| i.client_id() == client_id)
            .cloned()
            .collect())
    }

    pub fn invoices_by_project(&self, project_id: ProjectId) -> DomainResult<Vec<Invoice>> {
        let state = self.read()?;
        Ok(state
            .invoices
            .iter()
            .filter(|i| i.project_id() == Some(project_id))
            .cloned()
            .collect())
    }

    pub fn invoices_by_status(&self, status: InvoiceStatus) -> DomainResult<Vec<Invoice>> {
        let state = self.read()?;
        Ok(state
            .invoices
            .iter()
            .filter(|i| i.status() == status)
            .cloned()
            .collect())
    }

    /// Invoices past their due date that are still open.
    pub fn overdue_invoices(&self) -> DomainResult<Vec<Invoice>> {
        let state = self.read()?;
        let today = Self::today();
        Ok(state
            .invoices
            .iter()
            .filter(|i| i.is_overdue(today))
            .cloned()
            .collect())
    }

    /// Invoices that can still accept a payment: open status and an
    /// outstanding balance above zero.
    pub fn open_invoices(&self) -> DomainResult<Vec<Invoice>> {
        let state = self.read()?;
        let mut open = Vec::new();
        for invoice in state.invoices.iter().filter(|i| i.is_payable()) {
            let paid = client_paid_sum(&state, invoice.id_typed())?;
            if paid < invoice.total_amount() {
                open.push(invoice.clone());
            }
        }
        Ok(open)
    }

    /// Gross total of all invoices that are neither paid nor cancelled.
    pub fn total_outstanding(&self) -> DomainResult<Money> {
        let state = self.read()?;
        let mut sum = Money::ZERO;
        for invoice in state.invoices.iter().filter(|i| !i.status().is_closed()) {
            sum = sum
                .checked_add(invoice.total_amount())
                .ok_or_else(|| DomainError::invariant("outstanding total overflows"))?;
        }
        Ok(sum)
    }

    /// Sum of all payments received from clients.
    pub fn total_paid(&self) -> DomainResult<Money> {
        let state = self.read()?;
        let mut sum = Money::ZERO;
        for payment in state.payments.iter().filter(|p| p.target().is_client()) {
            sum = sum
                .checked_add(payment.amount())
                .ok_or_else(|| DomainError::invariant("payment sum overflows"))?;
        }
        Ok(sum)
    }
}
