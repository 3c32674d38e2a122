//! Purchase order operations and vendor budget coupling.
//!
//! Purchase order mutations feed the matching vendor assignment's
//! `budget_used` counter: whole-order mutations apply the order total's
//! delta, line item mutations apply the item's gross (total plus GST)
//! delta. A missing assignment skips the adjustment without failing the
//! mutation. Budget usage is not reconciled against vendor invoices or
//! payments.

use ampere_core::{DomainError, DomainResult, Money, ProjectId, VendorId, docnum, gst_breakdown};
use ampere_purchasing::{
    LineItem, LineItemDraft, LineItemId, LineItemPatch, PurchaseOrder, PurchaseOrderDraft,
    PurchaseOrderId, PurchaseOrderPatch, PurchaseOrderStatus, VendorAssignment,
};

use super::Ledger;
use crate::snapshot::LedgerSnapshot;

impl Ledger {
    /// Create a purchase order, assigning the next `AMP-PO` number for the
    /// current month and committing its total against the vendor's budget.
    pub fn add_purchase_order(&self, draft: PurchaseOrderDraft) -> DomainResult<PurchaseOrder> {
        let mut state = self.write()?;
        let today = Self::today();
        let number = docnum::next_in_series(
            docnum::PURCHASE_ORDER_PREFIX,
            today,
            state.purchase_orders.iter().map(|o| o.po_number()),
        );
        let order = PurchaseOrder::from_draft(draft, number, today)?;

        adjust_budget(
            &mut state,
            order.project_id(),
            order.vendor_id(),
            order.total_amount(),
        );
        state.purchase_orders.push(order.clone());
        self.persist(&state);
        Ok(order)
    }

    pub fn purchase_order(
        &self,
        order_id: PurchaseOrderId,
    ) -> DomainResult<Option<PurchaseOrder>> {
        let state = self.read()?;
        Ok(state
            .purchase_orders
            .iter()
            .find(|o| o.id_typed() == order_id)
            .cloned())
    }

    pub fn purchase_orders(&self) -> DomainResult<Vec<PurchaseOrder>> {
        Ok(self.read()?.purchase_orders.clone())
    }

    /// Merge a partial update; the budget moves by the order total's delta.
    pub fn update_purchase_order(
        &self,
        order_id: PurchaseOrderId,
        patch: PurchaseOrderPatch,
    ) -> DomainResult<PurchaseOrder> {
        let mut state = self.write()?;
        let index = state
            .purchase_orders
            .iter()
            .position(|o| o.id_typed() == order_id)
            .ok_or_else(DomainError::not_found)?;

        let mut updated = state.purchase_orders[index].clone();
        let before = updated.total_amount();
        updated.apply_patch(patch)?;

        let delta = signed_delta(before, updated.total_amount())?;
        adjust_budget(&mut state, updated.project_id(), updated.vendor_id(), delta);
        state.purchase_orders[index] = updated.clone();
        self.persist(&state);
        Ok(updated)
    }

    /// Delete a purchase order, releasing its total from the vendor's
    /// budget.
    pub fn delete_purchase_order(&self, order_id: PurchaseOrderId) -> DomainResult<()> {
        let mut state = self.write()?;
        let index = state
            .purchase_orders
            .iter()
            .position(|o| o.id_typed() == order_id)
            .ok_or_else(DomainError::not_found)?;

        let removed = state.purchase_orders.remove(index);
        let delta = signed_delta(removed.total_amount(), Money::ZERO)?;
        adjust_budget(&mut state, removed.project_id(), removed.vendor_id(), delta);
        self.persist(&state);
        Ok(())
    }

    pub fn purchase_orders_by_vendor(
        &self,
        vendor_id: VendorId,
    ) -> DomainResult<Vec<PurchaseOrder>> {
        let state = self.read()?;
        Ok(state
            .purchase_orders
            .iter()
            .filter(|o| o.vendor_id() == vendor_id)
            .cloned()
            .collect())
    }

    pub fn purchase_orders_by_project(
        &self,
        project_id: ProjectId,
    ) -> DomainResult<Vec<PurchaseOrder>> {
        let state = self.read()?;
        Ok(state
            .purchase_orders
            .iter()
            .filter(|o| o.project_id() == project_id)
            .cloned()
            .collect())
    }

    pub fn purchase_orders_by_status(
        &self,
        status: PurchaseOrderStatus,
    ) -> DomainResult<Vec<PurchaseOrder>> {
        let state = self.read()?;
        Ok(state
            .purchase_orders
            .iter()
            .filter(|o| o.status() == status)
            .cloned()
            .collect())
    }

    /// Append a line item to an order, committing the item's gross amount
    /// against the vendor's budget.
    pub fn add_po_item(
        &self,
        order_id: PurchaseOrderId,
        draft: LineItemDraft,
    ) -> DomainResult<LineItem> {
        let mut state = self.write()?;
        let index = state
            .purchase_orders
            .iter()
            .position(|o| o.id_typed() == order_id)
            .ok_or_else(DomainError::not_found)?;

        let mut updated = state.purchase_orders[index].clone();
        let item = updated.add_item(draft)?;

        let delta = item_gross(item.total())?;
        adjust_budget(&mut state, updated.project_id(), updated.vendor_id(), delta);
        state.purchase_orders[index] = updated;
        self.persist(&state);
        Ok(item)
    }

    /// Update one line item; the budget moves by the item's gross delta.
    pub fn update_po_item(
        &self,
        order_id: PurchaseOrderId,
        item_id: LineItemId,
        patch: LineItemPatch,
    ) -> DomainResult<LineItem> {
        let mut state = self.write()?;
        let index = state
            .purchase_orders
            .iter()
            .position(|o| o.id_typed() == order_id)
            .ok_or_else(DomainError::not_found)?;

        let mut updated = state.purchase_orders[index].clone();
        let before = updated
            .item(item_id)
            .map(|item| item.total())
            .ok_or_else(DomainError::not_found)?;
        let item = updated.update_item(item_id, patch)?;

        let delta = signed_delta(item_gross(before)?, item_gross(item.total())?)?;
        adjust_budget(&mut state, updated.project_id(), updated.vendor_id(), delta);
        state.purchase_orders[index] = updated;
        self.persist(&state);
        Ok(item)
    }

    /// Remove one line item, releasing its gross amount from the vendor's
    /// budget.
    pub fn remove_po_item(
        &self,
        order_id: PurchaseOrderId,
        item_id: LineItemId,
    ) -> DomainResult<()> {
        let mut state = self.write()?;
        let index = state
            .purchase_orders
            .iter()
            .position(|o| o.id_typed() == order_id)
            .ok_or_else(DomainError::not_found)?;

        let mut updated = state.purchase_orders[index].clone();
        let removed = updated.remove_item(item_id)?;

        let delta = signed_delta(item_gross(removed.total())?, Money::ZERO)?;
        adjust_budget(&mut state, updated.project_id(), updated.vendor_id(), delta);
        state.purchase_orders[index] = updated;
        self.persist(&state);
        Ok(())
    }

    /// Assign a vendor to a project with a budget allocation.
    ///
    /// Re-assigning an existing pair replaces the allocation and keeps the
    /// accumulated usage.
    pub fn assign_vendor(
        &self,
        project_id: ProjectId,
        vendor_id: VendorId,
        budget_allocated: Money,
    ) -> DomainResult<VendorAssignment> {
        let mut state = self.write()?;
        let assignment = match state
            .assignments
            .iter_mut()
            .find(|a| a.project_id() == project_id && a.vendor_id() == vendor_id)
        {
            Some(existing) => {
                existing.reallocate(budget_allocated)?;
                existing.clone()
            }
            None => {
                let assignment = VendorAssignment::new(project_id, vendor_id, budget_allocated)?;
                state.assignments.push(assignment.clone());
                assignment
            }
        };
        self.persist(&state);
        Ok(assignment)
    }

    pub fn assignment(
        &self,
        project_id: ProjectId,
        vendor_id: VendorId,
    ) -> DomainResult<Option<VendorAssignment>> {
        let state = self.read()?;
        Ok(state
            .assignments
            .iter()
            .find(|a| a.project_id() == project_id && a.vendor_id() == vendor_id)
            .cloned())
    }

    pub fn assignments(&self) -> DomainResult<Vec<VendorAssignment>> {
        Ok(self.read()?.assignments.clone())
    }

    pub fn assignments_by_project(
        &self,
        project_id: ProjectId,
    ) -> DomainResult<Vec<VendorAssignment>> {
        let state = self.read()?;
        Ok(state
            .assignments
            .iter()
            .filter(|a| a.project_id() == project_id)
            .cloned()
            .collect())
    }
}

/// Move `budget_used` on the `(project, vendor)` assignment by `delta`.
///
/// No assignment means no adjustment; purchase order mutations never fail
/// on a missing budget envelope.
fn adjust_budget(
    state: &mut LedgerSnapshot,
    project_id: ProjectId,
    vendor_id: VendorId,
    delta: Money,
) {
    if let Some(assignment) = state
        .assignments
        .iter_mut()
        .find(|a| a.project_id() == project_id && a.vendor_id() == vendor_id)
    {
        assignment.adjust_used(delta);
    }
}

/// Signed difference `after - before` of two committed amounts.
fn signed_delta(before: Money, after: Money) -> DomainResult<Money> {
    after
        .checked_sub(before)
        .ok_or_else(|| DomainError::invariant("budget delta overflows"))
}

/// A line item's budget weight: its total grossed up by GST.
fn item_gross(total: Money) -> DomainResult<Money> {
    Ok(gst_breakdown(total)?.total_amount)
}
