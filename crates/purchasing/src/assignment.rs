//! Vendor budget assignments per project.

use serde::{Deserialize, Serialize};

use ampere_core::{DomainError, DomainResult, Money, ProjectId, VendorId};

/// Budget envelope a vendor holds on a project, keyed by
/// `(project_id, vendor_id)`.
///
/// `budget_used` tracks committed purchase order spend. Adjustments clamp at
/// zero, so deletions can never drive the counter negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorAssignment {
    project_id: ProjectId,
    vendor_id: VendorId,
    budget_allocated: Money,
    budget_used: Money,
}

impl VendorAssignment {
    pub fn new(
        project_id: ProjectId,
        vendor_id: VendorId,
        budget_allocated: Money,
    ) -> DomainResult<Self> {
        if budget_allocated.is_negative() {
            return Err(DomainError::validation(
                "budget allocation cannot be negative",
            ));
        }
        Ok(Self {
            project_id,
            vendor_id,
            budget_allocated,
            budget_used: Money::ZERO,
        })
    }

    /// Replace the allocation, keeping the usage counter.
    pub fn reallocate(&mut self, budget_allocated: Money) -> DomainResult<()> {
        if budget_allocated.is_negative() {
            return Err(DomainError::validation(
                "budget allocation cannot be negative",
            ));
        }
        self.budget_allocated = budget_allocated;
        Ok(())
    }

    /// Apply a signed usage delta, clamping at zero.
    pub fn adjust_used(&mut self, delta: Money) {
        self.budget_used = self.budget_used.saturating_add(delta).max(Money::ZERO);
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub fn budget_allocated(&self) -> Money {
        self.budget_allocated
    }

    pub fn budget_used(&self) -> Money {
        self.budget_used
    }

    /// Allocation still uncommitted; negative when the project is over budget.
    pub fn budget_remaining(&self) -> Money {
        self.budget_allocated
            .checked_sub(self.budget_used)
            .unwrap_or(Money::ZERO)
    }
}
