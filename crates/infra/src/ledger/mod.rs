//! The ledger service: every operation of the invoicing module, behind one
//! lock.
//!
//! Mutations (including their reconciliation and budget side effects, and
//! the snapshot save) run under a single write lock, which keeps document
//! numbering race-free and preserves one-mutation-at-a-time semantics.
//! Reads clone entities out under the read lock.

mod invoices;
mod payments;
mod purchase_orders;
mod vendor_invoices;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};
use tracing::warn;

use ampere_core::{DomainError, DomainResult, Money};
use ampere_finance::{InvoiceId, VendorInvoiceId};

use crate::snapshot::{InMemorySnapshotStore, LedgerSnapshot, SnapshotStore};

/// Service object owning the five entity collections and their invariants.
pub struct Ledger {
    state: RwLock<LedgerSnapshot>,
    store: Box<dyn SnapshotStore>,
}

impl Ledger {
    /// Open a ledger over `store`, loading the last snapshot if one exists.
    ///
    /// A snapshot that fails to load is logged at warn level and the ledger
    /// starts empty.
    pub fn new(store: Box<dyn SnapshotStore>) -> Self {
        let state = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => LedgerSnapshot::default(),
            Err(error) => {
                warn!(%error, "failed to load ledger snapshot, starting empty");
                LedgerSnapshot::default()
            }
        };
        Self {
            state: RwLock::new(state),
            store,
        }
    }

    /// Ledger over an in-memory store (tests, ephemeral runs).
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemorySnapshotStore::new()))
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, LedgerSnapshot>> {
        self.state
            .read()
            .map_err(|_| DomainError::invariant("ledger lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, LedgerSnapshot>> {
        self.state
            .write()
            .map_err(|_| DomainError::invariant("ledger lock poisoned"))
    }

    /// Save under the write lock; a failed save is logged and the in-memory
    /// state stays authoritative.
    fn persist(&self, state: &LedgerSnapshot) {
        if let Err(error) = self.store.save(state) {
            warn!(%error, "failed to save ledger snapshot");
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Sum of the payments settling one client invoice.
pub(crate) fn client_paid_sum(
    state: &LedgerSnapshot,
    invoice_id: InvoiceId,
) -> DomainResult<Money> {
    let mut sum = Money::ZERO;
    for payment in state
        .payments
        .iter()
        .filter(|p| p.is_for_client_invoice(invoice_id))
    {
        sum = sum
            .checked_add(payment.amount())
            .ok_or_else(|| DomainError::invariant("payment sum overflows"))?;
    }
    Ok(sum)
}

/// Sum of the payments settling one vendor invoice.
pub(crate) fn vendor_paid_sum(
    state: &LedgerSnapshot,
    invoice_id: VendorInvoiceId,
) -> DomainResult<Money> {
    let mut sum = Money::ZERO;
    for payment in state
        .payments
        .iter()
        .filter(|p| p.is_for_vendor_invoice(invoice_id))
    {
        sum = sum
            .checked_add(payment.amount())
            .ok_or_else(|| DomainError::invariant("payment sum overflows"))?;
    }
    Ok(sum)
}
