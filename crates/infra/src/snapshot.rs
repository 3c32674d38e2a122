//! Whole-state snapshot persistence boundary.
//!
//! The ledger persists all of its collections as one JSON blob per save.
//! Stores make no durability promises beyond "last successful save wins";
//! the in-memory state stays authoritative when a save fails.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ampere_finance::{Invoice, Payment, VendorInvoice};
use ampere_purchasing::{PurchaseOrder, VendorAssignment};

/// Serialized whole-state blob the persistence layer loads and saves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub invoices: Vec<Invoice>,
    pub vendor_invoices: Vec<VendorInvoice>,
    pub payments: Vec<Payment>,
    pub purchase_orders: Vec<PurchaseOrder>,
    pub assignments: Vec<VendorAssignment>,
}

/// Snapshot persistence error.
///
/// These are infrastructure errors (storage, serialization) as opposed to
/// domain errors; callers log them and keep going.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Storage boundary for ledger snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot; `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<LedgerSnapshot>, SnapshotError>;

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), SnapshotError>;
}

/// Keeps the last snapshot in memory.
///
/// Intended for tests/dev and ephemeral runs. Not durable.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    last: RwLock<Option<LedgerSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<LedgerSnapshot>, SnapshotError> {
        match self.last.read() {
            Ok(last) => Ok(last.clone()),
            Err(_) => Ok(None),
        }
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), SnapshotError> {
        if let Ok(mut last) = self.last.write() {
            *last = Some(snapshot.clone());
        }
        Ok(())
    }
}

/// Persists snapshots as JSON at a fixed path.
///
/// Saves write a sibling temp file and rename it into place, so a torn
/// write never clobbers the previous snapshot.
#[derive(Debug)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<LedgerSnapshot>, SnapshotError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), SnapshotError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
