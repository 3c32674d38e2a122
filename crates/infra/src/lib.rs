//! Infrastructure layer: the ledger service and snapshot persistence.

pub mod ledger;
pub mod snapshot;


pub use ledger::Ledger;
pub use snapshot::{
    InMemorySnapshotStore, JsonFileSnapshotStore, LedgerSnapshot, SnapshotError, SnapshotStore,
};
