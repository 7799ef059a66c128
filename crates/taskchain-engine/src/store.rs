//! View-state store
//!
//! Holds the last successfully reconciled `(tasks, events)` pair for the
//! presentation layer. Snapshots are replaced wholesale after each
//! successful read-path pass; a reader always sees either the previous
//! complete snapshot or the new one, never an interleaving, and a failed
//! pass leaves the previous snapshot visible.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use taskchain_core::{LedgerEvent, Task};

/// One complete reconciled view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Current task set, ascending by id
    pub tasks: Vec<Task>,
    /// Event feed, most recent block first
    pub events: Vec<LedgerEvent>,
}

/// Shared store of the latest snapshot plus in-flight status
#[derive(Debug, Default)]
pub struct ViewStateStore {
    snapshot: RwLock<Snapshot>,
    busy: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl ViewStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current complete snapshot
    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Replace the snapshot wholesale
    pub async fn replace(&self, snapshot: Snapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// Whether a read-path pass or write is in flight
    pub fn busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }

    /// Human-readable failure of the most recent operation, if any
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn set_error(&self, error: Option<String>) {
        *self.last_error.write().await = error;
    }
}
