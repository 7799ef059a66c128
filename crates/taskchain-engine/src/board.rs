//! TaskBoard — the app-layer entry point.
//!
//! Ties the read path (fetch → normalize → reconstruct → store) to the
//! write lifecycle (coordinator) behind the only surface a presentation
//! layer consumes: `reload`, `create`, `update`, `complete`, plus the
//! snapshot and phase observers.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use taskchain_core::{
    EventQuery, LedgerError, LedgerReader, LedgerWriter, Receipt, Result, SessionContext,
    TaskchainError, TaskId, WriteError,
};

use crate::coordinator::{MutationCoordinator, WriteIntent, WritePhase};
use crate::normalize::normalize;
use crate::reconstruct::Reconstructor;
use crate::store::{Snapshot, ViewStateStore};

/// The reconciled task-board client for one session
///
/// Generic over the ledger gateway, so the same engine runs against the
/// JSON-RPC client or the scripted mock. A write is reported complete
/// only after its confirmation has been followed by a fresh read-path
/// pass, so the caller always observes its own write. Racing reloads are
/// resolved last-write-wins on the store; both converge to the same
/// authoritative ledger state.
pub struct TaskBoard<L> {
    ledger: Arc<L>,
    session: SessionContext,
    store: Arc<ViewStateStore>,
    reconstructor: Reconstructor,
    coordinator: MutationCoordinator,
}

impl<L> TaskBoard<L>
where
    L: LedgerReader + LedgerWriter,
{
    pub fn new(ledger: Arc<L>, session: SessionContext) -> Self {
        Self::with_reconstructor(ledger, session, Reconstructor::default())
    }

    /// Construct with an explicit reconstruction policy
    pub fn with_reconstructor(
        ledger: Arc<L>,
        session: SessionContext,
        reconstructor: Reconstructor,
    ) -> Self {
        Self {
            ledger,
            session,
            store: Arc::new(ViewStateStore::new()),
            reconstructor,
            coordinator: MutationCoordinator::new(),
        }
    }

    /// The shared view-state store
    pub fn store(&self) -> Arc<ViewStateStore> {
        Arc::clone(&self.store)
    }

    /// The current complete snapshot
    pub async fn snapshot(&self) -> Snapshot {
        self.store.snapshot().await
    }

    /// Observe write-lifecycle phase transitions
    pub fn phase(&self) -> watch::Receiver<WritePhase> {
        self.coordinator.phase()
    }

    /// Run one full read-path pass and replace the store's snapshot.
    ///
    /// On failure the previous snapshot stays visible and the error is
    /// recorded as `last_error`.
    pub async fn reload(&self) -> Result<()> {
        self.store.set_busy(true);
        let outcome = self.read_pass().await;
        self.store.set_busy(false);

        match outcome {
            Ok(snapshot) => {
                debug!(
                    tasks = snapshot.tasks.len(),
                    events = snapshot.events.len(),
                    "read-path pass complete"
                );
                self.store.replace(snapshot).await;
                self.store.set_error(None).await;
                Ok(())
            }
            Err(err) => {
                warn!(%err, "read-path pass failed; keeping previous snapshot");
                self.store.set_error(Some(err.to_string())).await;
                Err(err.into())
            }
        }
    }

    async fn read_pass(&self) -> std::result::Result<Snapshot, LedgerError> {
        let query = EventQuery::full_history(self.session.contract.clone());
        let records = self.ledger.fetch_events(&query).await?;
        let events = normalize(records)?;
        let tasks = self
            .reconstructor
            .reconstruct(self.ledger.as_ref(), &self.session.contract, &events)
            .await?;
        Ok(Snapshot { tasks, events })
    }

    /// Create a new task
    pub async fn create(&self, description: impl Into<String>) -> Result<Receipt> {
        self.apply(WriteIntent::Create {
            description: description.into(),
        })
        .await
    }

    /// Replace a task's description
    pub async fn update(&self, id: TaskId, description: impl Into<String>) -> Result<Receipt> {
        self.apply(WriteIntent::Update {
            id,
            description: description.into(),
        })
        .await
    }

    /// Mark a task completed
    pub async fn complete(&self, id: TaskId) -> Result<Receipt> {
        self.apply(WriteIntent::Complete { id }).await
    }

    async fn apply(&self, intent: WriteIntent) -> Result<Receipt> {
        let receipt = match self
            .coordinator
            .execute(self.ledger.as_ref(), &self.session, intent)
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                // The previous snapshot stays untouched on any write failure.
                self.store.set_error(Some(err.to_string())).await;
                return Err(err.into());
            }
        };

        // Read-your-own-write: the intent is complete only once the
        // refreshed view is in the store. A failure here still means the
        // write landed, so it must not read as safe to retry.
        if let Err(err) = self.reload().await {
            let source = match err {
                TaskchainError::Ledger(e) => e,
                other => LedgerError::Unavailable(other.to_string()),
            };
            let err = WriteError::RefreshFailed {
                tx_ref: receipt.tx_ref.clone(),
                source,
            };
            self.store.set_error(Some(err.to_string())).await;
            return Err(err.into());
        }
        Ok(receipt)
    }
}
