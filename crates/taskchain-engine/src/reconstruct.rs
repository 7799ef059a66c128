//! Entity reconstruction
//!
//! Derives the current task set from the normalized event feed. Events
//! only establish which ids exist (a `Created` entry in the observed
//! range); the value of each task comes from an authoritative point-read,
//! never from folding event payloads — an update event's payload encoding
//! could diverge from the getter's contract-level decoding, and only the
//! ledger's state is guaranteed consistent.

use std::collections::BTreeSet;

use futures::future::join_all;
use tracing::{debug, warn};

use taskchain_core::{Address, EventKind, LedgerError, LedgerEvent, LedgerReader, Task};

/// Reconstruction policy and driver
#[derive(Debug, Clone, Copy)]
pub struct Reconstructor {
    /// When true (the default), an id whose point-read fails is dropped
    /// from the result silently and the pass still succeeds — the view
    /// stays available with a partial set. When false, the first failed
    /// read fails the whole pass.
    pub partial_results_allowed: bool,
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self {
            partial_results_allowed: true,
        }
    }
}

impl Reconstructor {
    /// A reconstructor that propagates every point-read failure
    pub fn strict() -> Self {
        Self {
            partial_results_allowed: false,
        }
    }

    /// Reconstruct the current task set from the event feed.
    ///
    /// Ids appearing only in `Updated`/`Completed` events are not
    /// materialized; within the observed range, existence means a
    /// `Created` entry. Point-reads fan out concurrently and are awaited
    /// as a batch, so one slow read never blocks the others. The result
    /// is ascending by id.
    pub async fn reconstruct<L>(
        &self,
        ledger: &L,
        contract: &Address,
        events: &[LedgerEvent],
    ) -> Result<Vec<Task>, LedgerError>
    where
        L: LedgerReader + ?Sized,
    {
        let ids: BTreeSet<_> = events
            .iter()
            .filter(|e| e.kind() == EventKind::Created)
            .map(|e| e.task_id())
            .collect();

        debug!(count = ids.len(), "reconstructing task set");
        let reads = ids.iter().map(|id| ledger.read_task(contract, *id));
        let results = join_all(reads).await;

        let mut tasks = Vec::with_capacity(ids.len());
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(task) => tasks.push(task),
                Err(err) if self.partial_results_allowed => {
                    warn!(%id, %err, "dropping task after failed point-read");
                }
                Err(err) => return Err(err),
            }
        }

        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }
}
