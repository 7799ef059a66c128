//! Mutation coordinator
//!
//! Drives one write intent through the simulate → submit → confirm
//! lifecycle, publishing each phase on a watch channel so a consumer can
//! render in-flight progress. Intents are serialized: a second caller
//! waits for the current one to reach a terminal phase. Nothing here
//! retries; retry is a fresh intent from the user, guided by
//! [`WriteError::submission_attempted`].

use serde_json::json;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use taskchain_core::{
    LedgerWriter, Receipt, SessionContext, TaskId, WriteError, functions,
};

/// One write requested by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteIntent {
    Create { description: String },
    Update { id: TaskId, description: String },
    Complete { id: TaskId },
}

impl WriteIntent {
    /// The contract function this intent calls
    pub fn function(&self) -> &'static str {
        match self {
            WriteIntent::Create { .. } => functions::CREATE,
            WriteIntent::Update { .. } => functions::UPDATE,
            WriteIntent::Complete { .. } => functions::COMPLETE,
        }
    }

    /// The call arguments as the wire expects them
    pub fn args(&self) -> serde_json::Value {
        match self {
            WriteIntent::Create { description } => json!({"description": description}),
            WriteIntent::Update { id, description } => {
                json!({"id": id.0, "description": description})
            }
            WriteIntent::Complete { id } => json!({"id": id.0}),
        }
    }

    /// Entry guard, checked before any network call
    pub fn validate(&self) -> Result<(), WriteError> {
        match self {
            WriteIntent::Create { description } | WriteIntent::Update { description, .. } => {
                if description.trim().is_empty() {
                    return Err(WriteError::InvalidInput(
                        "description must not be empty".into(),
                    ));
                }
                Ok(())
            }
            WriteIntent::Complete { .. } => Ok(()),
        }
    }
}

/// Lifecycle phase of the write currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePhase {
    #[default]
    Idle,
    Simulating,
    Submitted,
    Confirming,
    Succeeded,
    Failed,
}

impl WritePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WritePhase::Idle | WritePhase::Succeeded | WritePhase::Failed
        )
    }
}

/// Serialized driver of the write lifecycle
pub struct MutationCoordinator {
    phase_tx: watch::Sender<WritePhase>,
    write_lock: Mutex<()>,
}

impl Default for MutationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationCoordinator {
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(WritePhase::Idle);
        Self {
            phase_tx,
            write_lock: Mutex::new(()),
        }
    }

    /// Observe phase transitions of the in-flight write
    pub fn phase(&self) -> watch::Receiver<WritePhase> {
        self.phase_tx.subscribe()
    }

    fn transition(&self, phase: WritePhase) {
        debug!(?phase, "write phase");
        self.phase_tx.send_replace(phase);
    }

    /// Run one intent to its terminal phase.
    ///
    /// Returns the confirmation receipt; the caller is expected to follow
    /// a success with a read-path pass before reporting the write
    /// complete, so the author observes their own write.
    pub async fn execute<L>(
        &self,
        ledger: &L,
        session: &SessionContext,
        intent: WriteIntent,
    ) -> Result<Receipt, WriteError>
    where
        L: LedgerWriter + ?Sized,
    {
        let _guard = self.write_lock.lock().await;

        if let Err(err) = intent.validate() {
            self.transition(WritePhase::Failed);
            return Err(err);
        }

        // Entry guard: without a connected signer nothing can be
        // submitted, so the intent is rejected before any network call.
        if ledger.connected_accounts().await.is_empty() {
            self.transition(WritePhase::Failed);
            return Err(WriteError::SignerRejected);
        }

        self.transition(WritePhase::Simulating);
        let prepared = match ledger
            .simulate(
                &session.contract,
                intent.function(),
                intent.args(),
                &session.caller,
            )
            .await
        {
            Ok(call) => call,
            Err(err) => {
                // Nothing was submitted; this failure is safe to retry.
                self.transition(WritePhase::Failed);
                return Err(err);
            }
        };

        self.transition(WritePhase::Submitted);
        let tx_ref = match ledger.submit(&prepared).await {
            Ok(tx_ref) => tx_ref,
            Err(err) => {
                self.transition(WritePhase::Failed);
                return Err(err);
            }
        };

        self.transition(WritePhase::Confirming);
        match ledger.await_confirmation(&tx_ref).await {
            Ok(receipt) => {
                info!(%tx_ref, height = receipt.block_height, "write confirmed");
                self.transition(WritePhase::Succeeded);
                Ok(receipt)
            }
            Err(err) => {
                self.transition(WritePhase::Failed);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskchain_core::{
        Address, ConfirmationOutcome, LedgerCall, MockLedger,
    };

    fn session() -> SessionContext {
        SessionContext::new(
            Address::parse("0x00000000000000000000000000000000000000c0").unwrap(),
            Address::parse("0x00000000000000000000000000000000000000ca").unwrap(),
        )
    }

    #[test]
    fn test_intent_entry_guard() {
        assert!(WriteIntent::Create {
            description: "buy milk".into()
        }
        .validate()
        .is_ok());

        let err = WriteIntent::Create {
            description: "   ".into(),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, WriteError::InvalidInput(_)));

        let err = WriteIntent::Update {
            id: TaskId(1),
            description: "".into(),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, WriteError::InvalidInput(_)));

        assert!(WriteIntent::Complete { id: TaskId(1) }.validate().is_ok());
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_network_calls() {
        let ledger = MockLedger::new();
        let coordinator = MutationCoordinator::new();

        let err = coordinator
            .execute(
                &ledger,
                &session(),
                WriteIntent::Create {
                    description: " ".into(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::InvalidInput(_)));
        assert!(ledger.calls().is_empty());
        assert_eq!(*coordinator.phase().borrow(), WritePhase::Failed);
    }

    #[tokio::test]
    async fn test_disconnected_signer_rejected_before_simulation() {
        let ledger = MockLedger::new();
        ledger.disconnect_signer();
        let coordinator = MutationCoordinator::new();

        let err = coordinator
            .execute(
                &ledger,
                &session(),
                WriteIntent::Create {
                    description: "buy milk".into(),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err, WriteError::SignerRejected);
        // Rejected before Simulating: no simulate round-trip happened.
        assert!(ledger.calls().is_empty());
        assert_eq!(*coordinator.phase().borrow(), WritePhase::Failed);
    }

    #[tokio::test]
    async fn test_simulation_failure_never_submits() {
        let ledger = MockLedger::new();
        ledger.revert_simulation(functions::COMPLETE, "already completed");
        let coordinator = MutationCoordinator::new();

        let err = coordinator
            .execute(&ledger, &session(), WriteIntent::Complete { id: TaskId(1) })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            WriteError::SimulationReverted("already completed".into())
        );
        assert!(!err.submission_attempted());
        assert!(
            !ledger
                .calls()
                .iter()
                .any(|c| matches!(c, LedgerCall::Submit { .. }))
        );
    }

    #[tokio::test]
    async fn test_successful_lifecycle_reaches_succeeded() {
        let ledger = MockLedger::new();
        let coordinator = MutationCoordinator::new();

        let receipt = coordinator
            .execute(
                &ledger,
                &session(),
                WriteIntent::Create {
                    description: "buy milk".into(),
                },
            )
            .await
            .unwrap();

        assert!(receipt.block_height > 0);
        assert_eq!(*coordinator.phase().borrow(), WritePhase::Succeeded);

        let calls = ledger.calls();
        assert!(matches!(calls[0], LedgerCall::Simulate { .. }));
        assert!(matches!(calls[1], LedgerCall::Submit { .. }));
        assert!(matches!(calls[2], LedgerCall::AwaitConfirmation(_)));
    }

    #[tokio::test]
    async fn test_reverted_confirmation_fails_with_stage_info() {
        let ledger = MockLedger::new();
        ledger.set_confirmation(ConfirmationOutcome::Reverted);
        let coordinator = MutationCoordinator::new();

        let err = coordinator
            .execute(
                &ledger,
                &session(),
                WriteIntent::Update {
                    id: TaskId(1),
                    description: "v2".into(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::TransactionReverted(_)));
        // A retry here could double-submit.
        assert!(err.submission_attempted());
        assert_eq!(*coordinator.phase().borrow(), WritePhase::Failed);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_fails() {
        let ledger = MockLedger::new();
        ledger.set_confirmation(ConfirmationOutcome::Timeout);
        let coordinator = MutationCoordinator::new();

        let err = coordinator
            .execute(&ledger, &session(), WriteIntent::Complete { id: TaskId(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::ConfirmationTimeout(_)));
    }
}
