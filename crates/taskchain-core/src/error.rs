//! Error types for the taskchain client stack

use thiserror::Error;

use crate::event::TxRef;
use crate::task::TaskId;

/// Top-level error type for taskchain operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskchainError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),
}

/// Errors on the read path (log fetch, point-reads, decoding)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Transport or provider failure. A partial log response is reported
    /// as this error, never as a silently truncated result.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Point-read for an id the ledger does not resolve
    #[error("Task {0} not found on ledger")]
    TaskNotFound(TaskId),

    /// Raw log record with an unrecognized event name or malformed arguments
    #[error("Undecodable log record: {0}")]
    Decode(String),
}

/// Errors on the write path, staged by lifecycle phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// Rejected by the entry guard before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The dry-run reverted; nothing was submitted
    #[error("Simulation reverted: {0}")]
    SimulationReverted(String),

    /// The signer/provider declined to sign; nothing was submitted
    #[error("Signer rejected the transaction")]
    SignerRejected,

    /// Transport failure at or after hand-off to the ledger; the
    /// transaction may be in flight
    #[error("Submission failed: {0}")]
    SubmitFailed(String),

    /// Mined, but the transaction failed on-chain
    #[error("Transaction {0} reverted on-chain")]
    TransactionReverted(TxRef),

    /// No definite outcome within the confirmation bound
    #[error("Confirmation of {0} timed out")]
    ConfirmationTimeout(TxRef),

    /// Confirmed on the ledger, but the follow-up read-path pass failed.
    /// The write took effect; only the local view is stale.
    #[error("Transaction {tx_ref} confirmed but the view refresh failed: {source}")]
    RefreshFailed { tx_ref: TxRef, source: LedgerError },

    /// Read-path failure before submission (e.g. during simulate)
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl WriteError {
    /// Whether a transaction may have reached the ledger.
    ///
    /// `false` means nothing happened and the same intent is safe to
    /// retry; `true` means a retry could double-submit without an
    /// additional guard.
    pub fn submission_attempted(&self) -> bool {
        matches!(
            self,
            WriteError::SubmitFailed(_)
                | WriteError::TransactionReverted(_)
                | WriteError::ConfirmationTimeout(_)
                | WriteError::RefreshFailed { .. }
        )
    }
}

/// Errors from the opaque signer capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("Signer rejected the request")]
    Rejected,

    #[error("No connected account")]
    NoAccount,

    #[error("Signer transport failed: {0}")]
    Transport(String),
}

impl From<SignerError> for WriteError {
    fn from(err: SignerError) -> Self {
        match err {
            // Nothing left the signer in either case, so retry is safe.
            SignerError::Rejected | SignerError::NoAccount => WriteError::SignerRejected,
            SignerError::Transport(msg) => WriteError::SubmitFailed(msg),
        }
    }
}

/// Result type alias for taskchain operations
pub type Result<T> = std::result::Result<T, TaskchainError>;
