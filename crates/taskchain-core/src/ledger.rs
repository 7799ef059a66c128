//! Ledger abstraction
//!
//! The [`LedgerReader`] and [`LedgerWriter`] traits provide a unified
//! interface to the remote ledger, allowing the reconciliation and
//! write-lifecycle logic to work with both a real JSON-RPC endpoint
//! (taskchain-rpc) and the scripted [`MockLedger`] for testing.
//!
//! ## Implementations
//!
//! - [`MockLedger`]: in-memory scripted ledger (in [`crate::mock`])
//! - `RpcLedger`: real JSON-RPC transport (in the taskchain-rpc crate)
//!
//! [`MockLedger`]: crate::mock::MockLedger

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, SignerError, WriteError};
use crate::event::{EventKind, RawLogRecord, TxRef};
use crate::session::Address;
use crate::task::{Task, TaskId};

/// Contract function names used by reads and write intents
pub mod functions {
    pub const GET: &str = "getTask";
    pub const CREATE: &str = "createTask";
    pub const UPDATE: &str = "updateTask";
    pub const COMPLETE: &str = "completeTask";
}

/// Upper endpoint of a block-height range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockTag {
    /// The latest confirmed height at query time
    Latest,
    Height(u64),
}

/// A log query over an inclusive height range
///
/// One query covers every requested event kind; a provider that can only
/// answer for a subset must fail the whole query, never truncate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub contract: Address,
    pub kinds: Vec<EventKind>,
    pub from_height: u64,
    pub to: BlockTag,
}

impl EventQuery {
    /// Query every event kind over the full chain history.
    ///
    /// This is the default read-path range: completeness of the created-id
    /// set takes priority over fetch cost. Narrower ranges are for callers
    /// that track their own cursor.
    pub fn full_history(contract: Address) -> Self {
        Self {
            contract,
            kinds: EventKind::ALL.to_vec(),
            from_height: 0,
            to: BlockTag::Latest,
        }
    }
}

/// A simulate-validated call, ready for signing and submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedCall {
    pub contract: Address,
    pub function: String,
    pub args: serde_json::Value,
    pub caller: Address,
}

/// Confirmation receipt for a mined, successful transaction
///
/// A mined-but-reverted transaction surfaces as
/// [`WriteError::TransactionReverted`] instead of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_ref: TxRef,
    pub block_height: u64,
}

/// Read-side gateway to the ledger
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Fetch raw log records for every kind in the query, covering the
    /// inclusive height range.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unavailable`] on any transport or provider failure,
    /// including partial ones. A subset is never silently returned.
    async fn fetch_events(
        &self,
        query: &EventQuery,
    ) -> std::result::Result<Vec<RawLogRecord>, LedgerError>;

    /// Point-read the current confirmed state of one task.
    ///
    /// Must reflect the chain's state at call time, not a cache.
    async fn read_task(
        &self,
        contract: &Address,
        id: TaskId,
    ) -> std::result::Result<Task, LedgerError>;
}

/// Write-side gateway to the ledger
///
/// Drives one stage each of the simulate → submit → confirm lifecycle.
/// None of these methods retries internally; retry policy belongs to the
/// caller, which knows whether a submission may already be in flight.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Accounts the session's signer currently exposes.
    ///
    /// An empty list means no connected signer; write intents are
    /// rejected before simulation in that case. This consults the
    /// provider's local view, not the network.
    async fn connected_accounts(&self) -> Vec<Address>;

    /// Dry-run a state-changing call to surface revert reasons without
    /// spending a submission.
    async fn simulate(
        &self,
        contract: &Address,
        function: &str,
        args: serde_json::Value,
        caller: &Address,
    ) -> std::result::Result<PreparedCall, WriteError>;

    /// Sign and hand the prepared call to the ledger.
    async fn submit(&self, call: &PreparedCall) -> std::result::Result<TxRef, WriteError>;

    /// Wait, within a bounded timeout, for the transaction to reach a
    /// definite outcome.
    async fn await_confirmation(
        &self,
        tx_ref: &TxRef,
    ) -> std::result::Result<Receipt, WriteError>;
}

/// Opaque sign-and-send capability
///
/// Wraps whatever provider the session connected (browser-injected
/// wallet, keystore, hardware signer). The core only requires that a
/// prepared call either becomes a transaction reference or fails.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Accounts the provider has already exposed to this session
    async fn accounts(&self) -> Vec<Address>;

    /// Prompt the provider to expose accounts
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, SignerError>;

    /// Sign the prepared call and send it to the ledger
    async fn sign_and_send(
        &self,
        call: &PreparedCall,
    ) -> std::result::Result<TxRef, SignerError>;
}
