//! Mock ledger implementation for testing
//!
//! Provides an in-memory scripted ledger for testing reconciliation and
//! write-lifecycle logic without a real endpoint. Every trait call is
//! recorded in a trace so tests can assert on what was (and was not)
//! invoked, e.g. that a failed simulation never reaches `submit`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taskchain_core::{EventPayload, MockLedger, TaskId};
//!
//! let ledger = MockLedger::new();
//! ledger.push_event(EventPayload::Created { id: TaskId(1), description: "a".into() }, 10);
//! ledger.insert_task(Task::new(1u64, "a", false));
//!
//! let records = ledger.fetch_events(&query).await.unwrap();
//! assert_eq!(ledger.calls().len(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{LedgerError, SignerError, WriteError};
use crate::event::{EventPayload, RawLogRecord, TxRef};
use crate::ledger::{
    functions, EventQuery, LedgerReader, LedgerWriter, PreparedCall, Receipt, Signer,
};
use crate::session::Address;
use crate::task::{Task, TaskId};

/// One recorded trait invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    FetchEvents { from_height: u64 },
    ReadTask(TaskId),
    Simulate { function: String },
    Submit { function: String },
    AwaitConfirmation(TxRef),
}

/// Scripted outcome of `await_confirmation`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationOutcome {
    #[default]
    Mined,
    Reverted,
    Timeout,
}

#[derive(Default)]
struct MockState {
    records: Vec<RawLogRecord>,
    tasks: HashMap<TaskId, Task>,
    failing_reads: HashSet<TaskId>,
    fetch_failure: Option<String>,
    signer_accounts: Vec<Address>,
    reverts: HashMap<String, String>,
    confirmation: ConfirmationOutcome,
    pending: HashMap<TxRef, PreparedCall>,
    calls: Vec<LedgerCall>,
    next_id: u64,
    next_height: u64,
    next_tx: u64,
}

/// An in-memory ledger with scripted responses and a call trace
///
/// Submitted calls take effect at confirmation time, the way a real
/// chain's state becomes visible only once the transaction is mined:
/// a `createTask` submission appends a `TaskCreated` record and inserts
/// the task when `await_confirmation` resolves as mined.
pub struct MockLedger {
    state: Mutex<MockState>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 1,
                next_height: 1,
                next_tx: 1,
                signer_accounts: vec![Address::zero()],
                ..MockState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append a raw record built from a typed payload at the given height.
    ///
    /// Records are stored in push order, which stands in for the
    /// endpoint's arrival order.
    pub fn push_event(&self, payload: EventPayload, block_height: u64) -> TxRef {
        let mut state = self.lock();
        let tx_ref = TxRef::new(format!("0x{:04x}", state.next_tx));
        state.next_tx += 1;
        let record = raw_record(&payload, block_height, tx_ref.clone());
        state.records.push(record);
        state.next_height = state.next_height.max(block_height + 1);
        tx_ref
    }

    /// Append an arbitrary raw record, e.g. one with an unknown event name
    pub fn push_raw(&self, record: RawLogRecord) {
        self.lock().records.push(record);
    }

    /// Set the state a point-read of this task's id returns
    pub fn insert_task(&self, task: Task) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(task.id.0 + 1);
        state.tasks.insert(task.id, task);
    }

    /// Make point-reads of this id fail with `Unavailable`
    pub fn fail_read(&self, id: TaskId) {
        self.lock().failing_reads.insert(id);
    }

    /// Make the next log fetches fail with `Unavailable`
    pub fn fail_fetch(&self, reason: impl Into<String>) {
        self.lock().fetch_failure = Some(reason.into());
    }

    /// Drop all connected signer accounts
    pub fn disconnect_signer(&self) {
        self.lock().signer_accounts.clear();
    }

    /// Script a revert reason for simulations of the given function
    pub fn revert_simulation(&self, function: &str, reason: impl Into<String>) {
        self.lock().reverts.insert(function.to_string(), reason.into());
    }

    /// Script the outcome of `await_confirmation`
    pub fn set_confirmation(&self, outcome: ConfirmationOutcome) {
        self.lock().confirmation = outcome;
    }

    /// The recorded call trace, in invocation order
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.lock().calls.clone()
    }

    /// Drop the recorded trace, keeping all scripted state
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    // Apply a mined call's effect: mutate task state and append its event.
    fn apply(state: &mut MockState, call: &PreparedCall, tx_ref: &TxRef) {
        let height = state.next_height;
        state.next_height += 1;

        let payload = match call.function.as_str() {
            functions::CREATE => {
                let id = TaskId(state.next_id);
                state.next_id += 1;
                let description = arg_str(&call.args, "description");
                state
                    .tasks
                    .insert(id, Task::new(id, description.clone(), false));
                EventPayload::Created { id, description }
            }
            functions::UPDATE => {
                let id = TaskId(arg_u64(&call.args, "id"));
                let description = arg_str(&call.args, "description");
                if let Some(task) = state.tasks.get_mut(&id) {
                    task.description = description.clone();
                }
                EventPayload::Updated { id, description }
            }
            functions::COMPLETE => {
                let id = TaskId(arg_u64(&call.args, "id"));
                if let Some(task) = state.tasks.get_mut(&id) {
                    task.completed = true;
                }
                EventPayload::Completed { id }
            }
            _ => return,
        };

        state.records.push(raw_record(&payload, height, tx_ref.clone()));
    }
}

fn raw_record(payload: &EventPayload, block_height: u64, tx_ref: TxRef) -> RawLogRecord {
    let (event, args) = match payload {
        EventPayload::Created { id, description } => (
            "TaskCreated",
            json!({"id": id.0, "description": description}),
        ),
        EventPayload::Updated { id, description } => (
            "TaskUpdated",
            json!({"id": id.0, "description": description}),
        ),
        EventPayload::Completed { id } => ("TaskCompleted", json!({"id": id.0})),
    };
    RawLogRecord {
        event: event.to_string(),
        args,
        block_height,
        tx_ref,
    }
}

fn arg_u64(args: &serde_json::Value, key: &str) -> u64 {
    args.get(key).and_then(|v| v.as_u64()).unwrap_or_default()
}

fn arg_str(args: &serde_json::Value, key: &str) -> String {
    args.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn fetch_events(
        &self,
        query: &EventQuery,
    ) -> std::result::Result<Vec<RawLogRecord>, LedgerError> {
        let mut state = self.lock();
        state.calls.push(LedgerCall::FetchEvents {
            from_height: query.from_height,
        });

        if let Some(reason) = &state.fetch_failure {
            return Err(LedgerError::Unavailable(reason.clone()));
        }

        let upper = match query.to {
            crate::ledger::BlockTag::Latest => u64::MAX,
            crate::ledger::BlockTag::Height(h) => h,
        };
        Ok(state
            .records
            .iter()
            .filter(|r| r.block_height >= query.from_height && r.block_height <= upper)
            .cloned()
            .collect())
    }

    async fn read_task(
        &self,
        _contract: &Address,
        id: TaskId,
    ) -> std::result::Result<Task, LedgerError> {
        let mut state = self.lock();
        state.calls.push(LedgerCall::ReadTask(id));

        if state.failing_reads.contains(&id) {
            return Err(LedgerError::Unavailable(format!(
                "scripted read failure for {id}"
            )));
        }
        state
            .tasks
            .get(&id)
            .cloned()
            .ok_or(LedgerError::TaskNotFound(id))
    }
}

#[async_trait]
impl LedgerWriter for MockLedger {
    async fn connected_accounts(&self) -> Vec<Address> {
        self.lock().signer_accounts.clone()
    }

    async fn simulate(
        &self,
        contract: &Address,
        function: &str,
        args: serde_json::Value,
        caller: &Address,
    ) -> std::result::Result<PreparedCall, WriteError> {
        let mut state = self.lock();
        state.calls.push(LedgerCall::Simulate {
            function: function.to_string(),
        });

        if let Some(reason) = state.reverts.get(function) {
            return Err(WriteError::SimulationReverted(reason.clone()));
        }
        Ok(PreparedCall {
            contract: contract.clone(),
            function: function.to_string(),
            args,
            caller: caller.clone(),
        })
    }

    async fn submit(&self, call: &PreparedCall) -> std::result::Result<TxRef, WriteError> {
        let mut state = self.lock();
        state.calls.push(LedgerCall::Submit {
            function: call.function.clone(),
        });

        let tx_ref = TxRef::new(format!("0x{:04x}", state.next_tx));
        state.next_tx += 1;
        state.pending.insert(tx_ref.clone(), call.clone());
        Ok(tx_ref)
    }

    async fn await_confirmation(
        &self,
        tx_ref: &TxRef,
    ) -> std::result::Result<Receipt, WriteError> {
        let mut state = self.lock();
        state.calls.push(LedgerCall::AwaitConfirmation(tx_ref.clone()));

        let call = state
            .pending
            .remove(tx_ref)
            .ok_or_else(|| WriteError::SubmitFailed(format!("unknown transaction {tx_ref}")))?;

        match state.confirmation {
            ConfirmationOutcome::Mined => {
                MockLedger::apply(&mut state, &call, tx_ref);
                let block_height = state.next_height - 1;
                Ok(Receipt {
                    tx_ref: tx_ref.clone(),
                    block_height,
                })
            }
            ConfirmationOutcome::Reverted => {
                Err(WriteError::TransactionReverted(tx_ref.clone()))
            }
            ConfirmationOutcome::Timeout => {
                Err(WriteError::ConfirmationTimeout(tx_ref.clone()))
            }
        }
    }
}

/// A scripted signer for exercising the sign-and-send boundary
pub struct MockSigner {
    accounts: Vec<Address>,
    reject: bool,
    counter: Mutex<u64>,
}

impl MockSigner {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            reject: false,
            counter: Mutex::new(0),
        }
    }

    /// A signer that declines every sign request
    pub fn rejecting(accounts: Vec<Address>) -> Self {
        Self {
            reject: true,
            ..Self::new(accounts)
        }
    }
}

#[async_trait]
impl Signer for MockSigner {
    async fn accounts(&self) -> Vec<Address> {
        self.accounts.clone()
    }

    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, SignerError> {
        if self.accounts.is_empty() {
            return Err(SignerError::NoAccount);
        }
        Ok(self.accounts.clone())
    }

    async fn sign_and_send(
        &self,
        _call: &PreparedCall,
    ) -> std::result::Result<TxRef, SignerError> {
        if self.reject {
            return Err(SignerError::Rejected);
        }
        if self.accounts.is_empty() {
            return Err(SignerError::NoAccount);
        }
        let mut counter = match self.counter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *counter += 1;
        Ok(TxRef::new(format!("0xsigned{:04x}", *counter)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::BlockTag;

    fn contract() -> Address {
        Address::parse("0x00000000000000000000000000000000000000c0").unwrap()
    }

    fn caller() -> Address {
        Address::parse("0x00000000000000000000000000000000000000ca").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_respects_height_range() {
        let ledger = MockLedger::new();
        ledger.push_event(
            EventPayload::Created {
                id: TaskId(1),
                description: "a".into(),
            },
            5,
        );
        ledger.push_event(EventPayload::Completed { id: TaskId(1) }, 20);

        let mut query = EventQuery::full_history(contract());
        query.from_height = 10;
        query.to = BlockTag::Height(25);
        let records = ledger.fetch_events(&query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].block_height, 20);
    }

    #[tokio::test]
    async fn test_scripted_fetch_failure() {
        let ledger = MockLedger::new();
        ledger.fail_fetch("rpc node down");
        let query = EventQuery::full_history(contract());
        assert!(matches!(
            ledger.fetch_events(&query).await,
            Err(LedgerError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_read_task_not_found() {
        let ledger = MockLedger::new();
        let err = ledger.read_task(&contract(), TaskId(4)).await.unwrap_err();
        assert_eq!(err, LedgerError::TaskNotFound(TaskId(4)));
    }

    #[tokio::test]
    async fn test_submitted_create_takes_effect_at_confirmation() {
        let ledger = MockLedger::new();
        let call = ledger
            .simulate(
                &contract(),
                functions::CREATE,
                json!({"description": "buy milk"}),
                &caller(),
            )
            .await
            .unwrap();
        let tx_ref = ledger.submit(&call).await.unwrap();

        // Not visible before confirmation.
        assert!(ledger.read_task(&contract(), TaskId(1)).await.is_err());

        let receipt = ledger.await_confirmation(&tx_ref).await.unwrap();
        assert_eq!(receipt.tx_ref, tx_ref);

        let task = ledger.read_task(&contract(), TaskId(1)).await.unwrap();
        assert_eq!(task.description, "buy milk");
        assert!(!task.completed);
    }

    #[tokio::test]
    async fn test_reverted_confirmation_leaves_state_untouched() {
        let ledger = MockLedger::new();
        ledger.set_confirmation(ConfirmationOutcome::Reverted);

        let call = ledger
            .simulate(
                &contract(),
                functions::CREATE,
                json!({"description": "x"}),
                &caller(),
            )
            .await
            .unwrap();
        let tx_ref = ledger.submit(&call).await.unwrap();
        let err = ledger.await_confirmation(&tx_ref).await.unwrap_err();
        assert!(matches!(err, WriteError::TransactionReverted(_)));
        assert!(ledger.read_task(&contract(), TaskId(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_call_trace_records_invocation_order() {
        let ledger = MockLedger::new();
        let query = EventQuery::full_history(contract());
        let _ = ledger.fetch_events(&query).await;
        let _ = ledger.read_task(&contract(), TaskId(1)).await;

        let calls = ledger.calls();
        assert_eq!(
            calls,
            vec![
                LedgerCall::FetchEvents { from_height: 0 },
                LedgerCall::ReadTask(TaskId(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_signer_issues_distinct_tx_refs() {
        let signer = MockSigner::new(vec![caller()]);
        let call = PreparedCall {
            contract: contract(),
            function: functions::CREATE.to_string(),
            args: json!({"description": "x"}),
            caller: caller(),
        };
        let first = signer.sign_and_send(&call).await.unwrap();
        let second = signer.sign_and_send(&call).await.unwrap();
        assert!(first.0.starts_with("0xsigned"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_rejecting_signer() {
        let signer = MockSigner::rejecting(vec![caller()]);
        let call = PreparedCall {
            contract: contract(),
            function: functions::CREATE.to_string(),
            args: json!({"description": "x"}),
            caller: caller(),
        };
        assert_eq!(
            signer.sign_and_send(&call).await.unwrap_err(),
            SignerError::Rejected
        );
    }
}
