//! JSON-RPC ledger client implementing the core ledger traits
//!
//! [`RpcLedger`] wraps an HTTP JSON-RPC endpoint and the session's
//! [`Signer`] to implement [`LedgerReader`] and [`LedgerWriter`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskchain_rpc::{RpcConfig, RpcLedger};
//!
//! let ledger = RpcLedger::new(
//!     "https://rpc.example.net".parse()?,
//!     Arc::new(wallet_signer),
//!     RpcConfig::default(),
//! )?;
//!
//! let records = ledger.fetch_events(&EventQuery::full_history(contract)).await?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use taskchain_core::{
    Address, EventQuery, LedgerError, LedgerReader, LedgerWriter, PreparedCall, RawLogRecord,
    Receipt, Signer, Task, TaskId, TxRef, WriteError, functions,
};

use crate::protocol::{
    CallParams, GetLogsParams, GetReceiptParams, JsonRpcRequest, JsonRpcResponse, ReceiptStatus,
    ReceiptResult, RpcErrorObject, SimulateParams, block_tag_value, codes, methods,
};

/// Configuration for the RPC ledger client
///
/// The remote endpoint is untrusted and can hang, so every request and
/// the overall confirmation wait carry bounded timeouts.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Overall bound on waiting for a transaction to reach an outcome
    pub confirmation_timeout: Duration,
    /// Delay between receipt polls
    pub poll_interval: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            confirmation_timeout: Duration::from_secs(90),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Failure of one JSON-RPC round-trip, before mapping to a domain error
enum RpcFailure {
    /// HTTP-level failure or undecodable body
    Transport(String),
    /// Well-formed JSON-RPC error from the endpoint
    Endpoint(RpcErrorObject),
}

/// JSON-RPC gateway to the remote ledger
///
/// Pure reads (`fetch_events`, `read_task`) go straight to the endpoint.
/// Writes simulate against the endpoint, then hand the prepared call to
/// the injected [`Signer`]; this client never retries a submission.
pub struct RpcLedger {
    http: reqwest::Client,
    endpoint: Url,
    signer: Arc<dyn Signer>,
    config: RpcConfig,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub fn new(
        endpoint: Url,
        signer: Arc<dyn Signer>,
        config: RpcConfig,
    ) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LedgerError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            signer,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// The signer this client submits through
    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    async fn request<P, R>(&self, method: &str, params: P) -> Result<R, RpcFailure>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = JsonRpcRequest::new(id, method, params);
        debug!(method, id, "rpc request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&envelope)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(e.to_string()))?;

        let body: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(format!("invalid response body: {e}")))?;

        if let Some(error) = body.error {
            return Err(RpcFailure::Endpoint(error));
        }
        body.result
            .ok_or_else(|| RpcFailure::Transport("response carries neither result nor error".into()))
    }
}

#[async_trait]
impl LedgerReader for RpcLedger {
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<RawLogRecord>, LedgerError> {
        // One logical query for every requested kind; the endpoint answers
        // completely or the whole fetch fails.
        let params = GetLogsParams {
            contract: query.contract.to_string(),
            events: query.kinds.iter().map(|k| k.signature()).collect(),
            from_height: query.from_height,
            to_height: block_tag_value(query.to),
        };

        match self.request::<_, Vec<RawLogRecord>>(methods::GET_LOGS, params).await {
            Ok(records) => {
                debug!(count = records.len(), "fetched log records");
                Ok(records)
            }
            Err(RpcFailure::Transport(msg)) => {
                warn!(%msg, "log fetch failed");
                Err(LedgerError::Unavailable(msg))
            }
            Err(RpcFailure::Endpoint(e)) => {
                warn!(code = e.code, message = %e.message, "log fetch rejected");
                Err(LedgerError::Unavailable(e.message))
            }
        }
    }

    async fn read_task(&self, contract: &Address, id: TaskId) -> Result<Task, LedgerError> {
        let params = CallParams {
            contract: contract.to_string(),
            function: functions::GET,
            args: json!({"id": id.0}),
        };

        match self.request::<_, Task>(methods::CALL, params).await {
            Ok(task) => Ok(task),
            Err(RpcFailure::Endpoint(e))
                if e.code == codes::NOT_FOUND || e.code == codes::EXECUTION_REVERTED =>
            {
                Err(LedgerError::TaskNotFound(id))
            }
            Err(RpcFailure::Endpoint(e)) => Err(LedgerError::Unavailable(e.message)),
            Err(RpcFailure::Transport(msg)) => Err(LedgerError::Unavailable(msg)),
        }
    }
}

#[async_trait]
impl LedgerWriter for RpcLedger {
    async fn connected_accounts(&self) -> Vec<Address> {
        self.signer.accounts().await
    }

    async fn simulate(
        &self,
        contract: &Address,
        function: &str,
        args: serde_json::Value,
        caller: &Address,
    ) -> Result<PreparedCall, WriteError> {
        let params = SimulateParams {
            contract: contract.to_string(),
            function: function.to_string(),
            args: args.clone(),
            caller: caller.to_string(),
        };

        match self
            .request::<_, serde_json::Value>(methods::SIMULATE, params)
            .await
        {
            Ok(_) => Ok(PreparedCall {
                contract: contract.clone(),
                function: function.to_string(),
                args,
                caller: caller.clone(),
            }),
            Err(RpcFailure::Endpoint(e)) if e.code == codes::EXECUTION_REVERTED => {
                debug!(function, reason = %e.message, "simulation reverted");
                Err(WriteError::SimulationReverted(e.message))
            }
            Err(RpcFailure::Endpoint(e)) => {
                Err(WriteError::Ledger(LedgerError::Unavailable(e.message)))
            }
            Err(RpcFailure::Transport(msg)) => {
                Err(WriteError::Ledger(LedgerError::Unavailable(msg)))
            }
        }
    }

    async fn submit(&self, call: &PreparedCall) -> Result<TxRef, WriteError> {
        let tx_ref = self.signer.sign_and_send(call).await?;
        debug!(function = %call.function, %tx_ref, "transaction submitted");
        Ok(tx_ref)
    }

    async fn await_confirmation(&self, tx_ref: &TxRef) -> Result<Receipt, WriteError> {
        let deadline = tokio::time::Instant::now() + self.config.confirmation_timeout;

        loop {
            let params = GetReceiptParams {
                tx_ref: tx_ref.to_string(),
            };
            match self
                .request::<_, ReceiptResult>(methods::GET_RECEIPT, params)
                .await
            {
                Ok(receipt) => {
                    if let Some(outcome) = poll_outcome(tx_ref, receipt) {
                        return outcome;
                    }
                }
                // Poll errors don't abort the wait; the deadline decides.
                Err(RpcFailure::Transport(msg)) => {
                    warn!(%tx_ref, %msg, "receipt poll failed");
                }
                Err(RpcFailure::Endpoint(e)) => {
                    warn!(%tx_ref, code = e.code, message = %e.message, "receipt poll rejected");
                }
            }

            if tokio::time::Instant::now() + self.config.poll_interval > deadline {
                return Err(WriteError::ConfirmationTimeout(tx_ref.clone()));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

/// Interpret one receipt poll: `Some` ends the wait, `None` polls again.
///
/// A mined receipt must carry its block height; one without it is an
/// inconsistent provider response and is treated like a failed poll
/// rather than confirmed at a made-up height.
fn poll_outcome(tx_ref: &TxRef, receipt: ReceiptResult) -> Option<Result<Receipt, WriteError>> {
    match (receipt.status, receipt.block_height) {
        (ReceiptStatus::Mined, Some(block_height)) => {
            debug!(%tx_ref, block_height, "transaction mined");
            Some(Ok(Receipt {
                tx_ref: tx_ref.clone(),
                block_height,
            }))
        }
        (ReceiptStatus::Mined, None) => {
            warn!(%tx_ref, "mined receipt without block height");
            None
        }
        (ReceiptStatus::Failed, _) => Some(Err(WriteError::TransactionReverted(tx_ref.clone()))),
        (ReceiptStatus::Pending, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskchain_core::MockSigner;

    fn unreachable_ledger(signer: MockSigner) -> RpcLedger {
        RpcLedger::new(
            "http://127.0.0.1:1/".parse().unwrap(),
            Arc::new(signer),
            RpcConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_config_defaults_are_bounded() {
        let config = RpcConfig::default();
        assert!(config.request_timeout > Duration::ZERO);
        assert!(config.confirmation_timeout > config.poll_interval);
    }

    #[tokio::test]
    async fn test_submit_without_account_is_rejected_before_transport() {
        // The signer fails first, so no network is touched.
        let ledger = unreachable_ledger(MockSigner::new(vec![]));
        let call = PreparedCall {
            contract: Address::parse("0x00000000000000000000000000000000000000c0").unwrap(),
            function: functions::CREATE.to_string(),
            args: json!({"description": "x"}),
            caller: Address::parse("0x00000000000000000000000000000000000000ca").unwrap(),
        };
        assert_eq!(
            ledger.submit(&call).await.unwrap_err(),
            WriteError::SignerRejected
        );
    }

    fn tx() -> TxRef {
        TxRef::new("0xabc123")
    }

    #[test]
    fn test_mined_receipt_yields_its_height() {
        let receipt = ReceiptResult {
            status: ReceiptStatus::Mined,
            block_height: Some(42),
        };
        let outcome = poll_outcome(&tx(), receipt).unwrap().unwrap();
        assert_eq!(outcome.block_height, 42);
        assert_eq!(outcome.tx_ref, tx());
    }

    #[test]
    fn test_mined_receipt_without_height_keeps_polling() {
        // No height is fabricated; the poll is discarded and the
        // deadline eventually yields ConfirmationTimeout.
        let receipt = ReceiptResult {
            status: ReceiptStatus::Mined,
            block_height: None,
        };
        assert!(poll_outcome(&tx(), receipt).is_none());
    }

    #[test]
    fn test_failed_receipt_is_a_revert() {
        let receipt = ReceiptResult {
            status: ReceiptStatus::Failed,
            block_height: Some(7),
        };
        assert_eq!(
            poll_outcome(&tx(), receipt).unwrap().unwrap_err(),
            WriteError::TransactionReverted(tx())
        );
    }

    #[test]
    fn test_pending_receipt_keeps_polling() {
        let receipt = ReceiptResult {
            status: ReceiptStatus::Pending,
            block_height: None,
        };
        assert!(poll_outcome(&tx(), receipt).is_none());
    }

    #[tokio::test]
    async fn test_signer_rejection_maps_to_write_error() {
        let caller = Address::parse("0x00000000000000000000000000000000000000ca").unwrap();
        let ledger = unreachable_ledger(MockSigner::rejecting(vec![caller.clone()]));
        let call = PreparedCall {
            contract: Address::parse("0x00000000000000000000000000000000000000c0").unwrap(),
            function: functions::COMPLETE.to_string(),
            args: json!({"id": 1}),
            caller,
        };
        assert_eq!(
            ledger.submit(&call).await.unwrap_err(),
            WriteError::SignerRejected
        );
    }
}
