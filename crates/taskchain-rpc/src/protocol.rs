//! Wire types for the ledger's JSON-RPC surface
//!
//! The endpoint decodes contract event arguments server-side, so log
//! entries arrive in the same shape as [`RawLogRecord`] and deserialize
//! into it directly; only the envelope and the write-side result shapes
//! need dedicated types here.
//!
//! [`RawLogRecord`]: taskchain_core::RawLogRecord

use serde::{Deserialize, Serialize};
use serde_json::json;

use taskchain_core::BlockTag;

/// JSON-RPC methods the ledger endpoint answers
pub mod methods {
    pub const GET_LOGS: &str = "ledger_getLogs";
    pub const CALL: &str = "ledger_call";
    pub const SIMULATE: &str = "ledger_simulate";
    pub const GET_RECEIPT: &str = "ledger_getReceipt";
}

/// Error codes the endpoint uses in JSON-RPC error objects
pub mod codes {
    /// Contract execution reverted; `message` carries the revert reason
    pub const EXECUTION_REVERTED: i64 = 3;
    /// Requested entity does not resolve in current state
    pub const NOT_FOUND: i64 = -32001;
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a, P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

impl<'a, P> JsonRpcRequest<'a, P> {
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<R> {
    pub result: Option<R>,
    pub error: Option<RpcErrorObject>,
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Parameters of `ledger_getLogs`
#[derive(Debug, Serialize)]
pub struct GetLogsParams {
    pub contract: String,
    pub events: Vec<&'static str>,
    pub from_height: u64,
    pub to_height: serde_json::Value,
}

/// Parameters of `ledger_call`
#[derive(Debug, Serialize)]
pub struct CallParams {
    pub contract: String,
    pub function: &'static str,
    pub args: serde_json::Value,
}

/// Parameters of `ledger_simulate`
#[derive(Debug, Serialize)]
pub struct SimulateParams {
    pub contract: String,
    pub function: String,
    pub args: serde_json::Value,
    pub caller: String,
}

/// Parameters of `ledger_getReceipt`
#[derive(Debug, Serialize)]
pub struct GetReceiptParams {
    pub tx_ref: String,
}

/// Outcome field of a receipt poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Pending,
    Mined,
    Failed,
}

/// Result of `ledger_getReceipt`
#[derive(Debug, Deserialize)]
pub struct ReceiptResult {
    pub status: ReceiptStatus,
    pub block_height: Option<u64>,
}

/// Encode a block tag for the wire: `"latest"` or a height number
pub fn block_tag_value(tag: BlockTag) -> serde_json::Value {
    match tag {
        BlockTag::Latest => json!("latest"),
        BlockTag::Height(h) => json!(h),
    }
}
