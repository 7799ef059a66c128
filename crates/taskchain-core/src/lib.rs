//! # Taskchain Core
//!
//! Core traits, types, and errors for the taskchain client stack.
//!
//! This crate provides the foundational abstractions that allow the same
//! reconciliation and write-lifecycle logic to work with both a scripted
//! mock ledger (for testing) and a real JSON-RPC endpoint (taskchain-rpc).
//!
//! ## Key Traits
//!
//! - [`LedgerReader`]: log fetch and authoritative point-reads
//! - [`LedgerWriter`]: simulate → submit → confirmation lifecycle
//! - [`Signer`]: opaque sign-and-send capability for prepared calls
//!
//! ## Key Types
//!
//! - [`Task`]: a task record as the ledger's current state reports it
//! - [`LedgerEvent`]: one decoded entry of the contract's event log
//! - [`SessionContext`]: explicit contract/caller pair passed to every operation

pub mod error;
pub mod event;
pub mod ledger;
pub mod mock;
pub mod session;
pub mod task;

// Re-export main types
pub use error::*;
pub use event::*;
pub use ledger::*;
pub use mock::*;
pub use session::*;
pub use task::*;
