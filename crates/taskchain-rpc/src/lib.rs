//! # Taskchain RPC
//!
//! JSON-RPC implementation of the taskchain ledger traits.
//!
//! [`RpcLedger`] speaks a JSON-RPC 2.0 surface over HTTP: log queries,
//! contract-state calls, dry-run simulation, and receipt polling. Signing
//! stays behind the [`Signer`] capability injected at construction; this
//! crate never holds key material.
//!
//! [`Signer`]: taskchain_core::Signer

pub mod client;
pub mod protocol;

pub use client::{RpcConfig, RpcLedger};
