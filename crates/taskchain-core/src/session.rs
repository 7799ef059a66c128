//! Session context
//!
//! The connected account and target contract are passed explicitly to
//! every core operation instead of being read from ambient state, so the
//! same code serves any number of independent sessions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 20-byte ledger address, held as normalized lowercase 0x-hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

/// Address string that is not 0x-prefixed 20-byte hex
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid address: {0}")]
pub struct InvalidAddress(pub String);

impl Address {
    pub fn parse(s: &str) -> std::result::Result<Self, InvalidAddress> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| InvalidAddress(s.to_string()))?;
        let bytes = hex::decode(hex_part).map_err(|_| InvalidAddress(s.to_string()))?;
        if bytes.len() != 20 {
            return Err(InvalidAddress(s.to_string()));
        }
        Ok(Address(format!("0x{}", hex_part.to_lowercase())))
    }

    /// The all-zero address
    pub fn zero() -> Self {
        Address(format!("0x{}", "00".repeat(20)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The contract under view and the account issuing writes
///
/// Owned by the top-level application scope and handed to the engine at
/// construction; core operations never consult globals for either value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub contract: Address,
    pub caller: Address,
}

impl SessionContext {
    pub fn new(contract: Address, caller: Address) -> Self {
        Self { contract, caller }
    }
}
