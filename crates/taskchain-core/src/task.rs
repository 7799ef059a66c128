//! Task entities

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ledger-assigned task identifier
///
/// Immutable and unique for the lifetime of the contract. Ordering is
/// numeric, which is also the presentation order of reconstructed sets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        TaskId(id)
    }
}

/// A task record as reported by the ledger's current state
///
/// The authoritative value of a task is always whatever a point-read
/// returns for its id; event payloads are never folded into this struct.
/// `completed` is monotonic: once true it never reverts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub completed: bool,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, description: impl Into<String>, completed: bool) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            completed,
        }
    }
}
