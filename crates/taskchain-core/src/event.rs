//! Ledger events
//!
//! Raw log records arrive from the ledger endpoint as loosely typed
//! name-plus-arguments payloads. [`LedgerEvent::decode`] maps them into
//! the closed [`EventPayload`] variant set; unrecognized event names are
//! rejected rather than passed through.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::task::TaskId;

/// Opaque reference to a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxRef(pub String);

impl TxRef {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three event kinds the task contract emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Created,
    Updated,
    Completed,
}

impl EventKind {
    /// All kinds, in the order they are requested from the endpoint
    pub const ALL: [EventKind; 3] = [EventKind::Created, EventKind::Updated, EventKind::Completed];

    /// The event name as it appears in raw log records
    pub fn signature(&self) -> &'static str {
        match self {
            EventKind::Created => "TaskCreated",
            EventKind::Updated => "TaskUpdated",
            EventKind::Completed => "TaskCompleted",
        }
    }
}

/// One raw log record as returned by the ledger's query surface
///
/// `args` holds the endpoint's already-decoded argument map; shape
/// validation happens in [`LedgerEvent::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogRecord {
    pub event: String,
    pub args: serde_json::Value,
    pub block_height: u64,
    pub tx_ref: TxRef,
}

/// Typed payload of a decoded ledger event
///
/// `Completed` carries no description: the contract's completion event
/// does not emit one, and the feed renders those entries id-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    Created { id: TaskId, description: String },
    Updated { id: TaskId, description: String },
    Completed { id: TaskId },
}

/// One decoded, immutable entry of the contract's event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub payload: EventPayload,
    pub block_height: u64,
    pub tx_ref: TxRef,
}

impl LedgerEvent {
    /// Decode a raw record into its typed variant.
    ///
    /// Fails with [`LedgerError::Decode`] for unrecognized event names or
    /// missing/mistyped arguments.
    pub fn decode(raw: &RawLogRecord) -> std::result::Result<Self, LedgerError> {
        let payload = match raw.event.as_str() {
            "TaskCreated" => EventPayload::Created {
                id: decode_id(raw)?,
                description: decode_description(raw)?,
            },
            "TaskUpdated" => EventPayload::Updated {
                id: decode_id(raw)?,
                description: decode_description(raw)?,
            },
            "TaskCompleted" => EventPayload::Completed {
                id: decode_id(raw)?,
            },
            other => {
                return Err(LedgerError::Decode(format!(
                    "unrecognized event name: {other}"
                )));
            }
        };

        Ok(LedgerEvent {
            payload,
            block_height: raw.block_height,
            tx_ref: raw.tx_ref.clone(),
        })
    }

    /// The kind of this event
    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::Created { .. } => EventKind::Created,
            EventPayload::Updated { .. } => EventKind::Updated,
            EventPayload::Completed { .. } => EventKind::Completed,
        }
    }

    /// The task this event references
    pub fn task_id(&self) -> TaskId {
        match self.payload {
            EventPayload::Created { id, .. } => id,
            EventPayload::Updated { id, .. } => id,
            EventPayload::Completed { id } => id,
        }
    }

    /// The description the event carries, if its kind emits one
    pub fn description(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Created { description, .. } => Some(description),
            EventPayload::Updated { description, .. } => Some(description),
            EventPayload::Completed { .. } => None,
        }
    }
}

fn decode_id(raw: &RawLogRecord) -> std::result::Result<TaskId, LedgerError> {
    raw.args
        .get("id")
        .and_then(|v| v.as_u64())
        .map(TaskId)
        .ok_or_else(|| {
            LedgerError::Decode(format!("{}: missing or non-integer 'id'", raw.event))
        })
}

fn decode_description(raw: &RawLogRecord) -> std::result::Result<String, LedgerError> {
    raw.args
        .get("description")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or_else(|| {
            LedgerError::Decode(format!("{}: missing or non-string 'description'", raw.event))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(event: &str, args: serde_json::Value, height: u64) -> RawLogRecord {
        RawLogRecord {
            event: event.to_string(),
            args,
            block_height: height,
            tx_ref: TxRef::new(format!("0x{height:02x}")),
        }
    }

    #[test]
    fn test_decode_created() {
        let record = raw("TaskCreated", json!({"id": 1, "description": "buy milk"}), 10);
        let event = LedgerEvent::decode(&record).unwrap();
        assert_eq!(event.kind(), EventKind::Created);
        assert_eq!(event.task_id(), TaskId(1));
        assert_eq!(event.description(), Some("buy milk"));
        assert_eq!(event.block_height, 10);
    }

    #[test]
    fn test_decode_updated() {
        let record = raw("TaskUpdated", json!({"id": 2, "description": "v2"}), 11);
        let event = LedgerEvent::decode(&record).unwrap();
        assert_eq!(event.kind(), EventKind::Updated);
        assert_eq!(event.description(), Some("v2"));
    }

    #[test]
    fn test_completed_has_no_description() {
        // The completion event emits no description; the decoded entry is
        // structurally id-only, not empty-string.
        let record = raw("TaskCompleted", json!({"id": 3}), 12);
        let event = LedgerEvent::decode(&record).unwrap();
        assert_eq!(event.kind(), EventKind::Completed);
        assert_eq!(event.task_id(), TaskId(3));
        assert_eq!(event.description(), None);
    }

    #[test]
    fn test_decode_rejects_unknown_event_name() {
        let record = raw("TaskArchived", json!({"id": 4}), 13);
        let err = LedgerEvent::decode(&record).unwrap_err();
        assert!(matches!(err, LedgerError::Decode(_)));
        assert!(format!("{}", err).contains("TaskArchived"));
    }

    #[test]
    fn test_decode_rejects_malformed_args() {
        let record = raw("TaskCreated", json!({"id": "one", "description": "x"}), 14);
        assert!(matches!(
            LedgerEvent::decode(&record),
            Err(LedgerError::Decode(_))
        ));

        let record = raw("TaskUpdated", json!({"id": 5}), 15);
        assert!(matches!(
            LedgerEvent::decode(&record),
            Err(LedgerError::Decode(_))
        ));
    }

    #[test]
    fn test_event_kind_signatures() {
        assert_eq!(EventKind::Created.signature(), "TaskCreated");
        assert_eq!(EventKind::Updated.signature(), "TaskUpdated");
        assert_eq!(EventKind::Completed.signature(), "TaskCompleted");
    }
}
