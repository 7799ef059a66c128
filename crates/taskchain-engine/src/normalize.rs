//! Event normalization
//!
//! Converts the endpoint's raw, unordered log records into the typed
//! event feed: decode every record, then order by block height with the
//! most recent first. No deduplication happens here — a task that was
//! created, updated, and completed contributes three feed entries, which
//! is the user-facing history, not the reconciled entity state.

use taskchain_core::{LedgerError, LedgerEvent, RawLogRecord};

/// Decode and order raw log records into the event feed.
///
/// The sort is stable and descending by `block_height`; records at equal
/// heights keep their retrieval order. A single undecodable record fails
/// the whole pass — a feed silently missing entries would defeat the
/// completeness guarantee of the created-id scan downstream.
pub fn normalize(records: Vec<RawLogRecord>) -> Result<Vec<LedgerEvent>, LedgerError> {
    let mut events = records
        .iter()
        .map(LedgerEvent::decode)
        .collect::<Result<Vec<_>, _>>()?;
    events.sort_by(|a, b| b.block_height.cmp(&a.block_height));
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskchain_core::{EventKind, EventPayload, TaskId, TxRef};

    fn raw(event: &str, args: serde_json::Value, height: u64, tx: &str) -> RawLogRecord {
        RawLogRecord {
            event: event.to_string(),
            args,
            block_height: height,
            tx_ref: TxRef::new(tx),
        }
    }

    #[test]
    fn test_feed_is_sorted_most_recent_first() {
        let records = vec![
            raw("TaskCreated", json!({"id": 1, "description": "a"}), 10, "0x1"),
            raw("TaskCompleted", json!({"id": 1}), 30, "0x3"),
            raw("TaskUpdated", json!({"id": 1, "description": "b"}), 20, "0x2"),
        ];
        let events = normalize(records).unwrap();
        let heights: Vec<u64> = events.iter().map(|e| e.block_height).collect();
        assert_eq!(heights, vec![30, 20, 10]);
    }

    #[test]
    fn test_equal_heights_keep_retrieval_order() {
        let records = vec![
            raw("TaskCreated", json!({"id": 1, "description": "a"}), 5, "0x1"),
            raw("TaskCreated", json!({"id": 2, "description": "b"}), 5, "0x2"),
            raw("TaskCreated", json!({"id": 3, "description": "c"}), 5, "0x3"),
        ];
        let events = normalize(records).unwrap();
        let ids: Vec<TaskId> = events.iter().map(|e| e.task_id()).collect();
        assert_eq!(ids, vec![TaskId(1), TaskId(2), TaskId(3)]);
    }

    #[test]
    fn test_no_deduplication() {
        // One task's full lifecycle stays three distinct feed entries.
        let records = vec![
            raw("TaskCreated", json!({"id": 7, "description": "a"}), 1, "0x1"),
            raw("TaskUpdated", json!({"id": 7, "description": "b"}), 2, "0x2"),
            raw("TaskCompleted", json!({"id": 7}), 3, "0x3"),
        ];
        let events = normalize(records).unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.task_id() == TaskId(7)));
    }

    #[test]
    fn test_undecodable_record_fails_the_pass() {
        let records = vec![
            raw("TaskCreated", json!({"id": 1, "description": "a"}), 1, "0x1"),
            raw("TaskRenamed", json!({"id": 1}), 2, "0x2"),
        ];
        assert!(matches!(normalize(records), Err(LedgerError::Decode(_))));
    }

    #[test]
    fn test_completed_entries_render_id_only() {
        let records = vec![raw("TaskCompleted", json!({"id": 4}), 9, "0x9")];
        let events = normalize(records).unwrap();
        assert_eq!(events[0].kind(), EventKind::Completed);
        assert_eq!(events[0].description(), None);
        assert_eq!(
            events[0].payload,
            EventPayload::Completed { id: TaskId(4) }
        );
    }
}
