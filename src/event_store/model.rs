use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Event Store Models
// ============================================================================
//
// The durable row shape plus the input/output types of the persistence
// operations. Payload and metadata stay opaque strings; serialization is a
// collaborator's concern.
//
// ============================================================================

/// A committed event exactly as it sits in the event journal table.
///
/// `global_sequence_number` is assigned by the storage layer's identity
/// column at commit time and defines the total order across all aggregates.
/// `aggregate_sequence_number` is caller-assigned, 1-based, and contiguous
/// within one aggregate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct CommittedEvent {
    pub global_sequence_number: i64,
    pub batch_id: Uuid,
    pub aggregate_id: String,
    pub aggregate_name: String,
    pub data: String,
    pub metadata: String,
    pub aggregate_sequence_number: i32,
}

/// A serialized event handed to the engine for committing or importing.
/// Carries everything the row needs except the global sequence number,
/// which only the storage layer may assign.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SerializedEvent {
    pub aggregate_id: String,
    pub aggregate_name: String,
    pub batch_id: Uuid,
    pub serialized_data: String,
    pub serialized_metadata: String,
    pub aggregate_sequence_number: i32,
}

impl SerializedEvent {
    pub fn new(
        aggregate_id: impl Into<String>,
        aggregate_name: impl Into<String>,
        batch_id: Uuid,
        serialized_data: impl Into<String>,
        serialized_metadata: impl Into<String>,
        aggregate_sequence_number: i32,
    ) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            aggregate_name: aggregate_name.into(),
            batch_id,
            serialized_data: serialized_data.into(),
            serialized_metadata: serialized_metadata.into(),
            aggregate_sequence_number,
        }
    }
}

/// Resumable position in the global event order.
///
/// `START` reads from the beginning of the store; any other value is a
/// `next_position` previously returned by the pager.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalPosition(Option<i64>);

impl GlobalPosition {
    pub const START: GlobalPosition = GlobalPosition(None);

    pub fn from_sequence_number(sequence_number: i64) -> Self {
        Self(Some(sequence_number))
    }

    pub fn is_start(&self) -> bool {
        self.0.is_none()
    }

    /// The first global sequence number covered by this position.
    pub fn start_position(&self) -> i64 {
        self.0.unwrap_or(0)
    }
}

/// One page of the global event order, plus the position to resume from.
#[derive(Clone, Debug)]
pub struct CommittedEventsPage {
    pub next_position: GlobalPosition,
    pub events: Vec<CommittedEvent>,
}

impl CommittedEventsPage {
    /// An empty page leaves the position unchanged so repeating the call is
    /// idempotent; otherwise the cursor resumes just past the highest
    /// returned global sequence number.
    pub(crate) fn new(start_position: i64, events: Vec<CommittedEvent>) -> Self {
        let next_position = events
            .iter()
            .map(|e| e.global_sequence_number)
            .max()
            .map(|max| max + 1)
            .unwrap_or(start_position);

        Self {
            next_position: GlobalPosition::from_sequence_number(next_position),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(global: i64, aggregate_sequence: i32) -> CommittedEvent {
        CommittedEvent {
            global_sequence_number: global,
            batch_id: Uuid::new_v4(),
            aggregate_id: "order-1".to_string(),
            aggregate_name: "Order".to_string(),
            data: serde_json::json!({"kind": "created"}).to_string(),
            metadata: serde_json::json!({}).to_string(),
            aggregate_sequence_number: aggregate_sequence,
        }
    }

    #[test]
    fn test_start_position_is_zero() {
        assert!(GlobalPosition::START.is_start());
        assert_eq!(GlobalPosition::START.start_position(), 0);
    }

    #[test]
    fn test_explicit_position_round_trips() {
        let position = GlobalPosition::from_sequence_number(17);
        assert!(!position.is_start());
        assert_eq!(position.start_position(), 17);
    }

    #[test]
    fn test_page_advances_past_highest_event() {
        let page = CommittedEventsPage::new(0, vec![committed(3, 1), committed(7, 2)]);
        assert_eq!(page.next_position, GlobalPosition::from_sequence_number(8));
    }

    #[test]
    fn test_empty_page_keeps_position_unchanged() {
        let page = CommittedEventsPage::new(42, Vec::new());
        assert_eq!(page.next_position, GlobalPosition::from_sequence_number(42));
        assert!(page.events.is_empty());
    }

    #[test]
    fn test_resuming_from_next_position_skips_returned_events() {
        // Pager resumability: a follow-up window starting at next_position
        // must not include any event already returned.
        let page = CommittedEventsPage::new(0, vec![committed(1, 1), committed(2, 2)]);
        let resume_from = page.next_position.start_position();

        for event in &page.events {
            assert!(event.global_sequence_number < resume_from);
        }
    }

    #[test]
    fn test_serialized_event_construction() {
        let batch_id = Uuid::new_v4();
        let event = SerializedEvent::new("order-1", "Order", batch_id, "{}", "{}", 1);

        assert_eq!(event.aggregate_id, "order-1");
        assert_eq!(event.aggregate_name, "Order");
        assert_eq!(event.batch_id, batch_id);
        assert_eq!(event.aggregate_sequence_number, 1);
    }
}
