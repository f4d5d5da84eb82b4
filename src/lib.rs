// ============================================================================
// pg-eventstore - Append-Only Event Store Persistence Engine
// ============================================================================
//
// Durably records serialized domain events in a single PostgreSQL table,
// assigns each event a storage-owned global sequence number, and exposes
// per-aggregate reads, global paged reads, a resumable streaming cursor,
// bulk import, and whole-aggregate deletion.
//
// Key Principles:
// - Append-only: events are immutable once committed; the only mutation is
//   deleting every event of one aggregate
// - Global order is owned by the storage layer's identity column and is never
//   computed or predicted client-side
// - Per-aggregate order is enforced by a uniqueness constraint on
//   (aggregate_id, aggregate_sequence_number); a violated constraint is
//   surfaced as an optimistic concurrency conflict
//
// ============================================================================

pub mod config;
pub mod error;
pub mod event_store;

// Re-export the public surface for convenience
pub use config::EventStoreConfig;
pub use error::EventStoreError;
pub use event_store::{
    CommittedEvent, CommittedEventsPage, EventPersistence, EventStream, GlobalPosition,
    SerializedEvent,
};
