// ============================================================================
// Event Store - Persistence Layer
// ============================================================================
//
// Generic persistence over one append-only table. Works with ANY event
// payload: data and metadata are opaque serialized strings, so nothing in
// this module depends on the domain model or the serialization format.
//
// ============================================================================

mod import;
pub mod model;
pub mod persistence;
pub mod schema;
pub mod stream;

pub use model::{CommittedEvent, CommittedEventsPage, GlobalPosition, SerializedEvent};
pub use persistence::EventPersistence;
pub use stream::EventStream;
