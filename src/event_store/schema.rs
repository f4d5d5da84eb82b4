use sqlx::PgPool;

use crate::error::EventStoreError;

// ============================================================================
// Schema Bootstrap
// ============================================================================

/// Create the event journal table if it does not exist.
///
/// The identity column owns global ordering; the named uniqueness constraint
/// on (aggregate_id, aggregate_sequence_number) is what turns a concurrent
/// double-commit into a detectable conflict instead of a silent gap or
/// duplicate.
pub async fn initialize(pool: &PgPool) -> Result<(), EventStoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_journal (
            global_sequence_number BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
            batch_id UUID NOT NULL,
            aggregate_id VARCHAR(255) NOT NULL,
            aggregate_name VARCHAR(255) NOT NULL,
            data TEXT NOT NULL,
            metadata TEXT NOT NULL,
            aggregate_sequence_number INT NOT NULL,
            CONSTRAINT uq_event_journal_aggregate_sequence
                UNIQUE (aggregate_id, aggregate_sequence_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Event journal schema initialized");
    Ok(())
}
