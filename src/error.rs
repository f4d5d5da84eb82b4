// ============================================================================
// Event Store Errors
// ============================================================================
//
// Two classified failure kinds plus cooperative cancellation:
//
// - OptimisticConcurrency: the aggregate sequence uniqueness constraint was
//   violated during a commit. Expected under concurrent writers; the caller
//   reloads the aggregate, recomputes sequence numbers, and retries.
// - Storage: any other storage-layer failure. Propagated unchanged, never
//   retried internally.
// - ImportCancelled: the bulk import session observed its cancellation
//   signal between batches.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    #[error("optimistic concurrency conflict for aggregate '{aggregate_id}'")]
    OptimisticConcurrency {
        aggregate_id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("bulk import cancelled after {imported} events")]
    ImportCancelled { imported: u64 },
}

impl EventStoreError {
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::OptimisticConcurrency { .. })
    }

    /// Classify a commit-path failure. A unique-constraint violation reported
    /// by the driver means a concurrent writer already committed one of the
    /// batch's (aggregate_id, aggregate_sequence_number) pairs; anything else
    /// is a plain storage failure.
    pub(crate) fn classify_commit(aggregate_id: &str, source: sqlx::Error) -> Self {
        let unique_violation = source
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);

        if unique_violation {
            EventStoreError::OptimisticConcurrency {
                aggregate_id: aggregate_id.to_string(),
                source,
            }
        } else {
            EventStoreError::Storage(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    // Minimal driver error reporting a violated unique constraint, the way
    // the PostgreSQL driver reports error 23505.
    #[derive(Debug)]
    struct UniqueViolation;

    impl std::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint")
        }
    }

    impl StdError for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn constraint(&self) -> Option<&str> {
            Some("uq_event_journal_aggregate_sequence")
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_unique_violation_classifies_as_concurrency_conflict() {
        let source = sqlx::Error::Database(Box::new(UniqueViolation));
        let err = EventStoreError::classify_commit("order-1", source);

        assert!(err.is_concurrency_conflict());
        match err {
            EventStoreError::OptimisticConcurrency { aggregate_id, .. } => {
                assert_eq!(aggregate_id, "order-1");
            }
            other => panic!("expected concurrency conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_non_unique_violation_classifies_as_storage() {
        let err = EventStoreError::classify_commit("order-1", sqlx::Error::RowNotFound);
        assert!(!err.is_concurrency_conflict());
        assert!(matches!(err, EventStoreError::Storage(_)));
    }

    #[test]
    fn test_conflict_display_names_the_aggregate() {
        let err = EventStoreError::OptimisticConcurrency {
            aggregate_id: "order-1".to_string(),
            source: sqlx::Error::RowNotFound,
        };
        assert!(err.is_concurrency_conflict());
        assert!(err.to_string().contains("order-1"));
    }

    #[test]
    fn test_import_cancelled_reports_count() {
        let err = EventStoreError::ImportCancelled { imported: 42 };
        assert!(err.to_string().contains("42"));
    }
}
