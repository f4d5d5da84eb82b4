use futures_util::stream::{self, Stream};
use sqlx::PgPool;

use crate::error::EventStoreError;

use super::model::CommittedEvent;

// ============================================================================
// Streaming Cursor - Batched Reads Over One Aggregate
// ============================================================================
//
// A resumable, single-pass cursor for callers that must not hold an
// aggregate's full history in memory. Each step ranks the aggregate's
// matching events by aggregate sequence number and fetches one row window,
// so the backend needs no native server-side cursor support.
//
// The cursor is explicit finite state: a row offset that advances by the
// batch size and an exhausted flag set once a short batch signals the end of
// data. Once exhausted it cannot be restarted; open a fresh stream to
// re-read.
//
// ============================================================================

const BATCH_SQL: &str = r#"
    SELECT global_sequence_number, batch_id, aggregate_id, aggregate_name,
           data, metadata, aggregate_sequence_number
    FROM (
        SELECT global_sequence_number, batch_id, aggregate_id, aggregate_name,
               data, metadata, aggregate_sequence_number,
               ROW_NUMBER() OVER (ORDER BY aggregate_sequence_number ASC) AS event_rank
        FROM event_journal
        WHERE aggregate_id = $1 AND aggregate_sequence_number >= $2
    ) AS ranked
    WHERE event_rank > $3 AND event_rank <= $3 + $4
    ORDER BY event_rank ASC
"#;

pub struct EventStream {
    pool: PgPool,
    aggregate_id: String,
    from_sequence_number: i32,
    batch_size: i64,
    current_row_offset: i64,
    exhausted: bool,
}

impl EventStream {
    pub(crate) fn new(
        pool: PgPool,
        aggregate_id: String,
        from_sequence_number: i32,
        batch_size: i64,
    ) -> Self {
        Self {
            pool,
            aggregate_id,
            from_sequence_number,
            batch_size,
            current_row_offset: 0,
            exhausted: false,
        }
    }

    /// Fetch the next batch of events, or `None` once the stream is
    /// exhausted. A batch shorter than the configured batch size is the last
    /// one; an empty final batch is reported as `None` rather than an empty
    /// collection.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<CommittedEvent>>, EventStoreError> {
        if self.exhausted {
            return Ok(None);
        }

        let events = sqlx::query_as::<_, CommittedEvent>(BATCH_SQL)
            .bind(&self.aggregate_id)
            .bind(self.from_sequence_number)
            .bind(self.current_row_offset)
            .bind(self.batch_size)
            .fetch_all(&self.pool)
            .await?;

        self.advance(events.len());

        tracing::debug!(
            aggregate_id = %self.aggregate_id,
            batch_len = events.len(),
            exhausted = self.exhausted,
            "Fetched event stream batch"
        );

        if events.is_empty() {
            Ok(None)
        } else {
            Ok(Some(events))
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Adapt the cursor to a lazy `Stream` of batches.
    pub fn into_stream(
        self,
    ) -> impl Stream<Item = Result<Vec<CommittedEvent>, EventStoreError>> {
        stream::try_unfold(self, |mut cursor| async move {
            Ok(cursor.next_batch().await?.map(|batch| (batch, cursor)))
        })
    }

    // Advance rule: the offset always moves by the full batch size, and a
    // short batch marks the end of data.
    fn advance(&mut self, fetched: usize) {
        self.current_row_offset += self.batch_size;
        self.exhausted = (fetched as i64) < self.batch_size;
    }
}
