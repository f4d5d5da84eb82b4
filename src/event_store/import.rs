use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::EventStoreError;

use super::model::SerializedEvent;
use super::persistence::EventPersistence;

// ============================================================================
// Bulk Importer - High-Throughput Migration Path
// ============================================================================
//
// Drains a channel of externally produced event batches and writes each one
// through PostgreSQL COPY instead of row-by-row inserts. The global sequence
// number is omitted from the column list so the identity column assigns it,
// keeping global ordering invariants intact even under bulk load.
//
// This path is for trusted, non-concurrent migration: it carries no
// optimistic-concurrency classification. One pooled connection is held for
// the entire streamed session.
//
// ============================================================================

const COPY_SQL: &str = "COPY event_journal \
    (batch_id, aggregate_id, aggregate_name, data, metadata, aggregate_sequence_number) \
    FROM STDIN";

impl EventPersistence {
    /// Import event batches until the channel closes, returning the total
    /// number of imported events. Cancellation is checked between batches;
    /// the in-flight COPY always runs to completion.
    pub async fn import_events(
        &self,
        mut batches: mpsc::Receiver<Vec<SerializedEvent>>,
        cancellation: CancellationToken,
    ) -> Result<u64, EventStoreError> {
        let mut imported: u64 = 0;

        if cancellation.is_cancelled() {
            return Err(EventStoreError::ImportCancelled { imported });
        }

        let started = Instant::now();
        let mut connection = self.pool.acquire().await?;

        loop {
            let batch = tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    tracing::info!(imported, "Bulk import cancelled");
                    return Err(EventStoreError::ImportCancelled { imported });
                }
                batch = batches.recv() => match batch {
                    Some(batch) => batch,
                    None => break,
                },
            };

            if batch.is_empty() {
                continue;
            }

            let mut buffer = String::new();
            for event in &batch {
                push_copy_row(&mut buffer, event);
            }

            let mut copy = connection.copy_in_raw(COPY_SQL).await?;
            copy.send(buffer.as_bytes()).await?;
            copy.finish().await?;

            imported += batch.len() as u64;
        }

        tracing::info!(
            imported,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Imported events via bulk copy"
        );

        Ok(imported)
    }
}

// COPY text format: tab-separated columns, newline-terminated rows.
fn push_copy_row(buffer: &mut String, event: &SerializedEvent) {
    push_copy_text(buffer, &event.batch_id.to_string());
    buffer.push('\t');
    push_copy_text(buffer, &event.aggregate_id);
    buffer.push('\t');
    push_copy_text(buffer, &event.aggregate_name);
    buffer.push('\t');
    push_copy_text(buffer, &event.serialized_data);
    buffer.push('\t');
    push_copy_text(buffer, &event.serialized_metadata);
    buffer.push('\t');
    buffer.push_str(&event.aggregate_sequence_number.to_string());
    buffer.push('\n');
}

fn push_copy_text(buffer: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\\' => buffer.push_str("\\\\"),
            '\t' => buffer.push_str("\\t"),
            '\n' => buffer.push_str("\\n"),
            '\r' => buffer.push_str("\\r"),
            _ => buffer.push(ch),
        }
    }
}
