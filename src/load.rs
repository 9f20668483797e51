use crate::error::*;
use crate::schema::*;
use std::sync::Arc;

/// Rows per append statement.
pub const BATCH_SIZE: usize = 5000;

/// Write interface between result sets and a destination database.
/// Append-only: nothing is created, altered, updated or deduplicated.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Appends one batch and returns the number of rows written.
    async fn append(&self, table: &str, columns: &[String], rows: &[Record]) -> Result<u64>;
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loaded {
    pub rows: u64,
    pub batches: usize,
}

/// Appends `rows` into `table` in batches of `batch` rows.
///
/// Batches are independent statements. When one fails, the batches before
/// it stay written and the error reports how many rows that was; callers
/// needing exactly-once delivery must deduplicate downstream.
pub async fn load<S>(sink: &S, table: &str, rows: &ResultSet, batch: usize) -> Result<Loaded>
where
    S: Sink + ?Sized,
{
    let mut loaded = Loaded::default();
    for (i, chunk) in rows.batches(batch).enumerate() {
        let written = sink
            .append(table, rows.columns(), chunk)
            .await
            .map_err(|e| ReplicationError::Write {
                table: table.to_string(),
                batch: i,
                written: loaded.rows,
                message: e.to_string(),
            })?;
        loaded.rows += written;
        loaded.batches += 1;
        log::debug!("appended batch {} to {} ({} rows)", i, table, written);
    }
    Ok(loaded)
}

#[async_trait::async_trait]
impl<S> Sink for Arc<S>
where
    S: Sink + ?Sized,
{
    async fn append(&self, table: &str, columns: &[String], rows: &[Record]) -> Result<u64> {
        self.as_ref().append(table, columns, rows).await
    }
}
