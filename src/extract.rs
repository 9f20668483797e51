use crate::error::*;
use crate::schema::*;
use crate::window::*;
use std::sync::Arc;

/// Read interface between table schemas and a source database.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    /// Column names of `table` in ordinal order. Empty when the table does
    /// not exist.
    async fn columns(&self, table: &str) -> Result<Vec<String>>;
    /// Projected rows whose window column falls in `[from, to)`.
    async fn select(&self, schema: &TableSchema, window: &TimeWindow) -> Result<ResultSet>;
}

/// Runs a column-projected, time-windowed read of `schema.table()`.
///
/// Every configured column must exist on the source table; all missing
/// ones are reported together.
pub async fn extract<S>(source: &S, schema: &TableSchema, window: &TimeWindow) -> Result<ResultSet>
where
    S: Source + ?Sized,
{
    let available = source.columns(schema.table()).await?;
    if available.is_empty() {
        return Err(ReplicationError::query(format!(
            "table {} does not exist or has no visible columns",
            schema.table()
        )));
    }
    let mut missing = schema
        .columns()
        .iter()
        .filter(|c| !available.contains(c))
        .cloned()
        .collect::<Vec<String>>();
    let window_column = schema.window().to_string();
    if !available.contains(&window_column) && !missing.contains(&window_column) {
        missing.push(window_column);
    }
    if !missing.is_empty() {
        return Err(ReplicationError::SchemaMismatch {
            table: schema.table().to_string(),
            missing,
        });
    }
    log::debug!("selecting {} over {}", schema.table(), window);
    source.select(schema, window).await
}

#[async_trait::async_trait]
impl<S> Source for Arc<S>
where
    S: Source + ?Sized,
{
    async fn columns(&self, table: &str) -> Result<Vec<String>> {
        self.as_ref().columns(table).await
    }
    async fn select(&self, schema: &TableSchema, window: &TimeWindow) -> Result<ResultSet> {
        self.as_ref().select(schema, window).await
    }
}
