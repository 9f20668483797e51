use crate::error::*;
use chrono::Days;
use chrono::NaiveDate;
use std::sync::Arc;

/// Delete interface for retention cleanup.
#[async_trait::async_trait]
pub trait Prune: Send + Sync {
    /// Deletes rows of `table` whose `column` is strictly before `cutoff`.
    /// Returns the number of rows deleted.
    async fn purge(&self, table: &str, column: &str, cutoff: NaiveDate) -> Result<u64>;
}

/// Retention policy for one destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retention {
    pub table: String,
    pub column: String,
    pub days: u64,
}

impl Retention {
    pub fn new(table: impl Into<String>, column: impl Into<String>, days: u64) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            days,
        }
    }

    /// Oldest date that survives: `today - horizon`.
    pub fn cutoff(&self, today: NaiveDate) -> Result<NaiveDate> {
        today.checked_sub_days(Days::new(self.days)).ok_or_else(|| {
            ReplicationError::configuration(format!(
                "retention horizon for {} reaches before the calendar",
                self.table
            ))
        })
    }
}

/// Removes rows older than the retention horizon.
pub async fn prune<P>(target: &P, retention: &Retention, today: NaiveDate) -> Result<u64>
where
    P: Prune + ?Sized,
{
    let cutoff = retention.cutoff(today)?;
    log::debug!(
        "purging {} where {} < {}",
        retention.table,
        retention.column,
        cutoff
    );
    target
        .purge(&retention.table, &retention.column, cutoff)
        .await
}

#[async_trait::async_trait]
impl<P> Prune for Arc<P>
where
    P: Prune + ?Sized,
{
    async fn purge(&self, table: &str, column: &str, cutoff: NaiveDate) -> Result<u64> {
        self.as_ref().purge(table, column, cutoff).await
    }
}
