/// Failure taxonomy for the replication pipeline.
///
/// Every variant propagates up to the owning job, which logs it once,
/// reports it to its observer once, and halts. Notification failures are
/// deliberately absent: see [`DeliveryError`].
#[derive(thiserror::Error, Debug)]
pub enum ReplicationError {
    /// Bad or missing connection, channel, or job configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// SQL execution failure, read or write, or an unreachable database.
    #[error("query error: {0}")]
    Query(String),
    /// The source table lacks columns the schema asks for.
    #[error("schema mismatch on {table}: missing columns [{}]", .missing.join(", "))]
    SchemaMismatch { table: String, missing: Vec<String> },
    /// A batch insert failed. Batches before `batch` stay committed.
    #[error("write error on {table} at batch {batch} ({written} rows already written): {message}")]
    Write {
        table: String,
        batch: usize,
        written: u64,
        message: String,
    },
}

impl ReplicationError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }
}

/// Reasons a notification was not delivered. Logged by the notifier,
/// never returned to its caller.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("no notification channel at index {0}")]
    Channel(usize),
    #[error("provider answered with status {0}")]
    Status(u16),
    #[error("transport failure: {0}")]
    Transport(String),
}

pub type Result<T, E = ReplicationError> = std::result::Result<T, E>;
