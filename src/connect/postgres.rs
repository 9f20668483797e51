use super::*;
use crate::schema::*;
use crate::window::*;
use bytes::Bytes;
use chrono::NaiveDate;
use const_format::concatcp;
use futures::SinkExt;
use std::time::Duration;
use tokio_postgres::Client;
use tokio_postgres::error::SqlState;
use tokio_postgres::tls::NoTls;

/// Seconds to wait for a TCP connection before giving up.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens one plain PostgreSQL session per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

/// A live session plus the task driving its socket.
pub struct Session {
    client: Client,
    driver: tokio::task::JoinHandle<()>,
}

#[async_trait::async_trait]
impl Connector for Postgres {
    type Connection = Session;
    async fn connect(&self, profile: &ConnectionProfile) -> Result<Session> {
        let (client, connection) = tokio_postgres::Config::new()
            .host(&profile.host)
            .port(profile.port)
            .user(&profile.user)
            .password(&profile.password)
            .dbname(&profile.database)
            .application_name("replicator")
            .connect_timeout(CONNECT_TIMEOUT)
            .connect(NoTls)
            .await
            .map_err(|e| ReplicationError::query(format!("connecting to {}: {}", profile, e)))?;
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::warn!("database connection closed with error: {}", e);
            }
        });
        client
            .execute("SET client_min_messages TO WARNING", &[])
            .await
            .map_err(|e| ReplicationError::query(format!("session setup on {}: {}", profile, e)))?;
        Ok(Session { client, driver })
    }
}

#[async_trait::async_trait]
impl Connection for Session {
    async fn close(self) {
        let Session { client, driver } = self;
        drop(client);
        if let Err(e) = driver.await {
            log::warn!("database connection task failed: {}", e);
        }
    }
}

#[rustfmt::skip]
#[async_trait::async_trait]
impl Source for Session {
    async fn columns(&self, table: &str) -> Result<Vec<String>> {
        const SQL: &str = concatcp!(
            "SELECT   column_name::text ",
            "FROM     information_schema.columns ",
            "WHERE    table_schema::text = COALESCE($1::text, current_schema()::text) ",
            "AND      table_name::text   = $2::text ",
            "ORDER BY ordinal_position"
        );
        let (namespace, name) = match table.rsplit_once('.') {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, table),
        };
        self.client
            .query(SQL, &[&namespace, &name])
            .await
            .map_err(|e| ReplicationError::query(format!("columns of {}: {}", table, e)))?
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(|e| ReplicationError::query(format!("columns of {}: {}", table, e)))
    }
    async fn select(&self, schema: &TableSchema, window: &TimeWindow) -> Result<ResultSet> {
        let from = window.from();
        let to = window.to();
        let rows = self
            .client
            .query(&Self::windowed(schema), &[&from, &to])
            .await
            .map_err(|e| match e.as_db_error() {
                Some(db) => mismatch(schema.table(), db.code(), db.column(), &e),
                None => ReplicationError::query(format!("select from {}: {}", schema.table(), e)),
            })?;
        let width = schema.columns().len();
        let records = rows
            .iter()
            .map(|row| {
                (0..width)
                    .map(|i| row.try_get::<_, Option<String>>(i))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map(Record::from)
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ReplicationError::query(format!("decoding {}: {}", schema.table(), e)))?;
        ResultSet::new(schema.columns().to_vec(), records)
    }
}

impl Session {
    /// Windowed projection: `$1` is the inclusive start, `$2` the exclusive end.
    fn windowed(schema: &TableSchema) -> String {
        format!(
            "SELECT {} FROM {} WHERE {w} >= $1::timestamp AND {w} < $2::timestamp",
            schema
                .columns()
                .iter()
                .map(|c| format!("{}::text", quote(c)))
                .collect::<Vec<_>>()
                .join(", "),
            quote(schema.table()),
            w = quote(schema.window()),
        )
    }

    /// Retention delete: `$1` is the oldest date that survives.
    fn expiry(table: &str, column: &str) -> String {
        format!("DELETE FROM {} WHERE {} < $1::date", quote(table), quote(column))
    }

    /// `COPY` statement for an append of `columns` into `table`.
    fn copy(table: &str, columns: &[String]) -> String {
        format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv)",
            quote(table),
            columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
        )
    }
}

/// Classifies a server-side select failure. Only an undefined column the
/// server names is a schema mismatch.
fn mismatch(
    table: &str,
    code: &SqlState,
    column: Option<&str>,
    error: &dyn std::fmt::Display,
) -> ReplicationError {
    match column {
        Some(column) if *code == SqlState::UNDEFINED_COLUMN => ReplicationError::SchemaMismatch {
            table: table.to_string(),
            missing: vec![column.to_string()],
        },
        _ => ReplicationError::query(format!("select from {}: {}", table, error)),
    }
}

/// Encodes rows as CSV for `COPY ... (FORMAT csv)`.
/// NULL is an unquoted empty field; every present value is quoted, so an
/// empty string stays distinct from NULL.
pub fn csv(rows: &[Record]) -> Bytes {
    let mut buffer = String::new();
    for row in rows {
        for (i, cell) in row.cells().iter().enumerate() {
            if i > 0 {
                buffer.push(',');
            }
            if let Some(value) = cell {
                buffer.push('"');
                buffer.push_str(&value.replace('"', "\"\""));
                buffer.push('"');
            }
        }
        buffer.push('\n');
    }
    Bytes::from(buffer)
}

#[async_trait::async_trait]
impl Sink for Session {
    async fn append(&self, table: &str, columns: &[String], rows: &[Record]) -> Result<u64> {
        let write = |e: tokio_postgres::Error| {
            ReplicationError::query(format!("copy into {}: {}", table, e))
        };
        let sink = self
            .client
            .copy_in::<_, Bytes>(&Self::copy(table, columns))
            .await
            .map_err(write)?;
        futures::pin_mut!(sink);
        sink.send(csv(rows)).await.map_err(write)?;
        sink.as_mut().finish().await.map_err(write)
    }
}

#[async_trait::async_trait]
impl Prune for Session {
    async fn purge(&self, table: &str, column: &str, cutoff: NaiveDate) -> Result<u64> {
        self.client
            .execute(&Self::expiry(table, column), &[&cutoff])
            .await
            .map_err(|e| ReplicationError::query(format!("purge of {}: {}", table, e)))
    }
}
