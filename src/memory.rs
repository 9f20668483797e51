//! In-memory stand-in for a database, used by unit tests.
use crate::config::*;
use crate::connect::*;
use crate::error::*;
use crate::extract::Source;
use crate::load::Sink;
use crate::prune::Prune;
use crate::schema::*;
use crate::window::*;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

#[derive(Debug, Default)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, Table>,
    batches: Vec<usize>,
    selects: usize,
    fail_select: bool,
    fail_append_at: Option<usize>,
    fail_purge: bool,
}

/// Shared tables plus counters. Clones share state, and every connection
/// handed out by the connector is a clone.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    state: Arc<Mutex<State>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl Memory {
    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn create(&self, table: &str, columns: &[&str]) {
        self.with(|s| {
            s.tables.insert(
                table.to_string(),
                Table {
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                    rows: Vec::new(),
                },
            )
        });
    }
    pub fn insert(&self, table: &str, rows: &[&[&str]]) {
        self.with(|s| {
            let t = s.tables.get_mut(table).unwrap();
            for row in rows {
                t.rows
                    .push(row.iter().map(|v| Some(v.to_string())).collect());
            }
        });
    }
    pub fn count(&self, table: &str) -> usize {
        self.with(|s| s.tables.get(table).map_or(0, |t| t.rows.len()))
    }
    pub fn column(&self, table: &str, column: &str) -> Vec<String> {
        self.with(|s| {
            let t = &s.tables[table];
            let i = t.columns.iter().position(|c| c == column).unwrap();
            t.rows.iter().filter_map(|r| r[i].clone()).collect()
        })
    }
    pub fn batches(&self) -> Vec<usize> {
        self.with(|s| s.batches.clone())
    }
    pub fn selects(&self) -> usize {
        self.with(|s| s.selects)
    }
    pub fn fail_select(&self) {
        self.with(|s| s.fail_select = true);
    }
    pub fn fail_append_at(&self, batch: usize) {
        self.with(|s| s.fail_append_at = Some(batch));
    }
    pub fn fail_purge(&self) {
        self.with(|s| s.fail_purge = true);
    }
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Connector for Memory {
    type Connection = Memory;
    async fn connect(&self, _: &ConnectionProfile) -> Result<Self::Connection> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.clone())
    }
}

#[async_trait::async_trait]
impl Connection for Memory {
    async fn close(self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Source for Memory {
    async fn columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.with(|s| {
            s.tables
                .get(table)
                .map(|t| t.columns.clone())
                .unwrap_or_default()
        }))
    }
    async fn select(&self, schema: &TableSchema, window: &TimeWindow) -> Result<ResultSet> {
        let rows = self.with(|s| {
            s.selects += 1;
            if s.fail_select {
                return Err(ReplicationError::query("connection reset"));
            }
            let t = &s.tables[schema.table()];
            let at = |c: &str| t.columns.iter().position(|x| x == c).unwrap();
            let w = at(schema.window());
            let picks = schema.columns().iter().map(|c| at(c)).collect::<Vec<_>>();
            Ok(t.rows
                .iter()
                .filter(|r| {
                    r[w].as_deref()
                        .and_then(instant)
                        .is_some_and(|v| window.contains(v))
                })
                .map(|r| Record::from(picks.iter().map(|i| r[*i].clone()).collect::<Vec<_>>()))
                .collect::<Vec<_>>())
        })?;
        ResultSet::new(schema.columns().to_vec(), rows)
    }
}

#[async_trait::async_trait]
impl Sink for Memory {
    async fn append(&self, table: &str, columns: &[String], rows: &[Record]) -> Result<u64> {
        self.with(|s| {
            if s.fail_append_at == Some(s.batches.len()) {
                return Err(ReplicationError::query("disk full"));
            }
            let t = s
                .tables
                .get_mut(table)
                .ok_or_else(|| ReplicationError::query(format!("no table {}", table)))?;
            let order = t
                .columns
                .iter()
                .map(|c| columns.iter().position(|x| x == c))
                .collect::<Vec<_>>();
            for row in rows {
                t.rows.push(
                    order
                        .iter()
                        .map(|i| i.and_then(|i| row.cells()[i].clone()))
                        .collect(),
                );
            }
            s.batches.push(rows.len());
            Ok(rows.len() as u64)
        })
    }
}

#[async_trait::async_trait]
impl Prune for Memory {
    async fn purge(&self, table: &str, column: &str, cutoff: NaiveDate) -> Result<u64> {
        self.with(|s| {
            if s.fail_purge {
                return Err(ReplicationError::query("lock timeout"));
            }
            let t = s
                .tables
                .get_mut(table)
                .ok_or_else(|| ReplicationError::query(format!("no table {}", table)))?;
            let i = t.columns.iter().position(|c| c == column).unwrap();
            let before = t.rows.len();
            let horizon = midnight(cutoff);
            t.rows.retain(|r| {
                r[i].as_deref()
                    .and_then(instant)
                    .is_none_or(|v| v >= horizon)
            });
            Ok((before - t.rows.len()) as u64)
        })
    }
}
