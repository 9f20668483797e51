use crate::error::*;

/// How one dataset is extracted and loaded.
///
/// Table and column names come from trusted configuration, never from
/// runtime input. They are still quoted when rendered into SQL so that
/// mixed-case names (`temperatureApparent`) survive PostgreSQL folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table: String,
    columns: Vec<String>,
    window: String,
}

impl TableSchema {
    pub fn new<I, S>(table: impl Into<String>, columns: I, window: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = table.into();
        let window = window.into();
        let columns = columns.into_iter().map(Into::into).collect::<Vec<String>>();
        if table.trim().is_empty() {
            return Err(ReplicationError::configuration("table name is empty"));
        }
        if columns.is_empty() {
            return Err(ReplicationError::configuration(format!(
                "no columns configured for {}",
                table
            )));
        }
        if let Some(dup) = columns
            .iter()
            .enumerate()
            .find(|(i, c)| columns[..*i].contains(c))
            .map(|(_, c)| c)
        {
            return Err(ReplicationError::configuration(format!(
                "column {} listed twice for {}",
                dup, table
            )));
        }
        Ok(Self {
            table,
            columns,
            window,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn window(&self) -> &str {
        &self.window
    }

    /// Comma-separated quoted projection, in configured order.
    pub fn projection(&self) -> String {
        self.columns
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Double-quotes an identifier, segment by segment for dotted names.
pub fn quote(ident: &str) -> String {
    ident
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// One extracted row: cells in schema column order, each the database's
/// text rendering of the value, `None` for SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record(Vec<Option<String>>);

impl Record {
    pub fn cells(&self) -> &[Option<String>] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Option<String>>> for Record {
    fn from(cells: Vec<Option<String>>) -> Self {
        Self(cells)
    }
}

/// Rows produced by an extract and consumed by a load.
/// No ordering or uniqueness is implied across rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(ReplicationError::query(format!(
                "row has {} cells but {} columns were selected",
                bad.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup by row position and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.0.get(index)?.as_deref()
    }

    pub fn batches(&self, size: usize) -> impl Iterator<Item = &[Record]> {
        self.rows.chunks(size.max(1))
    }
}
