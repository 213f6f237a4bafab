//! Read queries against the store and their printed output.
//!
//! Statements run exactly as given. Results come back as a [`ResultSet`] and
//! are rendered through a polars `DataFrame` for display.

use crate::store::{quote_ident, Store, StoreError};
use polars::prelude::*;
use rusqlite::types::ValueRef;
use std::fmt;
use std::io::Write;
use thiserror::Error;

/// Rows returned by the "top names" query.
pub const TOP_NAMES_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write query output: {0}")]
    Output(#[from] std::io::Error),
}

/// One cell of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl QueryValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            QueryValue::Integer(v) => Some(*v as f64),
            QueryValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, QueryValue::Null)
    }
}

impl From<ValueRef<'_>> for QueryValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => QueryValue::Null,
            ValueRef::Integer(v) => QueryValue::Integer(v),
            ValueRef::Real(v) => QueryValue::Real(v),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                QueryValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Null => f.write_str("null"),
            QueryValue::Integer(v) => write!(f, "{v}"),
            QueryValue::Real(v) => write!(f, "{v:?}"),
            QueryValue::Text(s) => f.write_str(s),
        }
    }
}

/// Table-shaped query result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<QueryValue>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&QueryValue>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// First cell of the first row, for single-value queries.
    pub fn scalar(&self) -> Option<&QueryValue> {
        self.rows.first().and_then(|r| r.first())
    }

    /// Convert to a polars `DataFrame`.
    ///
    /// Integer-only columns stay `i64`, mixed numeric columns become `f64`,
    /// anything containing text becomes a string column.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for (idx, name) in self.columns.iter().enumerate() {
            let cells: Vec<&QueryValue> = self.rows.iter().map(|r| &r[idx]).collect();
            let non_null = cells.iter().filter(|v| !v.is_null());
            let all_int = non_null
                .clone()
                .all(|v| matches!(v, QueryValue::Integer(_)));
            let all_numeric = non_null
                .clone()
                .all(|v| matches!(v, QueryValue::Integer(_) | QueryValue::Real(_)));

            let column = if all_int {
                let values: Vec<Option<i64>> = cells
                    .iter()
                    .map(|v| match v {
                        QueryValue::Integer(i) => Some(*i),
                        _ => None,
                    })
                    .collect();
                Column::new(name.as_str().into(), values)
            } else if all_numeric {
                let values: Vec<Option<f64>> = cells.iter().map(|v| v.as_f64()).collect();
                Column::new(name.as_str().into(), values)
            } else {
                let values: Vec<Option<String>> = cells
                    .iter()
                    .map(|v| (!v.is_null()).then(|| v.to_string()))
                    .collect();
                Column::new(name.as_str().into(), values)
            };
            columns.push(column);
        }
        DataFrame::new(columns)
    }

    /// Human-readable rendering; falls back to plain text if the frame cannot be built.
    pub fn render(&self) -> String {
        match self.to_dataframe() {
            Ok(df) => format!("{df}"),
            Err(e) => {
                tracing::debug!(error = %e, "falling back to plain rendering");
                let mut out = self.columns.join(" | ");
                for row in &self.rows {
                    out.push('\n');
                    let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                    out.push_str(&cells.join(" | "));
                }
                out
            }
        }
    }
}

/// Execute a statement and collect every row.
pub fn execute(sql: &str, store: &Store) -> Result<ResultSet, StoreError> {
    let mut stmt = store.connection().prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut out = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(QueryValue::from(row.get_ref(i)?));
        }
        out.push(values);
    }

    Ok(ResultSet { columns, rows: out })
}

/// Execute a statement, print it and its result to `out`, and return the result.
pub fn run_query(sql: &str, store: &Store, out: &mut dyn Write) -> Result<ResultSet, QueryError> {
    tracing::info!(sql, "running query");
    let result = execute(sql, store)?;
    writeln!(out, "{sql}")?;
    writeln!(out, "{}", result.render())?;
    Ok(result)
}

/// The reporting queries run after every load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedQuery {
    /// Entire table in stored order.
    SelectAll,
    /// Mean GBP market cap; NULL rows are ignored by `AVG`.
    AverageGbp,
    /// Names of the first [`TOP_NAMES_LIMIT`] rows in stored order.
    TopNames,
}

impl FixedQuery {
    pub const ALL: [FixedQuery; 3] = [
        FixedQuery::SelectAll,
        FixedQuery::AverageGbp,
        FixedQuery::TopNames,
    ];

    pub fn sql(self, table: &str) -> String {
        let ident = quote_ident(table);
        match self {
            FixedQuery::SelectAll => format!("SELECT * FROM {ident} ORDER BY rowid"),
            FixedQuery::AverageGbp => format!("SELECT AVG(MC_GBP_Billion) FROM {ident}"),
            FixedQuery::TopNames => {
                format!("SELECT Name FROM {ident} ORDER BY rowid LIMIT {TOP_NAMES_LIMIT}")
            }
        }
    }
}
