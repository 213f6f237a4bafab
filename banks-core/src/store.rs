//! SQLite store holding the converted table.
//!
//! [`replace_table`] drops and recreates the target table and inserts every
//! row inside one transaction, so a reader sees either the old table or the
//! complete new one. Loading the same table twice leaves the same state.

use crate::domain::Table;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// SQL types for [`Table::COLUMNS`], position for position.
const COLUMN_TYPES: [&str; 5] = ["TEXT", "REAL", "REAL", "REAL", "REAL"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("failed to close database: {0}")]
    Close(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// An open store connection. Dropping it closes the connection.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "opened store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: ":memory:".into(),
            reason: e.to_string(),
        })?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, surfacing any error SQLite reports.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn
            .close()
            .map_err(|(_, e)| StoreError::Close(e.to_string()))
    }
}

/// Quote a name as an SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(ident: &str) -> String {
    let columns: Vec<String> = Table::COLUMNS
        .iter()
        .zip(COLUMN_TYPES)
        .map(|(name, ty)| format!("{name} {ty}"))
        .collect();
    format!(
        "DROP TABLE IF EXISTS {ident};\nCREATE TABLE {ident} ({});",
        columns.join(", ")
    )
}

fn insert_sql(ident: &str) -> String {
    let placeholders: Vec<String> = (1..=Table::COLUMNS.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {ident} ({}) VALUES ({})",
        Table::COLUMNS.join(", "),
        placeholders.join(", ")
    )
}

/// Replace table `name` with the contents of `table`. Returns rows inserted.
pub fn replace_table(table: &Table, store: &mut Store, name: &str) -> Result<usize, StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidTableName(name.to_string()));
    }
    let ident = quote_ident(name);

    let tx = store.conn.transaction()?;
    tx.execute_batch(&create_table_sql(&ident))?;
    {
        let mut stmt = tx.prepare(&insert_sql(&ident))?;
        for r in table.rows() {
            stmt.execute(params![
                r.name,
                r.mc_usd_billion,
                r.mc_gbp_billion,
                r.mc_eur_billion,
                r.mc_inr_billion,
            ])?;
        }
    }
    tx.commit()?;

    tracing::info!(table = name, rows = table.len(), "replaced store table");
    Ok(table.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawRow, RawTable};
    use crate::rates::RateTable;
    use crate::transform::transform;

    fn sample() -> Table {
        let rates = RateTable::from_pairs([("GBP", 0.8), ("EUR", 0.9), ("INR", 80.0)]);
        transform(
            RawTable::new(vec![
                RawRow::new("A", Some(100.0)),
                RawRow::new("B", Some(50.0)),
                RawRow::new("C", None),
            ]),
            &rates,
        )
        .unwrap()
    }

    fn dump(store: &Store, name: &str) -> Vec<(String, Option<f64>, Option<f64>)> {
        let sql = format!(
            "SELECT Name, MC_USD_Billion, MC_GBP_Billion FROM {} ORDER BY rowid",
            quote_ident(name)
        );
        let mut stmt = store.connection().prepare(&sql).unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn creates_typed_columns() {
        let mut store = Store::open_in_memory().unwrap();
        replace_table(&sample(), &mut store, "Largest_banks").unwrap();

        let mut stmt = store
            .connection()
            .prepare("SELECT name, type FROM pragma_table_info('Largest_banks') ORDER BY cid")
            .unwrap();
        let cols: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            cols,
            vec![
                ("Name".to_string(), "TEXT".to_string()),
                ("MC_USD_Billion".to_string(), "REAL".to_string()),
                ("MC_GBP_Billion".to_string(), "REAL".to_string()),
                ("MC_EUR_Billion".to_string(), "REAL".to_string()),
                ("MC_INR_Billion".to_string(), "REAL".to_string()),
            ]
        );
    }

    #[test]
    fn stores_rows_in_order_with_nulls() {
        let mut store = Store::open_in_memory().unwrap();
        assert_eq!(replace_table(&sample(), &mut store, "t").unwrap(), 3);
        assert_eq!(
            dump(&store, "t"),
            vec![
                ("A".to_string(), Some(100.0), Some(80.0)),
                ("B".to_string(), Some(50.0), Some(40.0)),
                ("C".to_string(), None, None),
            ]
        );
    }

    #[test]
    fn replace_is_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        replace_table(&sample(), &mut store, "t").unwrap();
        let once = dump(&store, "t");
        replace_table(&sample(), &mut store, "t").unwrap();
        assert_eq!(dump(&store, "t"), once);
    }

    #[test]
    fn replace_discards_previous_contents() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch("CREATE TABLE t (Other TEXT); INSERT INTO t VALUES ('old');")
            .unwrap();
        replace_table(&sample(), &mut store, "t").unwrap();
        assert_eq!(dump(&store, "t").len(), 3);
    }

    #[test]
    fn odd_table_names_are_quoted() {
        let mut store = Store::open_in_memory().unwrap();
        replace_table(&sample(), &mut store, "largest \"banks\"").unwrap();
        assert_eq!(dump(&store, "largest \"banks\"").len(), 3);
    }

    #[test]
    fn empty_table_name_is_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        let err = replace_table(&sample(), &mut store, " ").unwrap_err();
        assert!(matches!(err, StoreError::InvalidTableName(_)));
    }

    #[test]
    fn file_store_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Banks.db");

        let mut store = Store::open(&path).unwrap();
        replace_table(&sample(), &mut store, "Largest_banks").unwrap();
        store.close().unwrap();

        let reopened = Store::open(&path).unwrap();
        assert_eq!(dump(&reopened, "Largest_banks").len(), 3);
    }

    #[test]
    fn open_in_missing_directory_fails() {
        let err = Store::open(Path::new("/no/such/dir/Banks.db")).err().unwrap();
        assert!(matches!(err, StoreError::Open { .. }));
    }
}
