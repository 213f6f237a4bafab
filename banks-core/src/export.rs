//! CSV export of the converted table.
//!
//! Layout: a leading unnamed row-index column, then [`Table::COLUMNS`]. Nulls
//! are empty fields. The file is written to a temp sibling and renamed into
//! place, so an existing export is replaced whole.

use crate::domain::{Currency, Table};
use crate::numeric::{format_derived, format_usd};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8")]
    Utf8,
}

fn optional(value: Option<f64>, fmt: fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_default()
}

/// Render the table as CSV text.
pub fn table_to_csv(table: &Table) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![""];
    header.extend_from_slice(table.columns());
    wtr.write_record(&header)?;

    for (i, r) in table.rows().iter().enumerate() {
        let mut record = vec![
            i.to_string(),
            r.name.clone(),
            optional(r.mc_usd_billion, format_usd),
        ];
        for currency in Currency::ALL {
            record.push(optional(r.converted(currency), format_derived));
        }
        wtr.write_record(&record)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(data).map_err(|_| ExportError::Utf8)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the table to `path`, replacing any existing file.
pub fn write_csv(table: &Table, path: &Path) -> Result<(), ExportError> {
    let io_err = |e: std::io::Error| ExportError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let body = table_to_csv(table)?;
    let tmp = temp_path(path);
    fs::write(&tmp, body).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_err(e)
    })?;

    tracing::info!(path = %path.display(), rows = table.len(), "wrote CSV export");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawRow, RawTable};
    use crate::rates::RateTable;
    use crate::transform::transform;

    fn table(rows: Vec<RawRow>) -> Table {
        let rates = RateTable::from_pairs([("GBP", 0.8), ("EUR", 0.9), ("INR", 80.0)]);
        transform(RawTable::new(rows), &rates).unwrap()
    }

    #[test]
    fn renders_header_index_and_nulls() {
        let t = table(vec![
            RawRow::new("A", Some(100.0)),
            RawRow::new("B", Some(50.0)),
            RawRow::new("C", None),
        ]);
        let csv = table_to_csv(&t).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                ",Name,MC_USD_Billion,MC_GBP_Billion,MC_EUR_Billion,MC_INR_Billion",
                "0,A,100,80.0,90.0,8000.0",
                "1,B,50,40.0,45.0,4000.0",
                "2,C,,,,",
            ]
        );
    }

    #[test]
    fn quotes_names_with_commas() {
        let t = table(vec![RawRow::new("Bank, Ltd", Some(1.5))]);
        let csv = table_to_csv(&t).unwrap();
        assert!(csv.contains("0,\"Bank, Ltd\",1.5,1.2,1.35,120.0"));
    }

    #[test]
    fn write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale contents that are longer than the export\n".repeat(50)).unwrap();

        let t = table(vec![RawRow::new("A", Some(100.0))]);
        write_csv(&t, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, table_to_csv(&t).unwrap());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let t = table(vec![RawRow::new("A", Some(100.0))]);
        let err = write_csv(&t, Path::new("/no/such/dir/out.csv")).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
