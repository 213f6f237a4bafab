//! Banks ETL core: the stages of the largest-banks job.
//!
//! This crate contains every stage of the largest-banks pipeline:
//! - Document sources (HTTP and local file)
//! - HTML table extraction with explicit numeric coercion
//! - Exchange rate loading and currency conversion with fixed rounding
//! - CSV export and SQLite table replacement
//! - Fixed reporting queries
//! - Append-only progress log
//!
//! Orchestration lives in `banks-runner`.

pub mod domain;
pub mod export;
pub mod extract;
pub mod numeric;
pub mod progress;
pub mod query;
pub mod rates;
pub mod source;
pub mod store;
pub mod transform;

pub use domain::{BankRecord, Currency, RawRow, RawTable, Table};
pub use export::{table_to_csv, write_csv, ExportError};
pub use extract::{extract, ExtractionError};
pub use progress::{FileProgressLog, MemoryProgressLog, ProgressSink};
pub use query::{execute, run_query, FixedQuery, QueryError, QueryValue, ResultSet};
pub use rates::{RateError, RateTable};
pub use source::{source_for, DocumentSource, FetchError, FileSource, HttpSource};
pub use store::{replace_table, Store, StoreError};
pub use transform::{transform, TransformError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline values can move to a worker thread later.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<RawTable>();
        require_sync::<RawTable>();
        require_send::<Table>();
        require_sync::<Table>();
        require_send::<RateTable>();
        require_sync::<RateTable>();
        require_send::<ResultSet>();
        require_sync::<ResultSet>();
        require_send::<MemoryProgressLog>();
        require_sync::<MemoryProgressLog>();
        require_send::<FileProgressLog>();
        require_sync::<FileProgressLog>();
    }
}
