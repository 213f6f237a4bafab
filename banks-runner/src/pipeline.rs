//! The ETL run: fetch → extract → convert → CSV → store → queries.
//!
//! Each stage boundary is written to the progress sink. The first hard failure
//! ends the run; nothing is retried. The store connection is owned by `run`
//! and released on every path out of it.

use crate::config::{ConfigError, EtlConfig};
use banks_core::query::{run_query, FixedQuery, QueryError, QueryValue, ResultSet};
use banks_core::{
    extract, replace_table, transform, write_csv, DocumentSource, ExportError, ExtractionError,
    FetchError, ProgressSink, RateError, RateTable, StoreError, Store, Table, TransformError,
};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("rate file error: {0}")]
    Rates(#[from] RateError),
    #[error("transformation failed: {0}")]
    Transform(#[from] TransformError),
    #[error("CSV export failed: {0}")]
    Export(#[from] ExportError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("query failed: {0}")]
    Query(#[from] QueryError),
}

/// Stage boundaries reported to the progress log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Extracted,
    Transformed,
    CsvSaved,
    StoreOpened,
    Loaded,
    QueriesComplete,
    StoreClosed,
}

impl Stage {
    pub fn message(self) -> &'static str {
        match self {
            Stage::Start => "Preliminaries complete. Initializing ETL process.",
            Stage::Extracted => "Data extraction complete. Initializing transformation process.",
            Stage::Transformed => "Data transformation complete. Initializing loading process.",
            Stage::CsvSaved => "Data saved to CSV file.",
            Stage::StoreOpened => "SQL connection initiated.",
            Stage::Loaded => "Data loaded to database as a table. Executing queries.",
            Stage::QueriesComplete => "Process complete.",
            Stage::StoreClosed => "Server connection closed.",
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub rows: usize,
    pub null_metrics: usize,
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    /// Mean GBP market cap over rows with a value.
    pub average_gbp: Option<f64>,
    pub top_names: Vec<String>,
}

/// Results of the fixed queries, in run order.
#[derive(Debug, Clone, Default)]
struct QueryReport {
    average_gbp: Option<f64>,
    top_names: Vec<String>,
}

/// One configured ETL run.
pub struct Pipeline<'a> {
    config: EtlConfig,
    source: &'a dyn DocumentSource,
    progress: &'a dyn ProgressSink,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: EtlConfig,
        source: &'a dyn DocumentSource,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            config,
            source,
            progress,
        }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    fn mark(&self, stage: Stage) {
        tracing::info!(?stage, "{}", stage.message());
        self.progress.log(stage.message());
    }

    /// Run every stage, printing query output to `out`.
    pub fn run(&self, out: &mut dyn Write) -> Result<RunSummary, PipelineError> {
        self.config.validate()?;
        self.mark(Stage::Start);

        tracing::info!(source = self.source.name(), locator = %self.config.locator, "fetching page");
        let document = self.source.fetch(&self.config.locator)?;
        let raw = extract(&document)?;
        self.mark(Stage::Extracted);

        let rates = RateTable::from_csv_path(&self.config.rates_path)?;
        let table = transform(raw, &rates)?;
        self.mark(Stage::Transformed);

        write_csv(&table, &self.config.output_csv_path)?;
        self.mark(Stage::CsvSaved);

        let mut store = Store::open(&self.config.db_path)?;
        self.mark(Stage::StoreOpened);

        // `store` is dropped, and the connection released, if this fails.
        let report = self.load_and_query(&table, &mut store, out)?;
        self.mark(Stage::QueriesComplete);

        store.close()?;
        self.mark(Stage::StoreClosed);

        Ok(RunSummary {
            rows: table.len(),
            null_metrics: table.null_count(),
            csv_path: self.config.output_csv_path.clone(),
            db_path: self.config.db_path.clone(),
            table_name: self.config.table_name.clone(),
            average_gbp: report.average_gbp,
            top_names: report.top_names,
        })
    }

    fn load_and_query(
        &self,
        table: &Table,
        store: &mut Store,
        out: &mut dyn Write,
    ) -> Result<QueryReport, PipelineError> {
        replace_table(table, store, &self.config.table_name)?;
        self.mark(Stage::Loaded);

        let mut report = QueryReport::default();
        for query in FixedQuery::ALL {
            let result = run_query(&query.sql(&self.config.table_name), store, out)?;
            match query {
                FixedQuery::SelectAll => {}
                FixedQuery::AverageGbp => report.average_gbp = average_of(&result),
                FixedQuery::TopNames => report.top_names = names_of(&result),
            }
        }
        Ok(report)
    }
}

fn average_of(result: &ResultSet) -> Option<f64> {
    result.scalar().and_then(QueryValue::as_f64)
}

fn names_of(result: &ResultSet) -> Vec<String> {
    result
        .rows
        .iter()
        .filter_map(|row| row.first().and_then(QueryValue::as_str))
        .map(String::from)
        .collect()
}
