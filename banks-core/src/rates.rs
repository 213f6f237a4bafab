//! Exchange rate table loaded from a `Currency,Rate` CSV file.
//!
//! Rates are multipliers against USD. Every row is kept as read; a value that
//! is not a positive finite number only fails when that currency is actually
//! requested, so an unrelated bad row cannot break the run.

use crate::domain::Currency;
use crate::transform::TransformError;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const CURRENCY_HEADER: &str = "Currency";
const RATE_HEADER: &str = "Rate";

/// Errors while loading the rate file.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("failed to read rate file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("rate file is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("malformed rate file: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum RateEntry {
    Valid(f64),
    Malformed(String),
}

impl RateEntry {
    fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => RateEntry::Valid(v),
            _ => RateEntry::Malformed(raw.trim().to_string()),
        }
    }
}

/// Currency code → USD multiplier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    entries: BTreeMap<String, RateEntry>,
}

impl RateTable {
    /// Build a table from known-good pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut table = Self::default();
        for (code, rate) in pairs {
            table.insert_raw(code, &rate.to_string());
        }
        table
    }

    /// Load rates from a CSV file on disk.
    pub fn from_csv_path(path: &Path) -> Result<Self, RateError> {
        let file = std::fs::File::open(path).map_err(|e| RateError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_reader(file)
    }

    /// Load rates from any CSV source with a `Currency,Rate` header.
    ///
    /// Rows are read leniently: a row missing its rate (or carrying extra
    /// fields) is kept as a malformed entry for its code instead of failing
    /// the load.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RateError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |required: &'static str| {
            headers
                .iter()
                .position(|h| h == required)
                .ok_or(RateError::MissingColumn(required))
        };
        let code_idx = column(CURRENCY_HEADER)?;
        let rate_idx = column(RATE_HEADER)?;

        let mut table = Self::default();
        for record in rdr.records() {
            let record = record?;
            let Some(code) = record.get(code_idx).filter(|c| !c.is_empty()) else {
                tracing::debug!(line = ?record.position().map(|p| p.line()), "skipping rate row without a code");
                continue;
            };
            // Later rows override earlier ones for the same code.
            table.insert_raw(code, record.get(rate_idx).unwrap_or(""));
        }

        tracing::debug!(currencies = table.entries.len(), "loaded exchange rates");
        Ok(table)
    }

    fn insert_raw(&mut self, code: &str, raw: &str) {
        self.entries
            .insert(code.trim().to_ascii_uppercase(), RateEntry::parse(raw));
    }

    /// Rate for a currency, failing if it is absent or not a positive number.
    pub fn rate(&self, currency: Currency) -> Result<f64, TransformError> {
        match self.entries.get(currency.code()) {
            Some(RateEntry::Valid(v)) => Ok(*v),
            Some(RateEntry::Malformed(raw)) => Err(TransformError::InvalidRate {
                currency,
                value: raw.clone(),
            }),
            None => Err(TransformError::RateMissing { currency }),
        }
    }

    /// Codes present in the file, valid or not.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_standard_file() {
        let csv = "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n";
        let rates = RateTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rates.rate(Currency::Eur).unwrap(), 0.93);
        assert_eq!(rates.rate(Currency::Gbp).unwrap(), 0.8);
        assert_eq!(rates.rate(Currency::Inr).unwrap(), 82.95);
    }

    #[test]
    fn missing_header_is_error() {
        let err = RateTable::from_reader("Code,Rate\nEUR,0.93\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RateError::MissingColumn("Currency")));
    }

    #[test]
    fn missing_currency_fails_lookup() {
        let rates = RateTable::from_reader("Currency,Rate\nEUR,0.93\n".as_bytes()).unwrap();
        let err = rates.rate(Currency::Inr).unwrap_err();
        assert!(matches!(
            err,
            TransformError::RateMissing {
                currency: Currency::Inr
            }
        ));
    }

    #[test]
    fn malformed_rate_only_fails_its_own_currency() {
        let csv = "Currency,Rate\nEUR,abc\nGBP,-1\nINR,82.95\nJPY,oops\n";
        let rates = RateTable::from_reader(csv.as_bytes()).unwrap();
        assert!(matches!(
            rates.rate(Currency::Eur),
            Err(TransformError::InvalidRate { .. })
        ));
        assert!(matches!(
            rates.rate(Currency::Gbp),
            Err(TransformError::InvalidRate { .. })
        ));
        assert_eq!(rates.rate(Currency::Inr).unwrap(), 82.95);
        assert_eq!(rates.len(), 4);
    }

    #[test]
    fn last_duplicate_wins() {
        let csv = "Currency,Rate\nGBP,0.7\ngbp,0.8\n";
        let rates = RateTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rates.rate(Currency::Gbp).unwrap(), 0.8);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RateTable::from_csv_path(Path::new("/no/such/rates.csv")).unwrap_err();
        assert!(matches!(err, RateError::Io { .. }));
    }

    #[test]
    fn from_pairs_round_trips_values() {
        let rates = RateTable::from_pairs([("GBP", 0.8), ("EUR", 0.9), ("INR", 80.0)]);
        assert_eq!(rates.rate(Currency::Inr).unwrap(), 80.0);
        assert_eq!(rates.codes().collect::<Vec<_>>(), vec!["EUR", "GBP", "INR"]);
    }

    #[test]
    fn short_row_for_unrelated_code_is_tolerated() {
        let csv = "Currency,Rate\nGBP,0.8\nEUR,0.9\nINR,80\nJPY\nCHF,1,extra\n";
        let rates = RateTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rates.rate(Currency::Gbp).unwrap(), 0.8);
        assert_eq!(rates.rate(Currency::Inr).unwrap(), 80.0);
        assert_eq!(rates.len(), 5);
    }

    #[test]
    fn short_row_for_needed_code_fails_its_lookup() {
        let csv = "Currency,Rate\nGBP\nEUR,0.9\nINR,80\n";
        let rates = RateTable::from_reader(csv.as_bytes()).unwrap();
        assert!(matches!(
            rates.rate(Currency::Gbp),
            Err(TransformError::InvalidRate {
                currency: Currency::Gbp,
                ..
            })
        ));
        assert_eq!(rates.rate(Currency::Eur).unwrap(), 0.9);
    }

    #[test]
    fn header_order_does_not_matter() {
        let rates = RateTable::from_reader("Rate,Currency\n0.8,GBP\n".as_bytes()).unwrap();
        assert_eq!(rates.rate(Currency::Gbp).unwrap(), 0.8);
    }
}
